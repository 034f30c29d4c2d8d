use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Budget, NewProject, Project, ProjectChanges, ProjectStatus, Timeline};
use crate::query::{sql, Predicate, ProjectQuery};
use crate::store::StoreError;

#[derive(sqlx::FromRow)]
struct ProjectRow {
    id: Uuid,
    name: String,
    project_number: String,
    status: String,
    client_id: Uuid,
    description: Option<String>,
    modules: Vec<String>,
    timeline: Json<Timeline>,
    progress: i32,
    budget: Option<Json<Budget>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(StoreError::Corrupt)?;
        let modules = row
            .modules
            .iter()
            .map(|m| m.parse())
            .collect::<Result<Vec<_>, String>>()
            .map_err(StoreError::Corrupt)?;

        Ok(Project {
            id: row.id,
            name: row.name,
            project_number: row.project_number,
            status,
            client_id: row.client_id,
            description: row.description,
            modules,
            timeline: row.timeline.0,
            progress: row.progress,
            budget: row.budget.map(|b| b.0),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_projects(rows: Vec<ProjectRow>) -> Result<Vec<Project>, StoreError> {
    rows.into_iter().map(Project::try_from).collect()
}

pub async fn list(pool: &PgPool, query: &ProjectQuery) -> Result<Vec<Project>, StoreError> {
    let mut builder = sql::select_projects(query);
    let rows = builder
        .build_query_as::<ProjectRow>()
        .fetch_all(pool)
        .await?;
    into_projects(rows)
}

pub async fn count(pool: &PgPool, predicates: &[Predicate]) -> Result<i64, sqlx::Error> {
    let mut builder = sql::count_projects(predicates);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn status_counts(pool: &PgPool) -> Result<Vec<(ProjectStatus, u64)>, StoreError> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT status, COUNT(*) FROM projects GROUP BY status",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(status, count)| {
            let status = status.parse().map_err(StoreError::Corrupt)?;
            Ok((status, count.max(0) as u64))
        })
        .collect()
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Project>, StoreError> {
    let row = sqlx::query_as::<_, ProjectRow>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Project::try_from).transpose()
}

fn module_names(project_modules: &[crate::models::ProjectModule]) -> Vec<String> {
    project_modules.iter().map(|m| m.as_str().to_string()).collect()
}

pub async fn create(pool: &PgPool, project: &NewProject) -> Result<Project, StoreError> {
    let row = sqlx::query_as::<_, ProjectRow>(
        "INSERT INTO projects
            (name, project_number, status, client_id, description, modules, timeline, progress, budget)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING *",
    )
    .bind(&project.name)
    .bind(&project.project_number)
    .bind(project.status.as_str())
    .bind(project.client_id)
    .bind(&project.description)
    .bind(module_names(&project.modules))
    .bind(Json(&project.timeline))
    .bind(project.progress)
    .bind(project.budget.map(Json))
    .fetch_one(pool)
    .await?;
    Project::try_from(row)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &ProjectChanges,
) -> Result<Option<Project>, StoreError> {
    let row = sqlx::query_as::<_, ProjectRow>(
        "UPDATE projects SET
            name = COALESCE($2, name),
            project_number = COALESCE($3, project_number),
            status = COALESCE($4, status),
            client_id = COALESCE($5, client_id),
            description = COALESCE($6, description),
            modules = COALESCE($7, modules),
            timeline = COALESCE($8, timeline),
            progress = COALESCE($9, progress),
            budget = COALESCE($10, budget),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.project_number)
    .bind(changes.status.map(|s| s.as_str()))
    .bind(changes.client_id)
    .bind(&changes.description)
    .bind(changes.modules.as_deref().map(module_names))
    .bind(changes.timeline.as_ref().map(Json))
    .bind(changes.progress)
    .bind(changes.budget.map(Json))
    .fetch_optional(pool)
    .await?;
    row.map(Project::try_from).transpose()
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
