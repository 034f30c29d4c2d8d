use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{AppError, FieldError};
use crate::listing;
use crate::models::{Project, ProjectPage, ProjectStats};
use crate::query::ProjectFilter;
use crate::state::SharedState;
use crate::store::{StoreError, PROJECT_CLIENT_CONSTRAINT, PROJECT_NUMBER_CONSTRAINT};
use crate::validation::{CreateProjectRequest, PathId, UpdateProjectRequest, ValidatedJson};

fn write_error(err: StoreError) -> AppError {
    if err.is_conflict_on(PROJECT_NUMBER_CONSTRAINT) {
        AppError::Conflict("Project number already exists".to_string())
    } else if err.is_foreign_key_on(PROJECT_CLIENT_CONSTRAINT) {
        AppError::Validation(vec![FieldError::new("client_id", "Client does not exist")])
    } else {
        err.into()
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Project not found".to_string())
}

pub async fn list(
    State(state): State<SharedState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ProjectPage>, AppError> {
    let filter = ProjectFilter::from_query(query.as_deref().unwrap_or_default())?;
    let page =
        listing::list_projects(state.store.as_ref(), &filter, &state.config.default_country)
            .await?;
    Ok(Json(page))
}

pub async fn stats(State(state): State<SharedState>) -> Result<Json<ProjectStats>, AppError> {
    let stats = listing::project_stats(state.store.as_ref()).await?;
    Ok(Json(stats))
}

pub async fn get(
    State(state): State<SharedState>,
    PathId(id): PathId,
) -> Result<Json<Project>, AppError> {
    let project = state.store.find_project(id).await?.ok_or_else(not_found)?;
    Ok(Json(project))
}

pub async fn create(
    State(state): State<SharedState>,
    ValidatedJson(req): ValidatedJson<CreateProjectRequest>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let client_id = match req.client_id {
        Some(id) => id,
        None => {
            let client = state.store.default_client().await?.ok_or_else(|| {
                AppError::BadRequest("No clients found. Please create a client first.".to_string())
            })?;
            tracing::debug!(client_id = %client.id, "using default client");
            client.id
        }
    };

    let project = state
        .store
        .insert_project(&req.into_new(client_id))
        .await
        .map_err(write_error)?;

    tracing::info!(
        project_id = %project.id,
        project_number = %project.project_number,
        "project created"
    );
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update(
    State(state): State<SharedState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<UpdateProjectRequest>,
) -> Result<Json<Project>, AppError> {
    let project = state
        .store
        .update_project(id, &req.into_changes())
        .await
        .map_err(write_error)?
        .ok_or_else(not_found)?;

    tracing::info!(project_id = %project.id, status = %project.status, "project updated");
    Ok(Json(project))
}

pub async fn delete(
    State(state): State<SharedState>,
    PathId(id): PathId,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_project(id).await? {
        return Err(not_found());
    }
    tracing::info!(project_id = %id, "project deleted");
    Ok(StatusCode::NO_CONTENT)
}
