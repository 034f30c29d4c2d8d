use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::db;
use crate::models::{
    Client, ClientChanges, ClientWithContacts, ContactPerson, Material, MaterialChanges,
    NewClient, NewMaterial, NewProject, Project, ProjectChanges, ProjectStatus,
};
use crate::query::{ClientFilter, MaterialFilter, Predicate, ProjectQuery};

/// [`Store`] backed by a Postgres pool. Constraint names come from
/// `migrations/0001_initial.sql`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}

#[async_trait]
impl Store for PgStore {
    async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>, StoreError> {
        db::projects::list(&self.pool, query).await
    }

    async fn count_projects(&self, predicates: &[Predicate]) -> Result<u64, StoreError> {
        Ok(to_count(db::projects::count(&self.pool, predicates).await?))
    }

    async fn project_status_counts(&self) -> Result<Vec<(ProjectStatus, u64)>, StoreError> {
        db::projects::status_counts(&self.pool).await
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        db::projects::find_by_id(&self.pool, id).await
    }

    async fn insert_project(&self, project: &NewProject) -> Result<Project, StoreError> {
        db::projects::create(&self.pool, project).await
    }

    async fn update_project(
        &self,
        id: Uuid,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, StoreError> {
        db::projects::update(&self.pool, id, changes).await
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(db::projects::delete(&self.pool, id).await?)
    }

    async fn default_client(&self) -> Result<Option<Client>, StoreError> {
        Ok(db::clients::find_default(&self.pool).await?)
    }

    async fn clients_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Client>, StoreError> {
        Ok(db::clients::find_by_ids(&self.pool, ids).await?)
    }

    async fn contacts_for_clients(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<ContactPerson>, StoreError> {
        Ok(db::clients::contacts_for(&self.pool, ids).await?)
    }

    async fn list_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>, StoreError> {
        Ok(db::clients::list(&self.pool, filter).await?)
    }

    async fn count_clients(&self, filter: &ClientFilter) -> Result<u64, StoreError> {
        Ok(to_count(db::clients::count(&self.pool, filter).await?))
    }

    async fn insert_client(&self, client: &NewClient) -> Result<ClientWithContacts, StoreError> {
        Ok(db::clients::create(&self.pool, client).await?)
    }

    async fn update_client(
        &self,
        id: Uuid,
        changes: &ClientChanges,
    ) -> Result<Option<ClientWithContacts>, StoreError> {
        Ok(db::clients::update(&self.pool, id, changes).await?)
    }

    async fn delete_client(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(db::clients::delete(&self.pool, id).await?)
    }

    async fn list_materials(&self, filter: &MaterialFilter) -> Result<Vec<Material>, StoreError> {
        db::materials::list(&self.pool, filter).await
    }

    async fn count_materials(&self, filter: &MaterialFilter) -> Result<u64, StoreError> {
        Ok(to_count(db::materials::count(&self.pool, filter).await?))
    }

    async fn find_material(&self, id: Uuid) -> Result<Option<Material>, StoreError> {
        db::materials::find_by_id(&self.pool, id).await
    }

    async fn insert_material(&self, material: &NewMaterial) -> Result<Material, StoreError> {
        db::materials::create(&self.pool, material).await
    }

    async fn update_material(
        &self,
        id: Uuid,
        changes: &MaterialChanges,
    ) -> Result<Option<Material>, StoreError> {
        db::materials::update(&self.pool, id, changes).await
    }

    async fn delete_material(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(db::materials::delete(&self.pool, id).await?)
    }
}
