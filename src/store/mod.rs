//! Persistence seam. Handlers only see [`Store`]; production wires
//! [`PgStore`], tests and `NEXTFAB_STORE=memory` wire [`MemoryStore`].

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    Client, ClientChanges, ClientWithContacts, ContactPerson, Material, MaterialChanges,
    NewClient, NewMaterial, NewProject, Project, ProjectChanges, ProjectStatus,
};
use crate::query::{ClientFilter, MaterialFilter, Predicate, ProjectQuery};

pub const PROJECT_NUMBER_CONSTRAINT: &str = "uq_projects_project_number";
pub const MATERIAL_SKU_CONSTRAINT: &str = "uq_materials_sku";
pub const PROJECT_CLIENT_CONSTRAINT: &str = "fk_projects_client";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint {constraint} violated")]
    Conflict { constraint: String },

    #[error("foreign key constraint {constraint} violated")]
    ForeignKey { constraint: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn is_conflict_on(&self, name: &str) -> bool {
        matches!(self, StoreError::Conflict { constraint } if constraint == name)
    }

    pub fn is_foreign_key_on(&self, name: &str) -> bool {
        matches!(self, StoreError::ForeignKey { constraint } if constraint == name)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                Some("23505") => return StoreError::Conflict { constraint },
                Some("23503") => return StoreError::ForeignKey { constraint },
                _ => {}
            }
        }
        StoreError::Database(err)
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    // Projects

    /// One page of projects matching every predicate, in the requested order.
    async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>, StoreError>;
    /// Number of projects matching every predicate, ignoring the page window.
    async fn count_projects(&self, predicates: &[Predicate]) -> Result<u64, StoreError>;
    async fn project_status_counts(&self) -> Result<Vec<(ProjectStatus, u64)>, StoreError>;
    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError>;
    /// Fails with `Conflict` on a duplicate project number; no pre-check is made.
    async fn insert_project(&self, project: &NewProject) -> Result<Project, StoreError>;
    /// Applies the changes and refreshes `updated_at`. `None` when the id is unknown.
    async fn update_project(
        &self,
        id: Uuid,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, StoreError>;
    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError>;

    // Clients

    /// The earliest-created client, used when a project is created without one.
    async fn default_client(&self) -> Result<Option<Client>, StoreError>;
    async fn clients_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Client>, StoreError>;
    /// Contacts of the given clients, oldest first within each client.
    async fn contacts_for_clients(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<ContactPerson>, StoreError>;
    async fn list_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>, StoreError>;
    async fn count_clients(&self, filter: &ClientFilter) -> Result<u64, StoreError>;
    async fn insert_client(&self, client: &NewClient) -> Result<ClientWithContacts, StoreError>;
    async fn update_client(
        &self,
        id: Uuid,
        changes: &ClientChanges,
    ) -> Result<Option<ClientWithContacts>, StoreError>;
    /// Contacts are removed with the client. Fails with `ForeignKey` while
    /// projects still reference it.
    async fn delete_client(&self, id: Uuid) -> Result<bool, StoreError>;

    // Materials

    async fn list_materials(&self, filter: &MaterialFilter) -> Result<Vec<Material>, StoreError>;
    async fn count_materials(&self, filter: &MaterialFilter) -> Result<u64, StoreError>;
    async fn find_material(&self, id: Uuid) -> Result<Option<Material>, StoreError>;
    async fn insert_material(&self, material: &NewMaterial) -> Result<Material, StoreError>;
    async fn update_material(
        &self,
        id: Uuid,
        changes: &MaterialChanges,
    ) -> Result<Option<Material>, StoreError>;
    async fn delete_material(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Loads one client together with its contacts.
pub async fn find_client_with_contacts(
    store: &dyn Store,
    id: Uuid,
) -> Result<Option<ClientWithContacts>, StoreError> {
    let Some(client) = store.clients_by_ids(&[id]).await?.into_iter().next() else {
        return Ok(None);
    };
    let contact_persons = store.contacts_for_clients(&[id]).await?;
    Ok(Some(ClientWithContacts {
        client,
        contact_persons,
    }))
}
