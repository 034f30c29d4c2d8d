use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{
    Store, StoreError, MATERIAL_SKU_CONSTRAINT, PROJECT_CLIENT_CONSTRAINT,
    PROJECT_NUMBER_CONSTRAINT,
};
use crate::models::{
    Client, ClientChanges, ClientWithContacts, ContactPerson, Material, MaterialChanges,
    NewClient, NewContact, NewMaterial, NewProject, Project, ProjectChanges, ProjectStatus,
};
use crate::query::{compare_projects, ClientFilter, MaterialFilter, Predicate, ProjectQuery};

/// In-process [`Store`] with the same constraint behaviour as the Postgres
/// schema. Each instance is independent; construct one per test.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    clients: Vec<Client>,
    contacts: Vec<ContactPerson>,
    projects: Vec<Project>,
    materials: Vec<Material>,
    fail_next: Option<String>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Wall-clock time, nudged forward so stamps are strictly increasing.
    fn stamp(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_stamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_stamp = Some(now);
        now
    }

    fn client(&self, id: Uuid) -> Option<&Client> {
        self.clients.iter().find(|c| c.id == id)
    }

    fn ensure_client_exists(&self, id: Uuid) -> Result<(), StoreError> {
        if self.client(id).is_some() {
            Ok(())
        } else {
            Err(StoreError::ForeignKey {
                constraint: PROJECT_CLIENT_CONSTRAINT.to_string(),
            })
        }
    }

    fn ensure_project_number_free(&self, number: &str, except: Option<Uuid>) -> Result<(), StoreError> {
        let taken = self
            .projects
            .iter()
            .any(|p| p.project_number == number && Some(p.id) != except);
        if taken {
            Err(StoreError::Conflict {
                constraint: PROJECT_NUMBER_CONSTRAINT.to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn ensure_sku_free(&self, sku: &str, except: Option<Uuid>) -> Result<(), StoreError> {
        let taken = self
            .materials
            .iter()
            .any(|m| m.sku == sku && Some(m.id) != except);
        if taken {
            Err(StoreError::Conflict {
                constraint: MATERIAL_SKU_CONSTRAINT.to_string(),
            })
        } else {
            Ok(())
        }
    }

    fn matching_projects(&self, predicates: &[Predicate]) -> Vec<&Project> {
        self.projects
            .iter()
            .filter(|project| {
                let client = self.client(project.client_id);
                predicates.iter().all(|p| p.matches(project, client))
            })
            .collect()
    }

    fn add_contacts(&mut self, client_id: Uuid, contacts: &[NewContact]) {
        for contact in contacts {
            let now = self.stamp();
            self.contacts.push(ContactPerson {
                id: Uuid::now_v7(),
                client_id,
                name: contact.name.clone(),
                email: contact.email.clone(),
                phone: contact.phone.clone(),
                position: contact.position.clone(),
                created_at: now,
                updated_at: now,
            });
        }
    }

    fn contacts_of(&self, client_ids: &[Uuid]) -> Vec<ContactPerson> {
        let mut contacts: Vec<ContactPerson> = self
            .contacts
            .iter()
            .filter(|c| client_ids.contains(&c.client_id))
            .cloned()
            .collect();
        contacts.sort_by(|a, b| {
            a.client_id
                .cmp(&b.client_id)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        contacts
    }
}

fn window<T>(rows: Vec<T>, offset: i64, limit: i64) -> Vec<T> {
    let offset = usize::try_from(offset).unwrap_or(0);
    let limit = usize::try_from(limit).unwrap_or(0);
    rows.into_iter().skip(offset).take(limit).collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every row and any pending failure.
    pub fn reset(&self) {
        if let Ok(mut tables) = self.tables.lock() {
            *tables = Tables::default();
        }
    }

    /// Make the next store call fail with `StoreError::Unavailable`.
    pub fn fail_next(&self, message: impl Into<String>) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.fail_next = Some(message.into());
        }
    }

    /// Overwrite a project's creation time. Returns false for an unknown id.
    pub fn backdate_project(&self, id: Uuid, created_at: DateTime<Utc>) -> bool {
        let Ok(mut tables) = self.tables.lock() else {
            return false;
        };
        match tables.projects.iter_mut().find(|p| p.id == id) {
            Some(project) => {
                project.created_at = created_at;
                true
            }
            None => false,
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        let mut tables = self
            .tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))?;
        if let Some(message) = tables.fail_next.take() {
            return Err(StoreError::Unavailable(message));
        }
        Ok(tables)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_projects(&self, query: &ProjectQuery) -> Result<Vec<Project>, StoreError> {
        let tables = self.tables()?;
        let mut rows: Vec<Project> = tables
            .matching_projects(&query.predicates)
            .into_iter()
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare_projects(a, b, query.sort_by, query.sort_order));
        Ok(window(rows, query.offset, query.limit))
    }

    async fn count_projects(&self, predicates: &[Predicate]) -> Result<u64, StoreError> {
        let tables = self.tables()?;
        Ok(tables.matching_projects(predicates).len() as u64)
    }

    async fn project_status_counts(&self) -> Result<Vec<(ProjectStatus, u64)>, StoreError> {
        let tables = self.tables()?;
        Ok(ProjectStatus::ALL
            .into_iter()
            .map(|status| {
                let n = tables.projects.iter().filter(|p| p.status == status).count();
                (status, n as u64)
            })
            .filter(|(_, n)| *n > 0)
            .collect())
    }

    async fn find_project(&self, id: Uuid) -> Result<Option<Project>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_project(&self, project: &NewProject) -> Result<Project, StoreError> {
        let mut tables = self.tables()?;
        tables.ensure_project_number_free(&project.project_number, None)?;
        tables.ensure_client_exists(project.client_id)?;

        let now = tables.stamp();
        let row = Project {
            id: Uuid::now_v7(),
            name: project.name.clone(),
            project_number: project.project_number.clone(),
            status: project.status,
            client_id: project.client_id,
            description: project.description.clone(),
            modules: project.modules.clone(),
            timeline: project.timeline.clone(),
            progress: project.progress,
            budget: project.budget,
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(row.clone());
        Ok(row)
    }

    async fn update_project(
        &self,
        id: Uuid,
        changes: &ProjectChanges,
    ) -> Result<Option<Project>, StoreError> {
        let mut tables = self.tables()?;
        let Some(index) = tables.projects.iter().position(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(number) = &changes.project_number {
            tables.ensure_project_number_free(number, Some(id))?;
        }
        if let Some(client_id) = changes.client_id {
            tables.ensure_client_exists(client_id)?;
        }

        let now = tables.stamp();
        let project = &mut tables.projects[index];
        changes.apply(project);
        project.updated_at = now;
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        Ok(tables.projects.len() < before)
    }

    async fn default_client(&self) -> Result<Option<Client>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .clients
            .iter()
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn clients_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Client>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .clients
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn contacts_for_clients(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<ContactPerson>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.contacts_of(ids))
    }

    async fn list_clients(&self, filter: &ClientFilter) -> Result<Vec<Client>, StoreError> {
        let tables = self.tables()?;
        let mut rows: Vec<Client> = tables
            .clients
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| filter.compare(a, b));
        Ok(window(rows, filter.offset(), i64::from(filter.limit)))
    }

    async fn count_clients(&self, filter: &ClientFilter) -> Result<u64, StoreError> {
        let tables = self.tables()?;
        Ok(tables.clients.iter().filter(|c| filter.matches(c)).count() as u64)
    }

    async fn insert_client(&self, client: &NewClient) -> Result<ClientWithContacts, StoreError> {
        let mut tables = self.tables()?;
        let now = tables.stamp();
        let row = Client {
            id: Uuid::now_v7(),
            name: client.name.clone(),
            tax_id: client.tax_id.clone(),
            address: client.address.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.clients.push(row.clone());
        tables.add_contacts(row.id, &client.contacts);
        let contact_persons = tables.contacts_of(&[row.id]);
        Ok(ClientWithContacts {
            client: row,
            contact_persons,
        })
    }

    async fn update_client(
        &self,
        id: Uuid,
        changes: &ClientChanges,
    ) -> Result<Option<ClientWithContacts>, StoreError> {
        let mut tables = self.tables()?;
        let Some(index) = tables.clients.iter().position(|c| c.id == id) else {
            return Ok(None);
        };

        let now = tables.stamp();
        let client = &mut tables.clients[index];
        if let Some(name) = &changes.name {
            client.name = name.clone();
        }
        if let Some(tax_id) = &changes.tax_id {
            client.tax_id = Some(tax_id.clone());
        }
        if let Some(address) = &changes.address {
            client.address = Some(address.clone());
        }
        client.updated_at = now;
        let client = client.clone();

        if let Some(contacts) = &changes.contacts {
            tables.contacts.retain(|c| c.client_id != id);
            tables.add_contacts(id, contacts);
        }

        let contact_persons = tables.contacts_of(&[id]);
        Ok(Some(ClientWithContacts {
            client,
            contact_persons,
        }))
    }

    async fn delete_client(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        if tables.projects.iter().any(|p| p.client_id == id) {
            return Err(StoreError::ForeignKey {
                constraint: PROJECT_CLIENT_CONSTRAINT.to_string(),
            });
        }
        let before = tables.clients.len();
        tables.clients.retain(|c| c.id != id);
        if tables.clients.len() == before {
            return Ok(false);
        }
        tables.contacts.retain(|c| c.client_id != id);
        Ok(true)
    }

    async fn list_materials(&self, filter: &MaterialFilter) -> Result<Vec<Material>, StoreError> {
        let tables = self.tables()?;
        let mut rows: Vec<Material> = tables
            .materials
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        rows.sort_by(|a, b| filter.compare(a, b));
        Ok(window(rows, filter.offset(), i64::from(filter.limit)))
    }

    async fn count_materials(&self, filter: &MaterialFilter) -> Result<u64, StoreError> {
        let tables = self.tables()?;
        Ok(tables.materials.iter().filter(|m| filter.matches(m)).count() as u64)
    }

    async fn find_material(&self, id: Uuid) -> Result<Option<Material>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.materials.iter().find(|m| m.id == id).cloned())
    }

    async fn insert_material(&self, material: &NewMaterial) -> Result<Material, StoreError> {
        let mut tables = self.tables()?;
        tables.ensure_sku_free(&material.sku, None)?;

        let now = tables.stamp();
        let row = Material {
            id: Uuid::now_v7(),
            name: material.name.clone(),
            sku: material.sku.clone(),
            category: material.category.clone(),
            specification: material.specification.clone(),
            unit: material.unit,
            price: material.price,
            stock: material.stock,
            min_stock: material.min_stock,
            supplier: material.supplier.clone(),
            description: material.description.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.materials.push(row.clone());
        Ok(row)
    }

    async fn update_material(
        &self,
        id: Uuid,
        changes: &MaterialChanges,
    ) -> Result<Option<Material>, StoreError> {
        let mut tables = self.tables()?;
        let Some(index) = tables.materials.iter().position(|m| m.id == id) else {
            return Ok(None);
        };
        if let Some(sku) = &changes.sku {
            tables.ensure_sku_free(sku, Some(id))?;
        }

        let now = tables.stamp();
        let material = &mut tables.materials[index];
        changes.apply(material);
        material.updated_at = now;
        Ok(Some(material.clone()))
    }

    async fn delete_material(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.materials.len();
        tables.materials.retain(|m| m.id != id);
        Ok(tables.materials.len() < before)
    }
}
