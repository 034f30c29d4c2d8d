//! Project listing: filtered page, matching total, and per-row enrichment
//! with the owning client's primary contact and address.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{
    Budget, Client, ClientContact, ContactPerson, Location, Pagination, Project, ProjectPage,
    ProjectStats, ProjectStatus, ProjectSummary,
};
use crate::query::ProjectFilter;
use crate::store::{Store, StoreError};

/// Run the page query and the count over the same predicate set, then
/// enrich the page in one batched lookup.
pub async fn list_projects(
    store: &dyn Store,
    filter: &ProjectFilter,
    default_country: &str,
) -> Result<ProjectPage, StoreError> {
    let query = filter.to_query();
    let (projects, total) = tokio::try_join!(
        store.list_projects(&query),
        store.count_projects(&query.predicates),
    )?;

    tracing::debug!(
        rows = projects.len(),
        total,
        page = filter.page,
        "project page loaded"
    );

    let projects = enrich(store, projects, default_country).await?;
    Ok(ProjectPage {
        projects,
        pagination: Pagination::new(filter.page, filter.limit, total),
    })
}

pub async fn enrich(
    store: &dyn Store,
    projects: Vec<Project>,
    default_country: &str,
) -> Result<Vec<ProjectSummary>, StoreError> {
    if projects.is_empty() {
        return Ok(Vec::new());
    }

    let mut client_ids: Vec<Uuid> = projects.iter().map(|p| p.client_id).collect();
    client_ids.sort_unstable();
    client_ids.dedup();

    let (clients, contacts) = tokio::try_join!(
        store.clients_by_ids(&client_ids),
        store.contacts_for_clients(&client_ids),
    )?;

    let clients: HashMap<Uuid, Client> = clients.into_iter().map(|c| (c.id, c)).collect();
    let primary = primary_contacts(contacts);

    Ok(projects
        .into_iter()
        .map(|project| {
            let client = clients.get(&project.client_id);
            let contact = primary.get(&project.client_id);
            summarize(project, client, contact, default_country)
        })
        .collect())
}

/// Earliest contact per client. Input is ordered oldest first within a client.
fn primary_contacts(contacts: Vec<ContactPerson>) -> HashMap<Uuid, ContactPerson> {
    let mut primary = HashMap::new();
    for contact in contacts {
        primary.entry(contact.client_id).or_insert(contact);
    }
    primary
}

fn summarize(
    mut project: Project,
    client: Option<&Client>,
    contact: Option<&ContactPerson>,
    default_country: &str,
) -> ProjectSummary {
    project.budget.get_or_insert_with(Budget::default);

    let client_contact = ClientContact {
        id: project.client_id,
        name: client.map(|c| c.name.clone()).unwrap_or_default(),
        email: contact.map(|c| c.email.clone()).unwrap_or_default(),
        phone: contact.and_then(|c| c.phone.clone()).unwrap_or_default(),
    };

    let address = client.and_then(|c| c.address.as_ref());
    let text = |value: Option<&String>| value.cloned().unwrap_or_default();
    let country = address
        .and_then(|a| a.country.clone())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| default_country.to_string());
    let location = Location {
        address: text(address.and_then(|a| a.street.as_ref())),
        city: text(address.and_then(|a| a.city.as_ref())),
        postal_code: text(address.and_then(|a| a.zip_code.as_ref())),
        country,
    };

    ProjectSummary {
        project,
        client: client_contact,
        location,
    }
}

/// Per-status counts over every project, zeros included.
pub async fn project_stats(store: &dyn Store) -> Result<ProjectStats, StoreError> {
    let counts = store.project_status_counts().await?;
    let mut stats = ProjectStats::default();
    for status in ProjectStatus::ALL {
        stats.by_status.insert(status, 0);
    }
    for (status, n) in counts {
        stats.by_status.insert(status, n);
        stats.total += n;
    }
    Ok(stats)
}
