use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::AppError;
use crate::models::{ClientPage, ClientWithContacts, Pagination};
use crate::query::ClientFilter;
use crate::state::SharedState;
use crate::store::{self, PROJECT_CLIENT_CONSTRAINT};
use crate::validation::{CreateClientRequest, PathId, UpdateClientRequest, ValidatedJson};

fn not_found() -> AppError {
    AppError::NotFound("Client not found".to_string())
}

pub async fn list(
    State(state): State<SharedState>,
    RawQuery(query): RawQuery,
) -> Result<Json<ClientPage>, AppError> {
    let filter = ClientFilter::from_query(query.as_deref().unwrap_or_default())?;
    let (clients, total) = tokio::try_join!(
        state.store.list_clients(&filter),
        state.store.count_clients(&filter),
    )?;
    Ok(Json(ClientPage {
        clients,
        pagination: Pagination::new(filter.page, filter.limit, total),
    }))
}

pub async fn get(
    State(state): State<SharedState>,
    PathId(id): PathId,
) -> Result<Json<ClientWithContacts>, AppError> {
    let client = store::find_client_with_contacts(state.store.as_ref(), id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(client))
}

pub async fn create(
    State(state): State<SharedState>,
    ValidatedJson(req): ValidatedJson<CreateClientRequest>,
) -> Result<(StatusCode, Json<ClientWithContacts>), AppError> {
    let client = state.store.insert_client(&req.into_new()).await?;
    tracing::info!(
        client_id = %client.client.id,
        contacts = client.contact_persons.len(),
        "client created"
    );
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update(
    State(state): State<SharedState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<UpdateClientRequest>,
) -> Result<Json<ClientWithContacts>, AppError> {
    let client = state
        .store
        .update_client(id, &req.into_changes())
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(client_id = %id, "client updated");
    Ok(Json(client))
}

pub async fn delete(
    State(state): State<SharedState>,
    PathId(id): PathId,
) -> Result<StatusCode, AppError> {
    let deleted = state.store.delete_client(id).await.map_err(|e| {
        if e.is_foreign_key_on(PROJECT_CLIENT_CONSTRAINT) {
            AppError::Conflict("Client still has projects".to_string())
        } else {
            e.into()
        }
    })?;
    if !deleted {
        return Err(not_found());
    }
    tracing::info!(client_id = %id, "client deleted");
    Ok(StatusCode::NO_CONTENT)
}
