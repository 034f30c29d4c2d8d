use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::{AppError, FieldError};
use crate::models::{Material, MaterialPage, Pagination};
use crate::query::MaterialFilter;
use crate::state::SharedState;
use crate::store::{StoreError, MATERIAL_SKU_CONSTRAINT};
use crate::validation::{CreateMaterialRequest, PathId, UpdateMaterialRequest, ValidatedJson};

fn write_error(err: StoreError) -> AppError {
    if err.is_conflict_on(MATERIAL_SKU_CONSTRAINT) {
        AppError::Conflict("SKU already exists".to_string())
    } else {
        err.into()
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Material not found".to_string())
}

pub async fn list(
    State(state): State<SharedState>,
    RawQuery(query): RawQuery,
) -> Result<Json<MaterialPage>, AppError> {
    let filter = MaterialFilter::from_query(query.as_deref().unwrap_or_default())?;
    let (materials, total) = tokio::try_join!(
        state.store.list_materials(&filter),
        state.store.count_materials(&filter),
    )?;
    Ok(Json(MaterialPage {
        materials,
        pagination: Pagination::new(filter.page, filter.limit, total),
    }))
}

pub async fn get(
    State(state): State<SharedState>,
    PathId(id): PathId,
) -> Result<Json<Material>, AppError> {
    let material = state.store.find_material(id).await?.ok_or_else(not_found)?;
    Ok(Json(material))
}

pub async fn create(
    State(state): State<SharedState>,
    ValidatedJson(req): ValidatedJson<CreateMaterialRequest>,
) -> Result<(StatusCode, Json<Material>), AppError> {
    let new = req
        .into_new()
        .ok_or_else(|| AppError::Validation(vec![FieldError::new("unit", "Unit is required")]))?;
    let material = state
        .store
        .insert_material(&new)
        .await
        .map_err(write_error)?;
    tracing::info!(material_id = %material.id, sku = %material.sku, "material created");
    Ok((StatusCode::CREATED, Json(material)))
}

pub async fn update(
    State(state): State<SharedState>,
    PathId(id): PathId,
    ValidatedJson(req): ValidatedJson<UpdateMaterialRequest>,
) -> Result<Json<Material>, AppError> {
    let material = state
        .store
        .update_material(id, &req.into_changes())
        .await
        .map_err(write_error)?
        .ok_or_else(not_found)?;
    tracing::info!(material_id = %id, "material updated");
    Ok(Json(material))
}

pub async fn delete(
    State(state): State<SharedState>,
    PathId(id): PathId,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_material(id).await? {
        return Err(not_found());
    }
    tracing::info!(material_id = %id, "material deleted");
    Ok(StatusCode::NO_CONTENT)
}
