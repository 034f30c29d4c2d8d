use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Material, MaterialChanges, NewMaterial};
use crate::query::{sql, MaterialFilter};
use crate::store::StoreError;

#[derive(sqlx::FromRow)]
struct MaterialRow {
    id: Uuid,
    name: String,
    sku: String,
    category: Vec<String>,
    specification: serde_json::Value,
    unit: String,
    price: f64,
    stock: f64,
    min_stock: f64,
    supplier: Option<String>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MaterialRow> for Material {
    type Error = StoreError;

    fn try_from(row: MaterialRow) -> Result<Self, Self::Error> {
        Ok(Material {
            id: row.id,
            name: row.name,
            sku: row.sku,
            category: row.category,
            specification: row.specification,
            unit: row.unit.parse().map_err(StoreError::Corrupt)?,
            price: row.price,
            stock: row.stock,
            min_stock: row.min_stock,
            supplier: row.supplier,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn list(pool: &PgPool, filter: &MaterialFilter) -> Result<Vec<Material>, StoreError> {
    let mut builder = sql::select_materials(filter);
    let rows = builder
        .build_query_as::<MaterialRow>()
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(Material::try_from).collect()
}

pub async fn count(pool: &PgPool, filter: &MaterialFilter) -> Result<i64, sqlx::Error> {
    let mut builder = sql::count_materials(filter);
    builder.build_query_scalar::<i64>().fetch_one(pool).await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Material>, StoreError> {
    let row = sqlx::query_as::<_, MaterialRow>("SELECT * FROM materials WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Material::try_from).transpose()
}

pub async fn create(pool: &PgPool, material: &NewMaterial) -> Result<Material, StoreError> {
    let row = sqlx::query_as::<_, MaterialRow>(
        "INSERT INTO materials
            (name, sku, category, specification, unit, price, stock, min_stock, supplier, description)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *",
    )
    .bind(&material.name)
    .bind(&material.sku)
    .bind(&material.category)
    .bind(&material.specification)
    .bind(material.unit.as_str())
    .bind(material.price)
    .bind(material.stock)
    .bind(material.min_stock)
    .bind(&material.supplier)
    .bind(&material.description)
    .fetch_one(pool)
    .await?;
    Material::try_from(row)
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    changes: &MaterialChanges,
) -> Result<Option<Material>, StoreError> {
    let row = sqlx::query_as::<_, MaterialRow>(
        "UPDATE materials SET
            name = COALESCE($2, name),
            sku = COALESCE($3, sku),
            category = COALESCE($4, category),
            specification = COALESCE($5, specification),
            unit = COALESCE($6, unit),
            price = COALESCE($7, price),
            stock = COALESCE($8, stock),
            min_stock = COALESCE($9, min_stock),
            supplier = COALESCE($10, supplier),
            description = COALESCE($11, description),
            updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.sku)
    .bind(&changes.category)
    .bind(&changes.specification)
    .bind(changes.unit.map(|u| u.as_str()))
    .bind(changes.price)
    .bind(changes.stock)
    .bind(changes.min_stock)
    .bind(&changes.supplier)
    .bind(&changes.description)
    .fetch_optional(pool)
    .await?;
    row.map(Material::try_from).transpose()
}

pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM materials WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
