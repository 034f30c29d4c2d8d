//! Request bodies and the extractor that validates them before a handler runs.

use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::{AppError, FieldError};
use crate::models::{
    Address, Budget, ClientChanges, MaterialChanges, MaterialUnit, NewClient, NewContact,
    NewMaterial, NewProject, ProjectChanges, ProjectModule, ProjectStatus, Timeline,
};

/// `Json<T>` that also runs `T::validate()`. Malformed JSON and rule
/// violations both become a 400 with field-level details.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                AppError::Validation(vec![FieldError::new("body", rejection.body_text())])
            })?;
        value
            .validate()
            .map_err(|errors| AppError::Validation(field_errors(&errors)))?;
        Ok(ValidatedJson(value))
    }
}

/// A `{id}` path segment parsed as a UUID. A malformed id is a JSON 400
/// rather than axum's plain-text rejection.
pub struct PathId(pub Uuid);

impl<S> FromRequestParts<S> for PathId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::debug!("rejected path id: {}", rejection.body_text());
                AppError::BadRequest("Invalid id".to_string())
            })?;
        Ok(PathId(id))
    }
}

/// Flatten nested validator output into `field`, `parent.field` and
/// `list[i].field` paths, sorted by path.
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out = Vec::new();
    collect(errors, "", &mut out);
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<FieldError>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|e| FieldError::new(&path, describe(e))));
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

fn describe(error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("Failed '{}' check", error.code),
    }
}

fn dedup_modules(mut modules: Vec<ProjectModule>) -> Vec<ProjectModule> {
    let mut seen = Vec::with_capacity(modules.len());
    modules.retain(|m| {
        if seen.contains(m) {
            false
        } else {
            seen.push(*m);
            true
        }
    });
    modules
}

/// Whitespace-only text counts as missing.
fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

// Projects

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[serde(default)]
    #[validate(
        custom(function = "non_blank", message = "Name is required"),
        length(max = 255, message = "Name is too long")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank", message = "Project number is required"),
        length(max = 100, message = "Project number is too long")
    )]
    pub project_number: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub client_id: Option<Uuid>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub modules: Vec<ProjectModule>,
    #[serde(default)]
    pub timeline: Timeline,
    #[serde(default)]
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: Option<i32>,
    #[serde(default)]
    pub budget: Option<Budget>,
}

impl CreateProjectRequest {
    pub fn into_new(self, client_id: Uuid) -> NewProject {
        NewProject {
            name: self.name.trim().to_string(),
            project_number: self.project_number.trim().to_string(),
            status: self.status,
            client_id,
            description: self.description,
            modules: dedup_modules(self.modules),
            timeline: self.timeline,
            progress: self.progress.unwrap_or(0),
            budget: self.budget,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(
        custom(function = "non_blank", message = "Name must not be empty"),
        length(max = 255, message = "Name is too long")
    )]
    pub name: Option<String>,
    #[validate(
        custom(function = "non_blank", message = "Project number must not be empty"),
        length(max = 100, message = "Project number is too long")
    )]
    pub project_number: Option<String>,
    pub status: Option<ProjectStatus>,
    pub client_id: Option<Uuid>,
    pub description: Option<String>,
    pub modules: Option<Vec<ProjectModule>>,
    pub timeline: Option<Timeline>,
    #[validate(range(min = 0, max = 100, message = "Progress must be between 0 and 100"))]
    pub progress: Option<i32>,
    pub budget: Option<Budget>,
}

impl UpdateProjectRequest {
    pub fn into_changes(self) -> ProjectChanges {
        ProjectChanges {
            name: self.name.map(|n| n.trim().to_string()),
            project_number: self.project_number.map(|n| n.trim().to_string()),
            status: self.status,
            client_id: self.client_id,
            description: self.description,
            modules: self.modules.map(dedup_modules),
            timeline: self.timeline,
            progress: self.progress,
            budget: self.budget,
        }
    }
}

// Clients

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ContactRequest {
    #[serde(default)]
    #[validate(
        custom(function = "non_blank", message = "Contact name is required"),
        length(max = 255, message = "Contact name is too long")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(
        email(message = "Invalid email address"),
        length(max = 255, message = "Email is too long")
    )]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 20, message = "Phone must be at most 20 characters"))]
    pub phone: Option<String>,
    #[serde(default)]
    #[validate(length(max = 100, message = "Position must be at most 100 characters"))]
    pub position: Option<String>,
}

impl From<ContactRequest> for NewContact {
    fn from(req: ContactRequest) -> Self {
        NewContact {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_string(),
            phone: req.phone,
            position: req.position,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateClientRequest {
    #[serde(default)]
    #[validate(
        custom(function = "non_blank", message = "Name is required"),
        length(max = 255, message = "Name is too long")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 20, message = "Tax id must be at most 20 characters"))]
    pub tax_id: Option<String>,
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default, alias = "contacts")]
    #[validate(nested)]
    pub contact_persons: Vec<ContactRequest>,
}

impl CreateClientRequest {
    pub fn into_new(self) -> NewClient {
        NewClient {
            name: self.name.trim().to_string(),
            tax_id: self.tax_id,
            address: self.address,
            contacts: self.contact_persons.into_iter().map(NewContact::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateClientRequest {
    #[validate(
        custom(function = "non_blank", message = "Name must not be empty"),
        length(max = 255, message = "Name is too long")
    )]
    pub name: Option<String>,
    #[validate(length(max = 20, message = "Tax id must be at most 20 characters"))]
    pub tax_id: Option<String>,
    pub address: Option<Address>,
    #[serde(alias = "contacts")]
    #[validate(nested)]
    pub contact_persons: Option<Vec<ContactRequest>>,
}

impl UpdateClientRequest {
    pub fn into_changes(self) -> ClientChanges {
        ClientChanges {
            name: self.name.map(|n| n.trim().to_string()),
            tax_id: self.tax_id,
            address: self.address,
            contacts: self
                .contact_persons
                .map(|list| list.into_iter().map(NewContact::from).collect()),
        }
    }
}

// Materials

fn specification_or_empty(value: serde_json::Value) -> serde_json::Value {
    if value.is_null() {
        serde_json::json!({})
    } else {
        value
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CreateMaterialRequest {
    #[serde(default)]
    #[validate(
        custom(function = "non_blank", message = "Name is required"),
        length(max = 255, message = "Name is too long")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(
        custom(function = "non_blank", message = "SKU is required"),
        length(max = 100, message = "SKU is too long")
    )]
    pub sku: String,
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub specification: serde_json::Value,
    #[serde(default)]
    #[validate(required(message = "Unit is required"))]
    pub unit: Option<MaterialUnit>,
    #[serde(default, alias = "default_price")]
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Stock must not be negative"))]
    pub stock: f64,
    #[serde(default)]
    #[validate(range(min = 0.0, message = "Minimum stock must not be negative"))]
    pub min_stock: f64,
    #[serde(default)]
    #[validate(length(max = 255, message = "Supplier is too long"))]
    pub supplier: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl CreateMaterialRequest {
    /// `None` only when `unit` is missing, which validation already rejects.
    pub fn into_new(self) -> Option<NewMaterial> {
        Some(NewMaterial {
            name: self.name.trim().to_string(),
            sku: self.sku.trim().to_string(),
            category: self.category,
            specification: specification_or_empty(self.specification),
            unit: self.unit?,
            price: self.price,
            stock: self.stock,
            min_stock: self.min_stock,
            supplier: self.supplier,
            description: self.description,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateMaterialRequest {
    #[validate(
        custom(function = "non_blank", message = "Name must not be empty"),
        length(max = 255, message = "Name is too long")
    )]
    pub name: Option<String>,
    #[validate(
        custom(function = "non_blank", message = "SKU must not be empty"),
        length(max = 100, message = "SKU is too long")
    )]
    pub sku: Option<String>,
    pub category: Option<Vec<String>>,
    pub specification: Option<serde_json::Value>,
    pub unit: Option<MaterialUnit>,
    #[serde(alias = "default_price")]
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: Option<f64>,
    #[validate(range(min = 0.0, message = "Stock must not be negative"))]
    pub stock: Option<f64>,
    #[validate(range(min = 0.0, message = "Minimum stock must not be negative"))]
    pub min_stock: Option<f64>,
    #[validate(length(max = 255, message = "Supplier is too long"))]
    pub supplier: Option<String>,
    pub description: Option<String>,
}

impl UpdateMaterialRequest {
    pub fn into_changes(self) -> MaterialChanges {
        MaterialChanges {
            name: self.name.map(|n| n.trim().to_string()),
            sku: self.sku.map(|s| s.trim().to_string()),
            category: self.category,
            specification: self.specification.map(specification_or_empty),
            unit: self.unit,
            price: self.price,
            stock: self.stock,
            min_stock: self.min_stock,
            supplier: self.supplier,
            description: self.description,
        }
    }
}
