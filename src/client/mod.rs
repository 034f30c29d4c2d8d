//! Typed consumer side of the HTTP API: request functions, a keyed query
//! cache with invalidation rules, and the project list filter controller.

pub mod cache;
pub mod debounce;
pub mod filters;

pub use cache::{ProjectQueries, QueryCache, QueryState, QueryStatus};
pub use debounce::Debouncer;
pub use filters::{FilterController, FilterField, ProjectTab};

use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::FieldError;
use crate::models::{
    ClientPage, ClientWithContacts, Material, MaterialPage, Project, ProjectPage, ProjectStats,
    ProjectStatus,
};
use crate::query::{ClientFilter, MaterialFilter, ProjectFilter};
use crate::validation::{
    CreateClientRequest, CreateMaterialRequest, CreateProjectRequest, UpdateClientRequest,
    UpdateMaterialRequest, UpdateProjectRequest,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{status}: {message}")]
    Status {
        status: StatusCode,
        message: String,
        details: Vec<FieldError>,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
        }
    }
}

#[derive(Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    details: Vec<FieldError>,
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn url_with_query(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            self.url(path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        check(request.send().await?).await?;
        Ok(())
    }

    pub async fn health(&self) -> Result<serde_json::Value, ApiError> {
        self.send(self.http.get(self.url("/health"))).await
    }

    // Projects

    pub async fn list_projects(&self, filter: &ProjectFilter) -> Result<ProjectPage, ApiError> {
        let url = self.url_with_query("/api/projects", &filter.to_query_string());
        self.send(self.http.get(url)).await
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Project, ApiError> {
        self.send(self.http.get(self.url(&format!("/api/projects/{id}"))))
            .await
    }

    pub async fn project_stats(&self) -> Result<ProjectStats, ApiError> {
        self.send(self.http.get(self.url("/api/projects/stats"))).await
    }

    pub async fn create_project(&self, req: &CreateProjectRequest) -> Result<Project, ApiError> {
        self.send(self.http.post(self.url("/api/projects")).json(req))
            .await
    }

    pub async fn update_project(
        &self,
        id: Uuid,
        req: &UpdateProjectRequest,
    ) -> Result<Project, ApiError> {
        self.send(
            self.http
                .put(self.url(&format!("/api/projects/{id}")))
                .json(req),
        )
        .await
    }

    pub async fn delete_project(&self, id: Uuid) -> Result<(), ApiError> {
        self.send_empty(self.http.delete(self.url(&format!("/api/projects/{id}"))))
            .await
    }

    pub async fn archive_project(&self, id: Uuid) -> Result<Project, ApiError> {
        self.set_project_status(id, ProjectStatus::Archived).await
    }

    pub async fn unarchive_project(&self, id: Uuid) -> Result<Project, ApiError> {
        self.set_project_status(id, ProjectStatus::Active).await
    }

    async fn set_project_status(&self, id: Uuid, status: ProjectStatus) -> Result<Project, ApiError> {
        let req = UpdateProjectRequest {
            status: Some(status),
            ..UpdateProjectRequest::default()
        };
        self.update_project(id, &req).await
    }

    // Clients

    pub async fn list_clients(&self, filter: &ClientFilter) -> Result<ClientPage, ApiError> {
        let url = self.url_with_query("/api/clients", &filter.to_query_string());
        self.send(self.http.get(url)).await
    }

    pub async fn get_client(&self, id: Uuid) -> Result<ClientWithContacts, ApiError> {
        self.send(self.http.get(self.url(&format!("/api/clients/{id}"))))
            .await
    }

    pub async fn create_client(
        &self,
        req: &CreateClientRequest,
    ) -> Result<ClientWithContacts, ApiError> {
        self.send(self.http.post(self.url("/api/clients")).json(req))
            .await
    }

    pub async fn update_client(
        &self,
        id: Uuid,
        req: &UpdateClientRequest,
    ) -> Result<ClientWithContacts, ApiError> {
        self.send(
            self.http
                .put(self.url(&format!("/api/clients/{id}")))
                .json(req),
        )
        .await
    }

    pub async fn delete_client(&self, id: Uuid) -> Result<(), ApiError> {
        self.send_empty(self.http.delete(self.url(&format!("/api/clients/{id}"))))
            .await
    }

    // Materials

    pub async fn list_materials(&self, filter: &MaterialFilter) -> Result<MaterialPage, ApiError> {
        let url = self.url_with_query("/api/materials", &filter.to_query_string());
        self.send(self.http.get(url)).await
    }

    pub async fn get_material(&self, id: Uuid) -> Result<Material, ApiError> {
        self.send(self.http.get(self.url(&format!("/api/materials/{id}"))))
            .await
    }

    pub async fn create_material(&self, req: &CreateMaterialRequest) -> Result<Material, ApiError> {
        self.send(self.http.post(self.url("/api/materials")).json(req))
            .await
    }

    pub async fn update_material(
        &self,
        id: Uuid,
        req: &UpdateMaterialRequest,
    ) -> Result<Material, ApiError> {
        self.send(
            self.http
                .put(self.url(&format!("/api/materials/{id}")))
                .json(req),
        )
        .await
    }

    pub async fn delete_material(&self, id: Uuid) -> Result<(), ApiError> {
        self.send_empty(self.http.delete(self.url(&format!("/api/materials/{id}"))))
            .await
    }
}

/// Pass 2xx responses through; turn anything else into `ApiError::Status`
/// using the server's `{error, details}` body when present.
async fn check(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body: ErrorBody = response.json().await.unwrap_or_default();
    let message = if body.error.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        body.error
    };
    Err(ApiError::Status {
        status,
        message,
        details: body.details,
    })
}
