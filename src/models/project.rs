use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Draft,
    Active,
    Completed,
    Paused,
    Cancelled,
    Archived,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 6] = [
        ProjectStatus::Draft,
        ProjectStatus::Active,
        ProjectStatus::Completed,
        ProjectStatus::Paused,
        ProjectStatus::Cancelled,
        ProjectStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Draft => "draft",
            ProjectStatus::Active => "active",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Paused => "paused",
            ProjectStatus::Cancelled => "cancelled",
            ProjectStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown project status '{s}'"))
    }
}

/// Feature areas a project has switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectModule {
    Overview,
    Concept,
    Elements,
    Quotation,
    Schedule,
    Files,
    Materials,
    Logistics,
    Crew,
    #[serde(rename = "3d_model")]
    Model3d,
}

impl ProjectModule {
    pub const ALL: [ProjectModule; 10] = [
        ProjectModule::Overview,
        ProjectModule::Concept,
        ProjectModule::Elements,
        ProjectModule::Quotation,
        ProjectModule::Schedule,
        ProjectModule::Files,
        ProjectModule::Materials,
        ProjectModule::Logistics,
        ProjectModule::Crew,
        ProjectModule::Model3d,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectModule::Overview => "overview",
            ProjectModule::Concept => "concept",
            ProjectModule::Elements => "elements",
            ProjectModule::Quotation => "quotation",
            ProjectModule::Schedule => "schedule",
            ProjectModule::Files => "files",
            ProjectModule::Materials => "materials",
            ProjectModule::Logistics => "logistics",
            ProjectModule::Crew => "crew",
            ProjectModule::Model3d => "3d_model",
        }
    }
}

impl fmt::Display for ProjectModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectModule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProjectModule::ALL
            .into_iter()
            .find(|module| module.as_str() == s)
            .ok_or_else(|| format!("Unknown project module '{s}'"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub planned: f64,
    pub spent: f64,
    pub remaining: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub project_number: String,
    pub status: ProjectStatus,
    pub client_id: Uuid,
    pub description: Option<String>,
    pub modules: Vec<ProjectModule>,
    pub timeline: Timeline,
    pub progress: i32,
    pub budget: Option<Budget>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fully resolved insert payload; the client has already been chosen.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub project_number: String,
    pub status: ProjectStatus,
    pub client_id: Uuid,
    pub description: Option<String>,
    pub modules: Vec<ProjectModule>,
    pub timeline: Timeline,
    pub progress: i32,
    pub budget: Option<Budget>,
}

/// Partial update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub project_number: Option<String>,
    pub status: Option<ProjectStatus>,
    pub client_id: Option<Uuid>,
    pub description: Option<String>,
    pub modules: Option<Vec<ProjectModule>>,
    pub timeline: Option<Timeline>,
    pub progress: Option<i32>,
    pub budget: Option<Budget>,
}

impl ProjectChanges {
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(number) = &self.project_number {
            project.project_number = number.clone();
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(client_id) = self.client_id {
            project.client_id = client_id;
        }
        if let Some(description) = &self.description {
            project.description = Some(description.clone());
        }
        if let Some(modules) = &self.modules {
            project.modules = modules.clone();
        }
        if let Some(timeline) = &self.timeline {
            project.timeline = timeline.clone();
        }
        if let Some(progress) = self.progress {
            project.progress = progress;
        }
        if let Some(budget) = self.budget {
            project.budget = Some(budget);
        }
    }
}

/// Client identity plus primary contact details, as shown on a project card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientContact {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// A project row enriched with its client contact and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub client: ClientContact,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            page,
            limit,
            total,
            pages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectPage {
    pub projects: Vec<ProjectSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStats {
    pub total: u64,
    pub by_status: BTreeMap<ProjectStatus, u64>,
}
