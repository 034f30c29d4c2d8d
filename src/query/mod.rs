//! Typed list filters for projects, clients and materials.
//!
//! Filters are parsed from raw query strings at the HTTP boundary and encoded
//! back into query strings by [`crate::client::ApiClient`]. Multi-valued keys
//! accept both repeated keys (`status=a&status=b`) and comma-joined values
//! (`status=a,b`).

pub mod sql;

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::FieldError;
use crate::models::{Client, Material, MaterialUnit, Project, ProjectModule, ProjectStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("Unknown sort order '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProjectSortField {
    Name,
    CreatedAt,
    #[default]
    UpdatedAt,
    EndDate,
}

impl ProjectSortField {
    pub fn as_param(&self) -> &'static str {
        match self {
            ProjectSortField::Name => "name",
            ProjectSortField::CreatedAt => "createdAt",
            ProjectSortField::UpdatedAt => "updatedAt",
            ProjectSortField::EndDate => "endDate",
        }
    }
}

impl FromStr for ProjectSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ProjectSortField::Name),
            "createdAt" => Ok(ProjectSortField::CreatedAt),
            "updatedAt" => Ok(ProjectSortField::UpdatedAt),
            "endDate" => Ok(ProjectSortField::EndDate),
            other => Err(format!("Unknown sort field '{other}'")),
        }
    }
}

/// A single conjunct of a project list query.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Case-insensitive substring match on name, project number or description.
    Search(String),
    StatusIn(Vec<ProjectStatus>),
    ClientIn(Vec<Uuid>),
    /// At least one of the tags is present on the project.
    ModulesOverlap(Vec<ProjectModule>),
    CreatedFrom(DateTime<Utc>),
    CreatedUntil(DateTime<Utc>),
    /// Client address city equals the value, ignoring case.
    ClientCity(String),
}

impl Predicate {
    /// Evaluate against an in-memory row. `client` is the project's owning client.
    pub fn matches(&self, project: &Project, client: Option<&Client>) -> bool {
        match self {
            Predicate::Search(text) => {
                let needle = text.to_lowercase();
                contains_folded(&project.name, &needle)
                    || contains_folded(&project.project_number, &needle)
                    || project
                        .description
                        .as_deref()
                        .is_some_and(|d| contains_folded(d, &needle))
            }
            Predicate::StatusIn(statuses) => statuses.contains(&project.status),
            Predicate::ClientIn(ids) => ids.contains(&project.client_id),
            Predicate::ModulesOverlap(modules) => {
                modules.iter().any(|m| project.modules.contains(m))
            }
            Predicate::CreatedFrom(from) => project.created_at >= *from,
            Predicate::CreatedUntil(until) => project.created_at <= *until,
            Predicate::ClientCity(city) => client
                .and_then(Client::city)
                .is_some_and(|c| c.to_lowercase() == city.to_lowercase()),
        }
    }
}

pub(crate) fn contains_folded(haystack: &str, folded_needle: &str) -> bool {
    haystack.to_lowercase().contains(folded_needle)
}

/// Store-level project list request: conjunctive predicates, ordering, window.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectQuery {
    pub predicates: Vec<Predicate>,
    pub sort_by: ProjectSortField,
    pub sort_order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

/// Order two projects by the requested key, breaking ties on `id` ascending.
/// Projects without an end date sort last in both directions.
pub fn compare_projects(
    a: &Project,
    b: &Project,
    field: ProjectSortField,
    order: SortOrder,
) -> Ordering {
    let primary = match field {
        ProjectSortField::Name => order.apply(a.name.cmp(&b.name)),
        ProjectSortField::CreatedAt => order.apply(a.created_at.cmp(&b.created_at)),
        ProjectSortField::UpdatedAt => order.apply(a.updated_at.cmp(&b.updated_at)),
        ProjectSortField::EndDate => match (a.timeline.end_date, b.timeline.end_date) {
            (Some(x), Some(y)) => order.apply(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
    };
    primary.then_with(|| a.id.cmp(&b.id))
}

/// Filter specification for `GET /api/projects`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectFilter {
    pub search: Option<String>,
    pub status: Vec<ProjectStatus>,
    pub client: Vec<Uuid>,
    pub modules: Vec<ProjectModule>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_until: Option<DateTime<Utc>>,
    pub city: Option<String>,
    /// Accepted for compatibility; there is no geographic data to apply it to.
    pub radius: Option<u32>,
    pub sort_by: ProjectSortField,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl Default for ProjectFilter {
    fn default() -> Self {
        Self {
            search: None,
            status: Vec::new(),
            client: Vec::new(),
            modules: Vec::new(),
            created_from: None,
            created_until: None,
            city: None,
            radius: None,
            sort_by: ProjectSortField::default(),
            sort_order: SortOrder::default(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProjectFilter {
    pub fn from_query(raw: &str) -> Result<Self, Vec<FieldError>> {
        let params = QueryParams::parse(raw);
        let mut errors = Vec::new();
        let mut filter = ProjectFilter::default();

        filter.search = params.text("search");
        filter.status = params.parse_many("status", &mut errors);
        filter.client = params.parse_many("client", &mut errors);
        filter.modules = params.parse_many("modules", &mut errors);
        filter.created_from = params
            .single("startDate")
            .and_then(|v| record(parse_bound(v, false), "startDate", &mut errors));
        filter.created_until = params
            .single("endDate")
            .and_then(|v| record(parse_bound(v, true), "endDate", &mut errors));
        filter.city = params.text("city");
        filter.radius = params.parse_one("radius", &mut errors);
        if let Some(sort_by) = params.parse_one("sortBy", &mut errors) {
            filter.sort_by = sort_by;
        }
        if let Some(sort_order) = params.parse_one("sortOrder", &mut errors) {
            filter.sort_order = sort_order;
        }
        let (page, limit) = params.window(&mut errors);
        filter.page = page;
        filter.limit = limit;

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(errors)
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs.extend(self.status.iter().map(|s| ("status", s.as_str().to_string())));
        pairs.extend(self.client.iter().map(|c| ("client", c.to_string())));
        pairs.extend(self.modules.iter().map(|m| ("modules", m.as_str().to_string())));
        if let Some(from) = self.created_from {
            pairs.push(("startDate", from.to_rfc3339()));
        }
        if let Some(until) = self.created_until {
            pairs.push(("endDate", until.to_rfc3339()));
        }
        if let Some(city) = &self.city {
            pairs.push(("city", city.clone()));
        }
        if let Some(radius) = self.radius {
            pairs.push(("radius", radius.to_string()));
        }
        pairs.push(("sortBy", self.sort_by.as_param().to_string()));
        pairs.push(("sortOrder", self.sort_order.as_str().to_string()));
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        pairs
    }

    pub fn to_query_string(&self) -> String {
        encode_pairs(&self.to_query_pairs())
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    /// The predicate set shared by the page query and the total count.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::new();
        if let Some(search) = &self.search {
            predicates.push(Predicate::Search(search.clone()));
        }
        if !self.status.is_empty() {
            predicates.push(Predicate::StatusIn(self.status.clone()));
        }
        if !self.client.is_empty() {
            predicates.push(Predicate::ClientIn(self.client.clone()));
        }
        if !self.modules.is_empty() {
            predicates.push(Predicate::ModulesOverlap(self.modules.clone()));
        }
        if let Some(from) = self.created_from {
            predicates.push(Predicate::CreatedFrom(from));
        }
        if let Some(until) = self.created_until {
            predicates.push(Predicate::CreatedUntil(until));
        }
        if let Some(city) = &self.city {
            predicates.push(Predicate::ClientCity(city.clone()));
        }
        predicates
    }

    pub fn to_query(&self) -> ProjectQuery {
        ProjectQuery {
            predicates: self.predicates(),
            sort_by: self.sort_by,
            sort_order: self.sort_order,
            limit: i64::from(self.limit),
            offset: self.offset(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClientSortField {
    #[default]
    Name,
    CreatedAt,
    UpdatedAt,
}

impl ClientSortField {
    pub fn as_param(&self) -> &'static str {
        match self {
            ClientSortField::Name => "name",
            ClientSortField::CreatedAt => "createdAt",
            ClientSortField::UpdatedAt => "updatedAt",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            ClientSortField::Name => "name",
            ClientSortField::CreatedAt => "created_at",
            ClientSortField::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for ClientSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(ClientSortField::Name),
            "createdAt" => Ok(ClientSortField::CreatedAt),
            "updatedAt" => Ok(ClientSortField::UpdatedAt),
            other => Err(format!("Unknown sort field '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientFilter {
    pub search: Option<String>,
    pub sort_by: ClientSortField,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl Default for ClientFilter {
    fn default() -> Self {
        Self {
            search: None,
            sort_by: ClientSortField::default(),
            sort_order: SortOrder::Asc,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientFilter {
    pub fn from_query(raw: &str) -> Result<Self, Vec<FieldError>> {
        let params = QueryParams::parse(raw);
        let mut errors = Vec::new();
        let mut filter = ClientFilter {
            search: params.text("search"),
            ..ClientFilter::default()
        };
        if let Some(sort_by) = params.parse_one("sortBy", &mut errors) {
            filter.sort_by = sort_by;
        }
        if let Some(sort_order) = params.parse_one("sortOrder", &mut errors) {
            filter.sort_order = sort_order;
        }
        let (page, limit) = params.window(&mut errors);
        filter.page = page;
        filter.limit = limit;

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(errors)
        }
    }

    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs.push(("sortBy", self.sort_by.as_param().to_string()));
        pairs.push(("sortOrder", self.sort_order.as_str().to_string()));
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        encode_pairs(&pairs)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    pub fn matches(&self, client: &Client) -> bool {
        let Some(search) = &self.search else {
            return true;
        };
        let needle = search.to_lowercase();
        contains_folded(&client.name, &needle)
            || client
                .tax_id
                .as_deref()
                .is_some_and(|t| contains_folded(t, &needle))
    }

    pub fn compare(&self, a: &Client, b: &Client) -> Ordering {
        let primary = match self.sort_by {
            ClientSortField::Name => a.name.cmp(&b.name),
            ClientSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            ClientSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        self.sort_order
            .apply(primary)
            .then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialSortField {
    #[default]
    Name,
    Category,
    Stock,
    Price,
    CreatedAt,
    UpdatedAt,
}

impl MaterialSortField {
    pub fn as_param(&self) -> &'static str {
        match self {
            MaterialSortField::Name => "name",
            MaterialSortField::Category => "category",
            MaterialSortField::Stock => "stock",
            MaterialSortField::Price => "price",
            MaterialSortField::CreatedAt => "createdAt",
            MaterialSortField::UpdatedAt => "updatedAt",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            MaterialSortField::Name => "name",
            MaterialSortField::Category => "category",
            MaterialSortField::Stock => "stock",
            MaterialSortField::Price => "price",
            MaterialSortField::CreatedAt => "created_at",
            MaterialSortField::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for MaterialSortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(MaterialSortField::Name),
            "category" => Ok(MaterialSortField::Category),
            "stock" => Ok(MaterialSortField::Stock),
            "price" => Ok(MaterialSortField::Price),
            "createdAt" => Ok(MaterialSortField::CreatedAt),
            "updatedAt" => Ok(MaterialSortField::UpdatedAt),
            other => Err(format!("Unknown sort field '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialFilter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub unit: Option<MaterialUnit>,
    pub low_stock: bool,
    pub sort_by: MaterialSortField,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

impl Default for MaterialFilter {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            unit: None,
            low_stock: false,
            sort_by: MaterialSortField::default(),
            sort_order: SortOrder::Asc,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl MaterialFilter {
    pub fn from_query(raw: &str) -> Result<Self, Vec<FieldError>> {
        let params = QueryParams::parse(raw);
        let mut errors = Vec::new();
        let mut filter = MaterialFilter {
            search: params.text("search"),
            category: params.text("category"),
            ..MaterialFilter::default()
        };
        filter.unit = params.parse_one("unit", &mut errors);
        filter.low_stock = params.parse_one("lowStock", &mut errors).unwrap_or(false);
        if let Some(sort_by) = params.parse_one("sortBy", &mut errors) {
            filter.sort_by = sort_by;
        }
        if let Some(sort_order) = params.parse_one("sortOrder", &mut errors) {
            filter.sort_order = sort_order;
        }
        let (page, limit) = params.window(&mut errors);
        filter.page = page;
        filter.limit = limit;

        if errors.is_empty() {
            Ok(filter)
        } else {
            Err(errors)
        }
    }

    pub fn to_query_string(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(unit) = self.unit {
            pairs.push(("unit", unit.as_str().to_string()));
        }
        if self.low_stock {
            pairs.push(("lowStock", "true".to_string()));
        }
        pairs.push(("sortBy", self.sort_by.as_param().to_string()));
        pairs.push(("sortOrder", self.sort_order.as_str().to_string()));
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        encode_pairs(&pairs)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.limit)
    }

    pub fn matches(&self, material: &Material) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = contains_folded(&material.name, &needle)
                || contains_folded(&material.sku, &needle)
                || material
                    .supplier
                    .as_deref()
                    .is_some_and(|s| contains_folded(s, &needle));
            if !hit {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !material.category.iter().any(|c| c == category) {
                return false;
            }
        }
        if let Some(unit) = self.unit {
            if material.unit != unit {
                return false;
            }
        }
        !self.low_stock || material.is_low_stock()
    }

    pub fn compare(&self, a: &Material, b: &Material) -> Ordering {
        let primary = match self.sort_by {
            MaterialSortField::Name => a.name.cmp(&b.name),
            MaterialSortField::Category => a.category.cmp(&b.category),
            MaterialSortField::Stock => a.stock.total_cmp(&b.stock),
            MaterialSortField::Price => a.price.total_cmp(&b.price),
            MaterialSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            MaterialSortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };
        self.sort_order
            .apply(primary)
            .then_with(|| a.id.cmp(&b.id))
    }
}

fn encode_pairs(pairs: &[(&str, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// Decoded `key=value` pairs in request order.
struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    fn parse(raw: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(raw.as_bytes()).into_owned().collect(),
        }
    }

    /// Last non-empty value for `key`.
    fn single(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .find(|v| !v.is_empty())
    }

    fn text(&self, key: &str) -> Option<String> {
        self.single(key).map(str::to_string)
    }

    /// Every value for `key`, splitting comma-joined values, without duplicates.
    fn many(&self, key: &str) -> Vec<&str> {
        let mut values: Vec<&str> = Vec::new();
        for (_, value) in self.pairs.iter().filter(|(k, _)| k == key) {
            for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                if !values.contains(&part) {
                    values.push(part);
                }
            }
        }
        values
    }

    fn parse_one<T>(&self, key: &str, errors: &mut Vec<FieldError>) -> Option<T>
    where
        T: FromStr,
        T::Err: ToString,
    {
        self.single(key)
            .and_then(|v| record(v.parse::<T>().map_err(|e| e.to_string()), key, errors))
    }

    fn parse_many<T>(&self, key: &str, errors: &mut Vec<FieldError>) -> Vec<T>
    where
        T: FromStr,
        T::Err: ToString,
    {
        self.many(key)
            .into_iter()
            .filter_map(|v| record(v.parse::<T>().map_err(|e| e.to_string()), key, errors))
            .collect()
    }

    /// `(page, limit)` with page >= 1 and limit clamped to 1..=MAX_PAGE_SIZE.
    fn window(&self, errors: &mut Vec<FieldError>) -> (u32, u32) {
        let page = self.parse_one::<u32>("page", errors).unwrap_or(1).max(1);
        let limit = self
            .parse_one::<u32>("limit", errors)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }
}

fn record<T>(result: Result<T, String>, field: &str, errors: &mut Vec<FieldError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(message) => {
            errors.push(FieldError::new(field, message));
            None
        }
    }
}

/// Accepts an RFC 3339 timestamp or a plain `YYYY-MM-DD` date. A plain upper
/// bound covers the whole day.
fn parse_bound(value: &str, upper: bool) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date '{value}'"))?;
    let time = if upper {
        NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    };
    time.map(|t| date.and_time(t).and_utc())
        .ok_or_else(|| format!("Invalid date '{value}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_query_is_empty() {
        let filter = ProjectFilter::from_query("").unwrap();
        assert_eq!(filter, ProjectFilter::default());
        assert_eq!(filter.sort_by, ProjectSortField::UpdatedAt);
        assert_eq!(filter.sort_order, SortOrder::Desc);
        assert_eq!((filter.page, filter.limit), (1, 10));
        assert!(filter.predicates().is_empty());
    }

    #[test]
    fn repeated_and_comma_joined_statuses_merge() {
        let filter =
            ProjectFilter::from_query("status=active&status=draft,paused&status=active").unwrap();
        assert_eq!(
            filter.status,
            vec![
                ProjectStatus::Active,
                ProjectStatus::Draft,
                ProjectStatus::Paused
            ]
        );
    }

    #[test]
    fn invalid_values_are_reported_per_field() {
        let errors =
            ProjectFilter::from_query("status=finished&sortBy=color&page=abc&client=nope")
                .unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"status"));
        assert!(fields.contains(&"sortBy"));
        assert!(fields.contains(&"page"));
        assert!(fields.contains(&"client"));
    }

    #[test]
    fn window_is_clamped() {
        let filter = ProjectFilter::from_query("page=0&limit=500").unwrap();
        assert_eq!((filter.page, filter.limit), (1, MAX_PAGE_SIZE));
        let filter = ProjectFilter::from_query("page=3&limit=0").unwrap();
        assert_eq!((filter.page, filter.limit), (3, 1));
        assert_eq!(filter.offset(), 2);
    }

    #[test]
    fn plain_end_date_covers_whole_day() {
        let filter = ProjectFilter::from_query("startDate=2025-01-01&endDate=2025-01-31").unwrap();
        let from = filter.created_from.unwrap();
        let until = filter.created_until.unwrap();
        assert_eq!(from.to_rfc3339(), "2025-01-01T00:00:00+00:00");
        assert!(until > "2025-01-31T23:59:59Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn encoding_parses_back_to_the_same_filter() {
        let filter = ProjectFilter {
            search: Some("stoisko & co".to_string()),
            status: vec![ProjectStatus::Active, ProjectStatus::Archived],
            client: vec![Uuid::now_v7()],
            modules: vec![ProjectModule::Model3d, ProjectModule::Files],
            created_from: Some("2025-01-01T10:00:00Z".parse().unwrap()),
            created_until: None,
            city: Some("Kraków".to_string()),
            radius: Some(25),
            sort_by: ProjectSortField::EndDate,
            sort_order: SortOrder::Asc,
            page: 2,
            limit: 5,
        };
        let parsed = ProjectFilter::from_query(&filter.to_query_string()).unwrap();
        assert_eq!(parsed, filter);
    }

    #[test]
    fn search_and_city_become_predicates() {
        let filter = ProjectFilter::from_query("search=%20stand%20&city=Warszawa").unwrap();
        assert_eq!(
            filter.predicates(),
            vec![
                Predicate::Search("stand".to_string()),
                Predicate::ClientCity("Warszawa".to_string())
            ]
        );
    }

    #[test]
    fn material_filter_parses_flags() {
        let filter = MaterialFilter::from_query("unit=sq-meter&lowStock=true&sortBy=price").unwrap();
        assert_eq!(filter.unit, Some(MaterialUnit::SquareMeter));
        assert!(filter.low_stock);
        assert_eq!(filter.sort_by, MaterialSortField::Price);
        assert!(MaterialFilter::from_query("unit=barrel").is_err());
    }
}
