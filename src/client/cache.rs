use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use uuid::Uuid;

use super::{ApiClient, ApiError};
use crate::models::{Project, ProjectPage, ProjectStats};
use crate::query::ProjectFilter;
use crate::validation::{CreateProjectRequest, UpdateProjectRequest};

pub const STALE_TIME: Duration = Duration::from_secs(5 * 60);
pub const GC_TIME: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// First fetch in flight, nothing to show yet.
    Loading,
    /// Refetch in flight, previous data still shown.
    Fetching,
    Idle,
    /// Last fetch failed. Earlier data, if any, is kept.
    Error,
}

#[derive(Debug, Clone)]
pub struct QueryState<V> {
    pub status: QueryStatus,
    pub data: Option<V>,
    pub error: Option<String>,
    pub fetched_at: Option<Instant>,
}

struct Entry<V> {
    state: QueryState<V>,
    generation: u64,
    invalidated: bool,
    touched_at: Instant,
}

/// Keyed query results with staleness, invalidation and last-write-wins.
///
/// Every fetch start and direct write takes a new generation; a fetch result
/// is only recorded if its generation is still the entry's latest.
pub struct QueryCache<K, V> {
    entries: DashMap<K, Entry<V>>,
    generation: AtomicU64,
    stale_time: Duration,
    gc_time: Duration,
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_times(STALE_TIME, GC_TIME)
    }

    pub fn with_times(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            stale_time,
            gc_time,
        }
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn state(&self, key: &K) -> Option<QueryState<V>> {
        self.entries.get(key).map(|e| e.state.clone())
    }

    pub fn data(&self, key: &K) -> Option<V> {
        self.entries.get(key).and_then(|e| e.state.data.clone())
    }

    pub fn is_stale(&self, key: &K) -> bool {
        match self.entries.get(key) {
            Some(entry) => {
                entry.invalidated
                    || entry
                        .state
                        .fetched_at
                        .is_none_or(|at| at.elapsed() >= self.stale_time)
            }
            None => true,
        }
    }

    fn fresh_data(&self, key: &K) -> Option<V> {
        if self.is_stale(key) {
            return None;
        }
        let mut entry = self.entries.get_mut(key)?;
        entry.touched_at = Instant::now();
        entry.state.data.clone()
    }

    /// Mark a fetch as started and return its generation.
    pub fn begin(&self, key: K) -> u64 {
        let generation = self.next_generation();
        let now = Instant::now();
        let mut entry = self.entries.entry(key).or_insert_with(|| Entry {
            state: QueryState {
                status: QueryStatus::Loading,
                data: None,
                error: None,
                fetched_at: None,
            },
            generation,
            invalidated: false,
            touched_at: now,
        });
        entry.generation = generation;
        entry.touched_at = now;
        entry.state.status = if entry.state.data.is_some() {
            QueryStatus::Fetching
        } else {
            QueryStatus::Loading
        };
        generation
    }

    /// Record a fetch result. Returns false when the result was superseded.
    pub fn complete(&self, key: &K, generation: u64, result: Result<V, String>) -> bool {
        let Some(mut entry) = self.entries.get_mut(key) else {
            return false;
        };
        if entry.generation != generation {
            return false;
        }
        match result {
            Ok(data) => {
                entry.state = QueryState {
                    status: QueryStatus::Idle,
                    data: Some(data),
                    error: None,
                    fetched_at: Some(Instant::now()),
                };
                entry.invalidated = false;
            }
            Err(message) => {
                entry.state.status = QueryStatus::Error;
                entry.state.error = Some(message);
            }
        }
        true
    }

    /// Serve fresh data from the cache, otherwise run `fetcher` once and
    /// record its outcome. Failures are not retried. Entries idle for longer
    /// than the gc time are dropped first.
    pub async fn fetch<F, Fut, E>(&self, key: K, fetcher: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: Display,
    {
        let dropped = self.collect_garbage();
        if dropped > 0 {
            tracing::debug!(dropped, "collected idle queries");
        }
        if let Some(data) = self.fresh_data(&key) {
            return Ok(data);
        }

        let generation = self.begin(key.clone());
        let result = fetcher().await;
        let outcome = match &result {
            Ok(data) => Ok(data.clone()),
            Err(e) => Err(e.to_string()),
        };
        if !self.complete(&key, generation, outcome) {
            tracing::debug!(generation, "discarding superseded query result");
        }
        result
    }

    /// Write data directly, superseding any fetch still in flight.
    pub fn set_data(&self, key: K, data: V) {
        let now = Instant::now();
        self.entries.insert(
            key,
            Entry {
                state: QueryState {
                    status: QueryStatus::Idle,
                    data: Some(data),
                    error: None,
                    fetched_at: Some(now),
                },
                generation: self.next_generation(),
                invalidated: false,
                touched_at: now,
            },
        );
    }

    /// Patch cached data in place and return the value it replaced.
    pub fn update_data(&self, key: &K, patch: impl FnOnce(&mut V)) -> Option<V> {
        let mut entry = self.entries.get_mut(key)?;
        let data = entry.state.data.as_mut()?;
        let previous = data.clone();
        patch(data);
        entry.generation = self.next_generation();
        Some(previous)
    }

    pub fn invalidate(&self, key: &K) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.invalidated = true;
        }
    }

    pub fn invalidate_all(&self) {
        for mut entry in self.entries.iter_mut() {
            entry.invalidated = true;
        }
    }

    pub fn remove(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop entries nobody has touched within the gc time.
    pub fn collect_garbage(&self) -> usize {
        let before = self.entries.len();
        let gc_time = self.gc_time;
        self.entries.retain(|_, e| e.touched_at.elapsed() < gc_time);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Project queries and the invalidation each mutation triggers.
pub struct ProjectQueries {
    api: ApiClient,
    lists: QueryCache<ProjectFilter, ProjectPage>,
    details: QueryCache<Uuid, Project>,
    stats: QueryCache<(), ProjectStats>,
}

impl ProjectQueries {
    pub fn new(api: ApiClient) -> Self {
        Self::with_times(api, STALE_TIME, GC_TIME)
    }

    pub fn with_times(api: ApiClient, stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            api,
            lists: QueryCache::with_times(stale_time, gc_time),
            details: QueryCache::with_times(stale_time, gc_time),
            stats: QueryCache::with_times(stale_time, gc_time),
        }
    }

    pub fn lists(&self) -> &QueryCache<ProjectFilter, ProjectPage> {
        &self.lists
    }

    pub fn details(&self) -> &QueryCache<Uuid, Project> {
        &self.details
    }

    pub fn stats(&self) -> &QueryCache<(), ProjectStats> {
        &self.stats
    }

    pub async fn list(&self, filter: &ProjectFilter) -> Result<ProjectPage, ApiError> {
        self.lists
            .fetch(filter.clone(), || self.api.list_projects(filter))
            .await
    }

    pub async fn detail(&self, id: Uuid) -> Result<Project, ApiError> {
        self.details
            .fetch(id, || self.api.get_project(id))
            .await
    }

    pub async fn project_stats(&self) -> Result<ProjectStats, ApiError> {
        self.stats.fetch((), || self.api.project_stats()).await
    }

    fn invalidate_collections(&self) {
        self.lists.invalidate_all();
        self.stats.invalidate(&());
    }

    pub async fn create(&self, req: &CreateProjectRequest) -> Result<Project, ApiError> {
        let project = self
            .api
            .create_project(req)
            .await
            .inspect_err(|e| tracing::warn!("create project failed: {e}"))?;
        self.details.set_data(project.id, project.clone());
        self.invalidate_collections();
        Ok(project)
    }

    pub async fn update(&self, id: Uuid, req: &UpdateProjectRequest) -> Result<Project, ApiError> {
        let project = self
            .api
            .update_project(id, req)
            .await
            .inspect_err(|e| tracing::warn!(%id, "update project failed: {e}"))?;
        self.details.set_data(id, project.clone());
        self.invalidate_collections();
        Ok(project)
    }

    /// Apply the change to the cached detail before the request is sent and
    /// roll it back if the server rejects it.
    pub async fn update_optimistic(
        &self,
        id: Uuid,
        req: &UpdateProjectRequest,
    ) -> Result<Project, ApiError> {
        let changes = req.clone().into_changes();
        let previous = self.details.update_data(&id, |project| changes.apply(project));
        self.lists.invalidate_all();

        match self.api.update_project(id, req).await {
            Ok(project) => {
                self.details.set_data(id, project.clone());
                self.invalidate_collections();
                Ok(project)
            }
            Err(e) => {
                tracing::warn!(%id, "optimistic update rolled back: {e}");
                match previous {
                    Some(project) => self.details.set_data(id, project),
                    None => self.details.invalidate(&id),
                }
                Err(e)
            }
        }
    }

    pub async fn archive(&self, id: Uuid) -> Result<Project, ApiError> {
        let project = self.api.archive_project(id).await?;
        self.details.set_data(id, project.clone());
        self.invalidate_collections();
        Ok(project)
    }

    pub async fn unarchive(&self, id: Uuid) -> Result<Project, ApiError> {
        let project = self.api.unarchive_project(id).await?;
        self.details.set_data(id, project.clone());
        self.invalidate_collections();
        Ok(project)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        self.api
            .delete_project(id)
            .await
            .inspect_err(|e| tracing::warn!(%id, "delete project failed: {e}"))?;
        self.details.remove(&id);
        self.invalidate_collections();
        Ok(())
    }
}
