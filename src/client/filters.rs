//! Per-view project list filter state.
//!
//! The current [`ProjectFilter`] is published on a `watch` channel; a view
//! re-fetches whenever it changes. Search text is committed after a quiet
//! period, every other change is committed immediately. Any change other than
//! paging moves the view back to page 1.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use uuid::Uuid;

use super::Debouncer;
use crate::models::{ProjectModule, ProjectStatus};
use crate::query::{ProjectFilter, ProjectSortField, SortOrder};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectTab {
    #[default]
    Current,
    Archived,
}

impl ProjectTab {
    pub fn default_statuses(&self) -> Vec<ProjectStatus> {
        match self {
            ProjectTab::Current => vec![
                ProjectStatus::Active,
                ProjectStatus::Paused,
                ProjectStatus::Completed,
                ProjectStatus::Draft,
            ],
            ProjectTab::Archived => vec![ProjectStatus::Archived],
        }
    }

    pub fn default_filter(&self) -> ProjectFilter {
        ProjectFilter {
            status: self.default_statuses(),
            sort_by: ProjectSortField::UpdatedAt,
            sort_order: SortOrder::Desc,
            ..ProjectFilter::default()
        }
    }
}

/// A filter field that can be cleared on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Search,
    Status,
    Client,
    Modules,
    DateRange,
    Location,
    Sort,
}

pub struct FilterController {
    tab: ProjectTab,
    state: Arc<watch::Sender<ProjectFilter>>,
    search: Debouncer,
}

fn commit(state: &watch::Sender<ProjectFilter>, change: impl FnOnce(&mut ProjectFilter)) -> bool {
    state.send_if_modified(|filter| {
        let before = filter.clone();
        change(filter);
        if *filter == before {
            return false;
        }
        filter.page = 1;
        true
    })
}

fn normalize_search(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn add_unique<T: PartialEq>(values: &mut Vec<T>, value: T) {
    if !values.contains(&value) {
        values.push(value);
    }
}

impl FilterController {
    pub fn new(tab: ProjectTab) -> Self {
        Self::with_search_delay(tab, SEARCH_DEBOUNCE)
    }

    pub fn with_search_delay(tab: ProjectTab, delay: Duration) -> Self {
        let (state, _) = watch::channel(tab.default_filter());
        Self {
            tab,
            state: Arc::new(state),
            search: Debouncer::new(delay),
        }
    }

    pub fn tab(&self) -> ProjectTab {
        self.tab
    }

    pub fn filter(&self) -> ProjectFilter {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProjectFilter> {
        self.state.subscribe()
    }

    /// Commit `text` as the search term after the debounce delay. A newer
    /// call replaces a pending one.
    pub fn set_search(&self, text: &str) {
        let state = self.state.clone();
        let search = normalize_search(text);
        self.search.schedule(async move {
            if commit(&state, |f| f.search = search) {
                tracing::debug!("search committed");
            }
        });
    }

    /// Commit `text` immediately, dropping any pending debounced search.
    pub fn search_now(&self, text: &str) {
        self.search.cancel();
        let search = normalize_search(text);
        commit(&self.state, |f| f.search = search);
    }

    pub fn set_statuses(&self, statuses: Vec<ProjectStatus>) {
        commit(&self.state, |f| f.status = statuses);
    }

    pub fn add_status(&self, status: ProjectStatus) {
        commit(&self.state, |f| add_unique(&mut f.status, status));
    }

    pub fn remove_status(&self, status: ProjectStatus) {
        commit(&self.state, |f| f.status.retain(|s| *s != status));
    }

    pub fn add_client(&self, client: Uuid) {
        commit(&self.state, |f| add_unique(&mut f.client, client));
    }

    pub fn remove_client(&self, client: Uuid) {
        commit(&self.state, |f| f.client.retain(|c| *c != client));
    }

    pub fn add_module(&self, module: ProjectModule) {
        commit(&self.state, |f| add_unique(&mut f.modules, module));
    }

    pub fn remove_module(&self, module: ProjectModule) {
        commit(&self.state, |f| f.modules.retain(|m| *m != module));
    }

    pub fn set_date_range(&self, from: Option<DateTime<Utc>>, until: Option<DateTime<Utc>>) {
        commit(&self.state, |f| {
            f.created_from = from;
            f.created_until = until;
        });
    }

    pub fn set_location(&self, city: Option<String>, radius: Option<u32>) {
        let city = city.as_deref().and_then(normalize_search);
        commit(&self.state, |f| {
            f.city = city;
            f.radius = radius;
        });
    }

    pub fn set_sort(&self, sort_by: ProjectSortField, sort_order: SortOrder) {
        commit(&self.state, |f| {
            f.sort_by = sort_by;
            f.sort_order = sort_order;
        });
    }

    pub fn set_limit(&self, limit: u32) {
        commit(&self.state, |f| f.limit = limit);
    }

    pub fn set_page(&self, page: u32) {
        let page = page.max(1);
        self.state.send_if_modified(|f| {
            if f.page == page {
                return false;
            }
            f.page = page;
            true
        });
    }

    /// Reset one field to its value in the tab default.
    pub fn clear(&self, field: FilterField) {
        let defaults = self.tab.default_filter();
        if field == FilterField::Search {
            self.search.cancel();
        }
        commit(&self.state, |f| match field {
            FilterField::Search => f.search = None,
            FilterField::Status => f.status = defaults.status,
            FilterField::Client => f.client.clear(),
            FilterField::Modules => f.modules.clear(),
            FilterField::DateRange => {
                f.created_from = None;
                f.created_until = None;
            }
            FilterField::Location => {
                f.city = None;
                f.radius = None;
            }
            FilterField::Sort => {
                f.sort_by = defaults.sort_by;
                f.sort_order = defaults.sort_order;
            }
        });
    }

    /// Reset everything to the tab default, keeping the page size.
    pub fn clear_all(&self) {
        self.search.cancel();
        let defaults = self.tab.default_filter();
        commit(&self.state, |f| {
            *f = ProjectFilter {
                limit: f.limit,
                ..defaults
            };
        });
    }

    /// Move to another tab. Only the status set is replaced.
    pub fn switch_tab(&mut self, tab: ProjectTab) {
        if self.tab == tab {
            return;
        }
        self.tab = tab;
        commit(&self.state, |f| f.status = tab.default_statuses());
    }
}
