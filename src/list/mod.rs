//! List screens
//!
//! Provides:
//! - `ListController<T>`: wholesale refresh, search, sort, pagination and
//!   the delete-confirmation flow for one collection
//! - `ListResource`: per-entity fetch/delete and column bindings
//! - `Notice`: auto-dismissing mutation outcome
//!
//! Each controller owns its collections; nothing is shared between screens.

pub mod notice;
pub mod pagination;
pub mod resources;
pub mod sort;

pub use notice::{Notice, NoticeKind, NOTICE_TTL};
pub use pagination::{Pagination, DEFAULT_PAGE_SIZE};
pub use resources::ListResource;
pub use sort::{SortDirection, SortState, SortValue};

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::DashboardApi;
use crate::error::ApiResult;
use crate::lookup::BeneficiaryIndex;
use crate::models::DeleteSummary;

/// What the screen should render
#[derive(Debug, Clone, PartialEq)]
pub enum ListView<'a, T> {
    /// First load still running
    Loading,
    /// First load failed; nothing to show
    Error(String),
    /// Loaded, but no rows (after search)
    Empty { banner: Option<String> },
    Rows {
        rows: Vec<&'a T>,
        /// Refresh-after-mutation failure; rows are the last good data
        banner: Option<String>,
        page: usize,
        page_count: usize,
        total: usize,
    },
}

/// State behind one list screen
pub struct ListController<T: ListResource> {
    api: Arc<dyn DashboardApi>,
    /// Server order
    items: Vec<T>,
    beneficiaries: BeneficiaryIndex,
    loaded: bool,
    loading: bool,
    load_error: Option<String>,
    banner: Option<String>,
    sort: SortState,
    search: String,
    pagination: Pagination,
    pending_delete: Option<T>,
    notice: Option<Notice>,
}

impl<T: ListResource> ListController<T> {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self::with_page_size(api, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(api: Arc<dyn DashboardApi>, page_size: usize) -> Self {
        Self {
            api,
            items: Vec::new(),
            beneficiaries: BeneficiaryIndex::default(),
            loaded: false,
            loading: false,
            load_error: None,
            banner: None,
            sort: SortState::Default,
            search: String::new(),
            pagination: Pagination::new(page_size),
            pending_delete: None,
            notice: None,
        }
    }

    /// Raw collection in server order
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Lookup set for joined names and for form contexts
    pub fn beneficiaries(&self) -> &BeneficiaryIndex {
        &self.beneficiaries
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Fetch the collection (and beneficiaries when joined) and replace
    /// local state wholesale.
    ///
    /// A failure before anything was loaded becomes the error view; a later
    /// failure keeps the previous rows and shows a banner. A failed
    /// beneficiary fetch alone still applies the collection, keeps the
    /// previous index and shows a banner.
    pub async fn refresh(&mut self) -> ApiResult<()> {
        self.loading = true;
        let api = self.api.as_ref();
        let (result, lookup) = if T::JOINS_BENEFICIARIES {
            let (items, beneficiaries) =
                futures::future::join(T::fetch_all(api), api.list_beneficiaries()).await;
            match beneficiaries {
                Ok(beneficiaries) => (
                    items.map(|items| (items, Some(BeneficiaryIndex::new(beneficiaries)))),
                    None,
                ),
                Err(e) => (items.map(|items| (items, None)), Some(e)),
            }
        } else {
            let result = T::fetch_all(api).await.map(|items| {
                let index = T::index_from(&items);
                (items, index)
            });
            (result, None)
        };
        self.loading = false;

        match result {
            Ok((items, index)) => {
                debug!(resource = T::LABEL, count = items.len(), "List refreshed");
                self.items = items;
                if let Some(index) = index {
                    self.beneficiaries = index;
                }
                self.loaded = true;
                self.load_error = None;
                self.banner = lookup.map(|e| {
                    warn!(resource = T::LABEL, status = e.status, error = %e, "Beneficiary lookup failed");
                    format!("Failed to load beneficiary names: {}", e.message)
                });
                let total = self.total();
                self.pagination.clamp(total);
                Ok(())
            }
            Err(e) => {
                warn!(resource = T::LABEL, status = e.status, error = %e, "List refresh failed");
                if self.loaded {
                    self.banner = Some(format!("Failed to refresh {} list: {}", T::LABEL, e.message));
                } else {
                    self.load_error = Some(e.message.clone());
                }
                Err(e)
            }
        }
    }

    /// Advance the sort cycle on `key`; unknown keys are ignored.
    pub fn sort(&mut self, key: &str) -> bool {
        if !T::SORT_KEYS.contains(&key) {
            debug!(resource = T::LABEL, key, "Ignoring unknown sort key");
            return false;
        }
        self.sort.toggle(key);
        true
    }

    /// Filter rows by free text; returns to page 1
    pub fn set_search(&mut self, text: &str) {
        self.search = text.trim().to_string();
        self.pagination.set_page(1, self.total());
    }

    /// Move to `page`; a different `page_size` resets to page 1 instead
    pub fn paginate(&mut self, page: usize, page_size: usize) {
        if page_size.max(1) != self.pagination.page_size() {
            self.pagination.set_page_size(page_size);
        } else {
            let total = self.total();
            self.pagination.set_page(page, total);
        }
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.pagination.set_page_size(page_size);
    }

    /// Rows after search and sort, before pagination
    pub fn ordered(&self) -> Vec<&T> {
        let needle = self.search.to_lowercase();
        let rows: Vec<&T> = self
            .items
            .iter()
            .filter(|row| {
                needle.is_empty()
                    || row
                        .search_text(&self.beneficiaries)
                        .iter()
                        .any(|text| text.to_lowercase().contains(&needle))
            })
            .collect();

        match &self.sort {
            SortState::Default => rows,
            SortState::Sorted { key, direction } => sort::sort_rows(rows, *direction, |row| {
                row.sort_value(key, &self.beneficiaries)
                    .unwrap_or_else(|| SortValue::text(""))
            }),
        }
    }

    /// Row count after search
    pub fn total(&self) -> usize {
        if self.search.is_empty() {
            self.items.len()
        } else {
            self.ordered().len()
        }
    }

    pub fn page_count(&self) -> usize {
        self.pagination.page_count(self.total())
    }

    /// Current page of rows
    pub fn visible(&self) -> Vec<&T> {
        let rows = self.ordered();
        let range = self.pagination.range(rows.len());
        rows[range].to_vec()
    }

    pub fn view(&self) -> ListView<'_, T> {
        if !self.loaded {
            return match &self.load_error {
                Some(message) if !self.loading => ListView::Error(message.clone()),
                _ => ListView::Loading,
            };
        }

        let rows = self.ordered();
        let total = rows.len();
        if total == 0 {
            return ListView::Empty {
                banner: self.banner.clone(),
            };
        }
        let range = self.pagination.range(total);
        ListView::Rows {
            rows: rows[range].to_vec(),
            banner: self.banner.clone(),
            page: self.pagination.page(),
            page_count: self.pagination.page_count(total),
            total,
        }
    }

    // ==================== Mutations ====================

    /// Open the delete confirmation for the row with this storage id
    pub fn request_delete(&mut self, id: &str) -> bool {
        self.pending_delete = self.items.iter().find(|row| row.storage_id() == id).cloned();
        self.pending_delete.is_some()
    }

    pub fn pending_delete(&self) -> Option<&T> {
        self.pending_delete.as_ref()
    }

    /// Close the confirmation without touching the server
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete the pending row, refresh, close the confirmation and post a
    /// notice. `Ok(None)` when nothing was pending.
    pub async fn confirm_delete(&mut self) -> ApiResult<Option<DeleteSummary>> {
        let Some(target) = self.pending_delete.clone() else {
            return Ok(None);
        };
        let id = target.storage_id().to_string();

        match T::delete(self.api.as_ref(), &id).await {
            Ok(summary) => {
                info!(resource = T::LABEL, %id, "Deleted");
                // A failed refresh leaves a banner; the delete itself succeeded
                let _ = self.refresh().await;
                self.pending_delete = None;
                let message = match summary.cascade_note() {
                    Some(note) => format!("{} deleted successfully; {}", T::TITLE, note),
                    None => format!("{} deleted successfully", T::TITLE),
                };
                self.notice = Some(Notice::success(message));
                Ok(Some(summary))
            }
            Err(e) => {
                warn!(resource = T::LABEL, %id, error = %e, "Delete failed");
                self.pending_delete = None;
                self.notice = Some(Notice::error(format!(
                    "Failed to delete {}: {}",
                    T::LABEL,
                    e.message
                )));
                Err(e)
            }
        }
    }

    /// Refresh after a successful form submit and post its notice
    pub async fn after_mutation(&mut self, message: impl Into<String>) -> ApiResult<()> {
        self.notice = Some(Notice::success(message));
        self.refresh().await
    }

    pub fn notify(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// Current notice, hidden once it has expired
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| !n.is_expired())
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }
}
