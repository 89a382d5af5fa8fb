//! Province → municipality → barangay option cascade
//!
//! Each level is only meaningful under its parent selection. Selecting a
//! parent clears every level below it immediately, and responses for a parent
//! that is no longer selected are dropped when they arrive.

use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::api::DashboardApi;

/// The three cascade levels, outermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressLevel {
    Province,
    Municipality,
    Barangay,
}

impl AddressLevel {
    fn plural(&self) -> &'static str {
        match self {
            AddressLevel::Province => "provinces",
            AddressLevel::Municipality => "municipalities",
            AddressLevel::Barangay => "barangays",
        }
    }
}

/// Fetch status of one level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LevelStatus {
    #[default]
    Idle,
    Loading,
    /// Last fetch failed; options were emptied
    Error(String),
}

/// Point-in-time view of one level
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelSnapshot {
    pub options: Vec<String>,
    pub selected: Option<String>,
    pub status: LevelStatus,
}

/// Point-in-time view of the whole cascade
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CascadeSnapshot {
    pub province: LevelSnapshot,
    pub municipality: LevelSnapshot,
    pub barangay: LevelSnapshot,
}

impl CascadeSnapshot {
    pub fn level(&self, level: AddressLevel) -> &LevelSnapshot {
        match level {
            AddressLevel::Province => &self.province,
            AddressLevel::Municipality => &self.municipality,
            AddressLevel::Barangay => &self.barangay,
        }
    }
}

#[derive(Debug, Default)]
struct Level {
    view: LevelSnapshot,
    /// Bumped on every reset or fetch; a response is applied only if its
    /// ticket is still current.
    ticket: u64,
}

impl Level {
    fn clear(&mut self) {
        self.view = LevelSnapshot::default();
        self.ticket += 1;
    }

    fn start_loading(&mut self) -> u64 {
        self.view.options.clear();
        self.view.status = LevelStatus::Loading;
        self.ticket += 1;
        self.ticket
    }
}

#[derive(Debug, Default)]
struct CascadeState {
    province: Level,
    municipality: Level,
    barangay: Level,
}

impl CascadeState {
    fn level_mut(&mut self, level: AddressLevel) -> &mut Level {
        match level {
            AddressLevel::Province => &mut self.province,
            AddressLevel::Municipality => &mut self.municipality,
            AddressLevel::Barangay => &mut self.barangay,
        }
    }
}

/// Race-safe address option loader.
///
/// Methods take `&self` so a new selection can be issued while an earlier
/// fetch is still pending; the state lock is never held across a request.
pub struct AddressCascade {
    api: Arc<dyn DashboardApi>,
    state: Mutex<CascadeState>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl AddressCascade {
    pub fn new(api: Arc<dyn DashboardApi>) -> Self {
        Self {
            api,
            state: Mutex::new(CascadeState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CascadeState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> CascadeSnapshot {
        let state = self.lock();
        CascadeSnapshot {
            province: state.province.view.clone(),
            municipality: state.municipality.view.clone(),
            barangay: state.barangay.view.clone(),
        }
    }

    /// A level is unusable while its parent is unset or its own fetch runs.
    pub fn is_disabled(&self, level: AddressLevel) -> bool {
        let state = self.lock();
        let parent_unset = match level {
            AddressLevel::Province => false,
            AddressLevel::Municipality => state.province.view.selected.is_none(),
            AddressLevel::Barangay => state.municipality.view.selected.is_none(),
        };
        let own = match level {
            AddressLevel::Province => &state.province,
            AddressLevel::Municipality => &state.municipality,
            AddressLevel::Barangay => &state.barangay,
        };
        parent_unset || own.view.status == LevelStatus::Loading
    }

    pub async fn load_provinces(&self) {
        let ticket = self.lock().province.start_loading();
        let result = self.api.provinces().await;
        self.apply(AddressLevel::Province, ticket, result, |_| true);
    }

    /// Select `province`, clear everything below it and fetch its
    /// municipalities. An empty province only clears.
    pub async fn load_municipalities(&self, province: &str) {
        let selected = non_empty(province);
        let ticket = {
            let mut state = self.lock();
            state.province.view.selected = selected.clone();
            state.municipality.clear();
            state.barangay.clear();
            match &selected {
                Some(_) => state.municipality.start_loading(),
                None => return,
            }
        };

        let Some(province) = selected else { return };
        let result = self.api.municipalities(&province).await;
        self.apply(AddressLevel::Municipality, ticket, result, |state| {
            state.province.view.selected.as_deref() == Some(province.as_str())
        });
    }

    /// Select `municipality` under `province`, clear barangays and fetch them.
    pub async fn load_barangays(&self, province: &str, municipality: &str) {
        let province = province.trim().to_string();
        let selected = non_empty(municipality);
        let ticket = {
            let mut state = self.lock();
            if state.province.view.selected.as_deref() != Some(province.as_str()) {
                debug!(%province, "Ignoring barangay load for an unselected province");
                return;
            }
            state.municipality.view.selected = selected.clone();
            state.barangay.clear();
            match &selected {
                Some(_) => state.barangay.start_loading(),
                None => return,
            }
        };

        let Some(municipality) = selected else { return };
        let result = self.api.barangays(&province, &municipality).await;
        self.apply(AddressLevel::Barangay, ticket, result, |state| {
            state.province.view.selected.as_deref() == Some(province.as_str())
                && state.municipality.view.selected.as_deref() == Some(municipality.as_str())
        });
    }

    pub fn select_barangay(&self, barangay: &str) {
        self.lock().barangay.view.selected = non_empty(barangay);
    }

    /// Clear municipality and barangay without fetching.
    pub fn reset_municipalities(&self) {
        let mut state = self.lock();
        state.municipality.clear();
        state.barangay.clear();
    }

    /// Clear barangay without fetching.
    pub fn reset_barangays(&self) {
        self.lock().barangay.clear();
    }

    fn apply<F>(
        &self,
        level: AddressLevel,
        ticket: u64,
        result: crate::error::ApiResult<Vec<String>>,
        parent_matches: F,
    ) where
        F: FnOnce(&CascadeState) -> bool,
    {
        let mut state = self.lock();
        if state.level_mut(level).ticket != ticket {
            debug!(level = level.plural(), "Discarding stale address response");
            return;
        }
        if !parent_matches(&*state) {
            // Still the latest request for this level, so it must not stay loading
            debug!(level = level.plural(), "Discarding address response for a changed parent");
            let target = state.level_mut(level);
            target.view.options.clear();
            target.view.status = LevelStatus::Idle;
            return;
        }

        let target = state.level_mut(level);
        match result {
            Ok(options) => {
                debug!(level = level.plural(), count = options.len(), "Address options loaded");
                target.view.options = options;
                target.view.status = LevelStatus::Idle;
            }
            Err(e) => {
                warn!(level = level.plural(), error = %e, "Address lookup failed");
                target.view.options.clear();
                target.view.status =
                    LevelStatus::Error(format!("Failed to load {}: {}", level.plural(), e.message));
            }
        }
    }
}
