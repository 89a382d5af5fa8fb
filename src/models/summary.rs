//! Aggregate statistics and delete summaries

use serde::{Deserialize, Serialize};

/// Response from `GET /statistics`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(default)]
    pub total_beneficiaries: u64,
    #[serde(default)]
    pub total_seeds_distributed: u64,
    #[serde(default)]
    pub total_alive: u64,
    #[serde(default)]
    pub total_dead: u64,
}

impl Statistics {
    /// Alive share of all surveyed crops, `0.0` without survey data
    pub fn survival_rate(&self) -> f64 {
        let total = self.total_alive as f64 + self.total_dead as f64;
        if total == 0.0 {
            0.0
        } else {
            self.total_alive as f64 / total
        }
    }
}

/// Dependent records removed alongside a beneficiary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedRecords {
    #[serde(default)]
    pub seedlings: u64,
    #[serde(default)]
    pub crop_status: u64,
    #[serde(default)]
    pub farm_plots: u64,
}

impl DeletedRecords {
    pub fn total(&self) -> u64 {
        self.seedlings + self.crop_status + self.farm_plots
    }
}

/// Body returned by DELETE endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_records: Option<DeletedRecords>,
}

impl DeleteSummary {
    /// Short description of cascaded removals, if any were reported
    pub fn cascade_note(&self) -> Option<String> {
        let records = self.deleted_records.as_ref().filter(|r| r.total() > 0)?;
        Some(format!(
            "also removed {} seedling record(s), {} crop status record(s), {} farm plot(s)",
            records.seedlings, records.crop_status, records.farm_plots
        ))
    }
}
