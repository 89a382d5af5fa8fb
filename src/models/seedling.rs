//! Seedling distribution records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::dates;

/// One distribution/planting event for a beneficiary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedlingRecord {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    /// Weak reference to a beneficiary business key
    pub beneficiary_id: String,
    #[serde(default)]
    pub received: u32,
    #[serde(default)]
    pub planted: u32,
    #[serde(default)]
    pub hectares: f64,
    #[serde(default)]
    pub plot: String,
    #[serde(default, with = "dates::option_date")]
    pub date_of_planting_start: Option<NaiveDate>,
    #[serde(default, with = "dates::option_date")]
    pub date_of_planting_end: Option<NaiveDate>,
    #[serde(default, with = "dates::option_date")]
    pub date_received: Option<NaiveDate>,
}

impl SeedlingRecord {
    /// Seedlings received but not (yet) planted
    pub fn unplanted(&self) -> u32 {
        self.received.saturating_sub(self.planted)
    }
}

/// JSON body for `POST /seedlings` and `PUT /seedlings/{id}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedlingPayload {
    pub beneficiary_id: String,
    pub received: u32,
    pub planted: u32,
    pub hectares: f64,
    pub plot: String,
    pub date_of_planting_start: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_planting_end: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_received: Option<NaiveDate>,
}
