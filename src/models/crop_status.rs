//! Crop survival survey records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::attachment::Attachment;
use super::dates;

/// Upper bound on pictures attached to one survey
pub const MAX_CROP_PICTURES: usize = 10;

/// Survey outcome for one beneficiary on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropStatusRecord {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: String,
    pub beneficiary_id: String,
    #[serde(default, with = "dates::option_date")]
    pub survey_date: Option<NaiveDate>,
    #[serde(default)]
    pub surveyer: String,
    #[serde(default)]
    pub alive_crops: u32,
    #[serde(default)]
    pub dead_crops: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    /// Stored picture filenames
    #[serde(default)]
    pub pictures: Vec<String>,
}

impl CropStatusRecord {
    /// Fraction of surveyed crops still alive, `0.0` when nothing was counted
    pub fn survival_rate(&self) -> f64 {
        let total = u64::from(self.alive_crops) + u64::from(self.dead_crops);
        if total == 0 {
            0.0
        } else {
            f64::from(self.alive_crops) / total as f64
        }
    }
}

/// Multipart payload for crop status create/update
///
/// `existing_pictures` are filenames the server already stores and should
/// keep; `pictures` are new uploads. The two are never mixed.
#[derive(Debug, Clone, PartialEq)]
pub struct CropStatusPayload {
    pub beneficiary_id: String,
    pub survey_date: NaiveDate,
    pub surveyer: String,
    pub alive_crops: u32,
    pub dead_crops: u32,
    pub plot: Option<String>,
    pub existing_pictures: Vec<String>,
    pub pictures: Vec<Attachment>,
}

impl CropStatusPayload {
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("beneficiaryId", self.beneficiary_id.clone()),
            ("surveyDate", dates::format_date(self.survey_date)),
            ("surveyer", self.surveyer.clone()),
            ("aliveCrops", self.alive_crops.to_string()),
            ("deadCrops", self.dead_crops.to_string()),
        ];
        if let Some(plot) = &self.plot {
            fields.push(("plot", plot.clone()));
        }
        fields
    }

    pub fn picture_count(&self) -> usize {
        self.existing_pictures.len() + self.pictures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survival_rate() {
        let record: CropStatusRecord = serde_json::from_str(
            r#"{"beneficiaryId":"BEN-1","aliveCrops":75,"deadCrops":25,"surveyDate":"2024-05-01"}"#,
        )
        .unwrap();
        assert!((record.survival_rate() - 0.75).abs() < f64::EPSILON);
        assert!(record.pictures.is_empty());

        let empty: CropStatusRecord =
            serde_json::from_str(r#"{"beneficiaryId":"BEN-1"}"#).unwrap();
        assert_eq!(empty.survival_rate(), 0.0);
    }

    #[test]
    fn test_survival_rate_with_counts_near_u32_max() {
        let record = CropStatusRecord {
            id: "c1".into(),
            beneficiary_id: "BEN-1".into(),
            survey_date: None,
            surveyer: String::new(),
            alive_crops: u32::MAX,
            dead_crops: u32::MAX,
            plot: None,
            pictures: vec![],
        };
        assert!((record.survival_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_text_fields_omit_missing_plot() {
        let payload = CropStatusPayload {
            beneficiary_id: "BEN-1".into(),
            survey_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            surveyer: "Pedro".into(),
            alive_crops: 10,
            dead_crops: 0,
            plot: None,
            existing_pictures: vec![],
            pictures: vec![],
        };
        let names: Vec<_> = payload.text_fields().into_iter().map(|(k, _)| k).collect();
        assert!(!names.contains(&"plot"));
        assert!(names.contains(&"deadCrops"));
    }
}
