//! Per-entity list bindings: fetch, delete, sortable columns and search text

use async_trait::async_trait;

use super::sort::SortValue;
use crate::api::DashboardApi;
use crate::error::ApiResult;
use crate::lookup::BeneficiaryIndex;
use crate::models::{Beneficiary, CropStatusRecord, DeleteSummary, FarmPlot, SeedlingRecord};

/// A collection shown in a list screen
#[async_trait]
pub trait ListResource: Clone + Send + Sync + 'static {
    /// Lowercase singular, used in messages
    const LABEL: &'static str;
    /// Capitalized singular, used at the start of notices
    const TITLE: &'static str;
    /// Whether rows show beneficiary names and need that list loaded too
    const JOINS_BENEFICIARIES: bool;
    /// Column keys accepted by `sort`
    const SORT_KEYS: &'static [&'static str];

    fn storage_id(&self) -> &str;

    fn sort_value(&self, key: &str, index: &BeneficiaryIndex) -> Option<SortValue>;

    /// Text columns matched by the search box
    fn search_text(&self, index: &BeneficiaryIndex) -> Vec<String>;

    /// Lookup set derived from the rows themselves
    fn index_from(_rows: &[Self]) -> Option<BeneficiaryIndex> {
        None
    }

    async fn fetch_all(api: &dyn DashboardApi) -> ApiResult<Vec<Self>>;

    async fn delete(api: &dyn DashboardApi, id: &str) -> ApiResult<DeleteSummary>;
}

fn joined_name(index: &BeneficiaryIndex, beneficiary_id: &str) -> SortValue {
    SortValue::Text(index.display(beneficiary_id).name)
}

#[async_trait]
impl ListResource for Beneficiary {
    const LABEL: &'static str = "beneficiary";
    const TITLE: &'static str = "Beneficiary";
    const JOINS_BENEFICIARIES: bool = false;
    const SORT_KEYS: &'static [&'static str] = &[
        "beneficiaryId",
        "name",
        "firstName",
        "lastName",
        "address",
        "province",
        "municipality",
        "barangay",
        "gender",
        "birthDate",
        "age",
        "maritalStatus",
        "cellphone",
    ];

    fn storage_id(&self) -> &str {
        &self.id
    }

    fn sort_value(&self, key: &str, _index: &BeneficiaryIndex) -> Option<SortValue> {
        let value = match key {
            "beneficiaryId" => SortValue::text(&self.beneficiary_id),
            "name" => SortValue::text(self.full_name()),
            "firstName" => SortValue::text(&self.first_name),
            "lastName" => SortValue::text(&self.last_name),
            "address" => SortValue::text(self.address_line()),
            "province" => SortValue::text(&self.province),
            "municipality" => SortValue::text(&self.municipality),
            "barangay" => SortValue::text(&self.barangay),
            "gender" => SortValue::text(self.gender.map(|g| g.as_str()).unwrap_or_default()),
            "birthDate" => SortValue::Date(self.birth_date),
            "age" => SortValue::number(&self.age().map(|a| a.to_string()).unwrap_or_default()),
            "maritalStatus" => {
                SortValue::text(self.marital_status.map(|m| m.as_str()).unwrap_or_default())
            }
            "cellphone" => SortValue::text(&self.cellphone),
            _ => return None,
        };
        Some(value)
    }

    fn search_text(&self, _index: &BeneficiaryIndex) -> Vec<String> {
        vec![
            self.beneficiary_id.clone(),
            self.full_name(),
            self.address_line(),
            self.cellphone.clone(),
        ]
    }

    fn index_from(rows: &[Self]) -> Option<BeneficiaryIndex> {
        Some(BeneficiaryIndex::new(rows.to_vec()))
    }

    async fn fetch_all(api: &dyn DashboardApi) -> ApiResult<Vec<Self>> {
        api.list_beneficiaries().await
    }

    async fn delete(api: &dyn DashboardApi, id: &str) -> ApiResult<DeleteSummary> {
        api.delete_beneficiary(id).await
    }
}

#[async_trait]
impl ListResource for SeedlingRecord {
    const LABEL: &'static str = "seedling record";
    const TITLE: &'static str = "Seedling record";
    const JOINS_BENEFICIARIES: bool = true;
    const SORT_KEYS: &'static [&'static str] = &[
        "beneficiaryId",
        "beneficiaryName",
        "received",
        "planted",
        "hectares",
        "plot",
        "dateOfPlantingStart",
        "dateOfPlantingEnd",
        "dateReceived",
    ];

    fn storage_id(&self) -> &str {
        &self.id
    }

    fn sort_value(&self, key: &str, index: &BeneficiaryIndex) -> Option<SortValue> {
        let value = match key {
            "beneficiaryId" => SortValue::text(&self.beneficiary_id),
            "beneficiaryName" => joined_name(index, &self.beneficiary_id),
            "received" => SortValue::Number(i64::from(self.received)),
            "planted" => SortValue::Number(i64::from(self.planted)),
            "hectares" => SortValue::Decimal(self.hectares),
            "plot" => SortValue::text(&self.plot),
            "dateOfPlantingStart" => SortValue::Date(self.date_of_planting_start),
            "dateOfPlantingEnd" => SortValue::Date(self.date_of_planting_end),
            "dateReceived" => SortValue::Date(self.date_received),
            _ => return None,
        };
        Some(value)
    }

    fn search_text(&self, index: &BeneficiaryIndex) -> Vec<String> {
        vec![
            self.beneficiary_id.clone(),
            index.display(&self.beneficiary_id).name,
            self.plot.clone(),
        ]
    }

    async fn fetch_all(api: &dyn DashboardApi) -> ApiResult<Vec<Self>> {
        api.list_seedlings().await
    }

    async fn delete(api: &dyn DashboardApi, id: &str) -> ApiResult<DeleteSummary> {
        api.delete_seedling(id).await
    }
}

#[async_trait]
impl ListResource for CropStatusRecord {
    const LABEL: &'static str = "crop status record";
    const TITLE: &'static str = "Crop status record";
    const JOINS_BENEFICIARIES: bool = true;
    const SORT_KEYS: &'static [&'static str] = &[
        "beneficiaryId",
        "beneficiaryName",
        "surveyDate",
        "surveyer",
        "aliveCrops",
        "deadCrops",
        "plot",
    ];

    fn storage_id(&self) -> &str {
        &self.id
    }

    fn sort_value(&self, key: &str, index: &BeneficiaryIndex) -> Option<SortValue> {
        let value = match key {
            "beneficiaryId" => SortValue::text(&self.beneficiary_id),
            "beneficiaryName" => joined_name(index, &self.beneficiary_id),
            "surveyDate" => SortValue::Date(self.survey_date),
            "surveyer" => SortValue::text(&self.surveyer),
            "aliveCrops" => SortValue::Number(i64::from(self.alive_crops)),
            "deadCrops" => SortValue::Number(i64::from(self.dead_crops)),
            "plot" => SortValue::text(self.plot.clone().unwrap_or_default()),
            _ => return None,
        };
        Some(value)
    }

    fn search_text(&self, index: &BeneficiaryIndex) -> Vec<String> {
        vec![
            self.beneficiary_id.clone(),
            index.display(&self.beneficiary_id).name,
            self.surveyer.clone(),
            self.plot.clone().unwrap_or_default(),
        ]
    }

    async fn fetch_all(api: &dyn DashboardApi) -> ApiResult<Vec<Self>> {
        api.list_crop_status().await
    }

    async fn delete(api: &dyn DashboardApi, id: &str) -> ApiResult<DeleteSummary> {
        api.delete_crop_status(id).await
    }
}

#[async_trait]
impl ListResource for FarmPlot {
    const LABEL: &'static str = "farm plot";
    const TITLE: &'static str = "Farm plot";
    const JOINS_BENEFICIARIES: bool = true;
    const SORT_KEYS: &'static [&'static str] = &["beneficiaryId", "beneficiaryName", "color", "points"];

    fn storage_id(&self) -> &str {
        &self.id
    }

    fn sort_value(&self, key: &str, index: &BeneficiaryIndex) -> Option<SortValue> {
        let value = match key {
            "beneficiaryId" => SortValue::text(&self.beneficiary_id),
            "beneficiaryName" => joined_name(index, &self.beneficiary_id),
            "color" => SortValue::text(&self.color),
            "points" => SortValue::Number(self.coordinates.len() as i64),
            _ => return None,
        };
        Some(value)
    }

    fn search_text(&self, index: &BeneficiaryIndex) -> Vec<String> {
        vec![
            self.beneficiary_id.clone(),
            index.display(&self.beneficiary_id).name,
        ]
    }

    async fn fetch_all(api: &dyn DashboardApi) -> ApiResult<Vec<Self>> {
        api.list_farm_plots().await
    }

    async fn delete(api: &dyn DashboardApi, id: &str) -> ApiResult<DeleteSummary> {
        api.delete_farm_plot(id).await
    }
}
