//! Core trait for the monitoring backend.

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::models::{
    Beneficiary, BeneficiaryPayload, CropStatusPayload, CropStatusRecord, DeleteSummary, FarmPlot,
    FarmPlotPayload, GenerateIdRequest, LoginRequest, LoginResponse, SeedlingPayload,
    SeedlingRecord, Statistics, User,
};

/// Every network call the dashboard makes.
///
/// Implementations attach credentials themselves; callers never touch the
/// token directly.
#[async_trait]
pub trait DashboardApi: Send + Sync {
    // ==================== Auth ====================

    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse>;

    async fn current_user(&self) -> ApiResult<User>;

    // ==================== Beneficiaries ====================

    async fn list_beneficiaries(&self) -> ApiResult<Vec<Beneficiary>>;

    async fn get_beneficiary(&self, id: &str) -> ApiResult<Beneficiary>;

    /// Ask the server to derive a business key from the name
    async fn generate_beneficiary_id(&self, request: &GenerateIdRequest) -> ApiResult<String>;

    async fn create_beneficiary(&self, payload: &BeneficiaryPayload) -> ApiResult<Beneficiary>;

    async fn update_beneficiary(&self, id: &str, payload: &BeneficiaryPayload) -> ApiResult<Beneficiary>;

    /// Dependent seedling/crop/plot records are removed server-side
    async fn delete_beneficiary(&self, id: &str) -> ApiResult<DeleteSummary>;

    // ==================== Seedlings ====================

    async fn list_seedlings(&self) -> ApiResult<Vec<SeedlingRecord>>;

    async fn create_seedling(&self, payload: &SeedlingPayload) -> ApiResult<SeedlingRecord>;

    async fn update_seedling(&self, id: &str, payload: &SeedlingPayload) -> ApiResult<SeedlingRecord>;

    async fn delete_seedling(&self, id: &str) -> ApiResult<DeleteSummary>;

    // ==================== Crop status ====================

    async fn list_crop_status(&self) -> ApiResult<Vec<CropStatusRecord>>;

    async fn create_crop_status(&self, payload: &CropStatusPayload) -> ApiResult<CropStatusRecord>;

    async fn update_crop_status(
        &self,
        id: &str,
        payload: &CropStatusPayload,
    ) -> ApiResult<CropStatusRecord>;

    async fn delete_crop_status(&self, id: &str) -> ApiResult<DeleteSummary>;

    // ==================== Farm plots ====================

    async fn list_farm_plots(&self) -> ApiResult<Vec<FarmPlot>>;

    async fn create_farm_plot(&self, payload: &FarmPlotPayload) -> ApiResult<FarmPlot>;

    async fn update_farm_plot(&self, id: &str, payload: &FarmPlotPayload) -> ApiResult<FarmPlot>;

    async fn delete_farm_plot(&self, id: &str) -> ApiResult<DeleteSummary>;

    // ==================== Addresses ====================

    async fn provinces(&self) -> ApiResult<Vec<String>>;

    async fn municipalities(&self, province: &str) -> ApiResult<Vec<String>>;

    async fn barangays(&self, province: &str, municipality: &str) -> ApiResult<Vec<String>>;

    // ==================== Statistics ====================

    async fn statistics(&self) -> ApiResult<Statistics>;
}
