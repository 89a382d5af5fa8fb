//! In-memory API for tests and offline development.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use super::traits::DashboardApi;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Beneficiary, BeneficiaryPayload, CropStatusPayload, CropStatusRecord, DeleteSummary,
    DeletedRecords, FarmPlot, FarmPlotPayload, GenerateIdRequest, LoginRequest, LoginResponse,
    SeedlingPayload, SeedlingRecord, Statistics, User,
};

/// Operations the mock can count, fail or delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Login,
    CurrentUser,
    ListBeneficiaries,
    GetBeneficiary,
    GenerateBeneficiaryId,
    CreateBeneficiary,
    UpdateBeneficiary,
    DeleteBeneficiary,
    ListSeedlings,
    CreateSeedling,
    UpdateSeedling,
    DeleteSeedling,
    ListCropStatus,
    CreateCropStatus,
    UpdateCropStatus,
    DeleteCropStatus,
    ListFarmPlots,
    CreateFarmPlot,
    UpdateFarmPlot,
    DeleteFarmPlot,
    Provinces,
    Municipalities,
    Barangays,
    Statistics,
}

#[derive(Default)]
struct MockState {
    credentials: Option<(String, String)>,
    logged_in: Option<User>,
    beneficiaries: Vec<Beneficiary>,
    seedlings: Vec<SeedlingRecord>,
    crop_status: Vec<CropStatusRecord>,
    farm_plots: Vec<FarmPlot>,
    address: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    next_key: u32,
    calls: HashMap<MockOp, u32>,
    failures: HashMap<MockOp, VecDeque<ApiError>>,
    latency: HashMap<(MockOp, String), Duration>,
    last_beneficiary_payload: Option<BeneficiaryPayload>,
    last_crop_payload: Option<CropStatusPayload>,
}

/// Mock dashboard API.
///
/// Holds every collection in memory and mimics the server's observable
/// behavior: generated business keys, cascading beneficiary deletes,
/// computed statistics and 401 on bad credentials.
#[derive(Default)]
pub struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept exactly this username/password pair.
    pub fn with_credentials(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.lock().credentials = Some((username.into(), password.into()));
        self
    }

    pub fn with_beneficiaries(self, beneficiaries: Vec<Beneficiary>) -> Self {
        self.lock().beneficiaries.extend(beneficiaries);
        self
    }

    pub fn with_seedlings(self, records: Vec<SeedlingRecord>) -> Self {
        self.lock().seedlings.extend(records);
        self
    }

    pub fn with_crop_status(self, records: Vec<CropStatusRecord>) -> Self {
        self.lock().crop_status.extend(records);
        self
    }

    pub fn with_farm_plots(self, plots: Vec<FarmPlot>) -> Self {
        self.lock().farm_plots.extend(plots);
        self
    }

    /// Register one municipality and its barangays under a province.
    pub fn with_address(self, province: &str, municipality: &str, barangays: &[&str]) -> Self {
        {
            let mut state = self.lock();
            let entry = state
                .address
                .entry(province.to_string())
                .or_default()
                .entry(municipality.to_string())
                .or_default();
            entry.extend(barangays.iter().map(|b| b.to_string()));
        }
        self
    }

    /// Delay responses of `op` for one parent key (province for
    /// municipalities, municipality for barangays, empty otherwise).
    pub fn with_latency(self, op: MockOp, key: &str, delay: Duration) -> Self {
        self.lock().latency.insert((op, key.to_string()), delay);
        self
    }

    /// Queue an error for the next call of `op`.
    pub fn fail_next(&self, op: MockOp, error: ApiError) {
        self.lock().failures.entry(op).or_default().push_back(error);
    }

    /// Number of times `op` was called.
    pub fn calls(&self, op: MockOp) -> u32 {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn beneficiaries(&self) -> Vec<Beneficiary> {
        self.lock().beneficiaries.clone()
    }

    pub fn seedlings(&self) -> Vec<SeedlingRecord> {
        self.lock().seedlings.clone()
    }

    pub fn crop_status(&self) -> Vec<CropStatusRecord> {
        self.lock().crop_status.clone()
    }

    pub fn farm_plots(&self) -> Vec<FarmPlot> {
        self.lock().farm_plots.clone()
    }

    pub fn last_beneficiary_payload(&self) -> Option<BeneficiaryPayload> {
        self.lock().last_beneficiary_payload.clone()
    }

    pub fn last_crop_payload(&self) -> Option<CropStatusPayload> {
        self.lock().last_crop_payload.clone()
    }

    // ==================== Helper Methods ====================

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call, then surface a queued failure if there is one.
    fn begin(&self, op: MockOp) -> ApiResult<()> {
        let mut state = self.lock();
        *state.calls.entry(op).or_insert(0) += 1;
        if let Some(error) = state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            debug!(?op, status = error.status, "Injected failure");
            return Err(error);
        }
        Ok(())
    }

    async fn delay(&self, op: MockOp, key: &str) {
        let delay = self.lock().latency.get(&(op, key.to_string())).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn require_beneficiary(state: &MockState, beneficiary_id: &str) -> ApiResult<()> {
        if state.beneficiaries.iter().any(|b| b.beneficiary_id == beneficiary_id) {
            Ok(())
        } else {
            Err(ApiError::new(404, "Beneficiary not found"))
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn upload_path(file_name: &str) -> String {
    format!("/uploads/{}", file_name)
}

fn deleted(message: &str) -> DeleteSummary {
    DeleteSummary {
        message: Some(message.to_string()),
        deleted_records: None,
    }
}

fn beneficiary_from(id: String, payload: &BeneficiaryPayload, picture: Option<String>) -> Beneficiary {
    Beneficiary {
        id,
        beneficiary_id: payload.beneficiary_id.clone(),
        first_name: payload.first_name.clone(),
        middle_name: payload.middle_name.clone(),
        last_name: payload.last_name.clone(),
        purok: payload.purok.clone(),
        barangay: payload.barangay.clone(),
        municipality: payload.municipality.clone(),
        province: payload.province.clone(),
        gender: Some(payload.gender),
        birth_date: Some(payload.birth_date),
        marital_status: Some(payload.marital_status),
        cellphone: payload.cellphone.clone(),
        picture,
    }
}

fn seedling_from(id: String, payload: &SeedlingPayload) -> SeedlingRecord {
    SeedlingRecord {
        id,
        beneficiary_id: payload.beneficiary_id.clone(),
        received: payload.received,
        planted: payload.planted,
        hectares: payload.hectares,
        plot: payload.plot.clone(),
        date_of_planting_start: Some(payload.date_of_planting_start),
        date_of_planting_end: payload.date_of_planting_end,
        date_received: payload.date_received,
    }
}

fn crop_status_from(id: String, payload: &CropStatusPayload) -> CropStatusRecord {
    let mut pictures = payload.existing_pictures.clone();
    pictures.extend(payload.pictures.iter().map(|p| upload_path(&p.file_name)));
    CropStatusRecord {
        id,
        beneficiary_id: payload.beneficiary_id.clone(),
        survey_date: Some(payload.survey_date),
        surveyer: payload.surveyer.clone(),
        alive_crops: payload.alive_crops,
        dead_crops: payload.dead_crops,
        plot: payload.plot.clone(),
        pictures,
    }
}

fn farm_plot_from(id: String, payload: &FarmPlotPayload) -> FarmPlot {
    FarmPlot {
        id,
        beneficiary_id: payload.beneficiary_id.clone(),
        coordinates: payload.coordinates.clone(),
        color: payload.color.clone(),
    }
}

#[async_trait]
impl DashboardApi for MockApi {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        self.begin(MockOp::Login)?;
        let mut state = self.lock();
        let accepted = state
            .credentials
            .as_ref()
            .is_some_and(|(u, p)| *u == request.username && *p == request.password);
        if !accepted {
            return Err(ApiError::new(401, "Invalid credentials"));
        }
        let user = User {
            id: new_id(),
            username: request.username.clone(),
            role: Some("admin".to_string()),
            name: None,
        };
        state.logged_in = Some(user.clone());
        Ok(LoginResponse {
            token: Uuid::new_v4().to_string(),
            user,
        })
    }

    async fn current_user(&self) -> ApiResult<User> {
        self.begin(MockOp::CurrentUser)?;
        self.lock()
            .logged_in
            .clone()
            .ok_or_else(|| ApiError::new(401, "Not authenticated"))
    }

    async fn list_beneficiaries(&self) -> ApiResult<Vec<Beneficiary>> {
        self.begin(MockOp::ListBeneficiaries)?;
        self.delay(MockOp::ListBeneficiaries, "").await;
        Ok(self.beneficiaries())
    }

    async fn get_beneficiary(&self, id: &str) -> ApiResult<Beneficiary> {
        self.begin(MockOp::GetBeneficiary)?;
        self.lock()
            .beneficiaries
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| ApiError::new(404, "Beneficiary not found"))
    }

    async fn generate_beneficiary_id(&self, _request: &GenerateIdRequest) -> ApiResult<String> {
        self.begin(MockOp::GenerateBeneficiaryId)?;
        let mut state = self.lock();
        loop {
            state.next_key += 1;
            let key = format!("BEN-{:04}", state.next_key);
            if !state.beneficiaries.iter().any(|b| b.beneficiary_id == key) {
                return Ok(key);
            }
        }
    }

    async fn create_beneficiary(&self, payload: &BeneficiaryPayload) -> ApiResult<Beneficiary> {
        self.begin(MockOp::CreateBeneficiary)?;
        let mut state = self.lock();
        state.last_beneficiary_payload = Some(payload.clone());
        if payload.beneficiary_id.trim().is_empty() {
            return Err(ApiError::new(400, "Beneficiary ID is required"));
        }
        if state
            .beneficiaries
            .iter()
            .any(|b| b.beneficiary_id == payload.beneficiary_id)
        {
            return Err(ApiError::new(400, "Beneficiary ID already exists"));
        }
        let picture = payload.picture.as_ref().map(|p| upload_path(&p.file_name));
        let created = beneficiary_from(new_id(), payload, picture);
        state.beneficiaries.push(created.clone());
        Ok(created)
    }

    async fn update_beneficiary(&self, id: &str, payload: &BeneficiaryPayload) -> ApiResult<Beneficiary> {
        self.begin(MockOp::UpdateBeneficiary)?;
        let mut state = self.lock();
        state.last_beneficiary_payload = Some(payload.clone());
        let existing = state
            .beneficiaries
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| ApiError::new(404, "Beneficiary not found"))?;
        let picture = match &payload.picture {
            Some(p) => Some(upload_path(&p.file_name)),
            None => existing.picture.clone(),
        };
        *existing = beneficiary_from(id.to_string(), payload, picture);
        Ok(existing.clone())
    }

    async fn delete_beneficiary(&self, id: &str) -> ApiResult<DeleteSummary> {
        self.begin(MockOp::DeleteBeneficiary)?;
        let mut state = self.lock();
        let index = state
            .beneficiaries
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| ApiError::new(404, "Beneficiary not found"))?;
        let removed = state.beneficiaries.remove(index);
        let key = removed.beneficiary_id;

        let before = (state.seedlings.len(), state.crop_status.len(), state.farm_plots.len());
        state.seedlings.retain(|r| r.beneficiary_id != key);
        state.crop_status.retain(|r| r.beneficiary_id != key);
        state.farm_plots.retain(|r| r.beneficiary_id != key);

        Ok(DeleteSummary {
            message: Some("Beneficiary deleted successfully".to_string()),
            deleted_records: Some(DeletedRecords {
                seedlings: (before.0 - state.seedlings.len()) as u64,
                crop_status: (before.1 - state.crop_status.len()) as u64,
                farm_plots: (before.2 - state.farm_plots.len()) as u64,
            }),
        })
    }

    async fn list_seedlings(&self) -> ApiResult<Vec<SeedlingRecord>> {
        self.begin(MockOp::ListSeedlings)?;
        self.delay(MockOp::ListSeedlings, "").await;
        Ok(self.seedlings())
    }

    async fn create_seedling(&self, payload: &SeedlingPayload) -> ApiResult<SeedlingRecord> {
        self.begin(MockOp::CreateSeedling)?;
        let mut state = self.lock();
        Self::require_beneficiary(&state, &payload.beneficiary_id)?;
        let created = seedling_from(new_id(), payload);
        state.seedlings.push(created.clone());
        Ok(created)
    }

    async fn update_seedling(&self, id: &str, payload: &SeedlingPayload) -> ApiResult<SeedlingRecord> {
        self.begin(MockOp::UpdateSeedling)?;
        let mut state = self.lock();
        let existing = state
            .seedlings
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiError::new(404, "Seedling record not found"))?;
        *existing = seedling_from(id.to_string(), payload);
        Ok(existing.clone())
    }

    async fn delete_seedling(&self, id: &str) -> ApiResult<DeleteSummary> {
        self.begin(MockOp::DeleteSeedling)?;
        let mut state = self.lock();
        let before = state.seedlings.len();
        state.seedlings.retain(|r| r.id != id);
        if state.seedlings.len() == before {
            return Err(ApiError::new(404, "Seedling record not found"));
        }
        Ok(deleted("Seedling record deleted successfully"))
    }

    async fn list_crop_status(&self) -> ApiResult<Vec<CropStatusRecord>> {
        self.begin(MockOp::ListCropStatus)?;
        self.delay(MockOp::ListCropStatus, "").await;
        Ok(self.crop_status())
    }

    async fn create_crop_status(&self, payload: &CropStatusPayload) -> ApiResult<CropStatusRecord> {
        self.begin(MockOp::CreateCropStatus)?;
        let mut state = self.lock();
        state.last_crop_payload = Some(payload.clone());
        Self::require_beneficiary(&state, &payload.beneficiary_id)?;
        let created = crop_status_from(new_id(), payload);
        state.crop_status.push(created.clone());
        Ok(created)
    }

    async fn update_crop_status(
        &self,
        id: &str,
        payload: &CropStatusPayload,
    ) -> ApiResult<CropStatusRecord> {
        self.begin(MockOp::UpdateCropStatus)?;
        let mut state = self.lock();
        state.last_crop_payload = Some(payload.clone());
        let existing = state
            .crop_status
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiError::new(404, "Crop status record not found"))?;
        *existing = crop_status_from(id.to_string(), payload);
        Ok(existing.clone())
    }

    async fn delete_crop_status(&self, id: &str) -> ApiResult<DeleteSummary> {
        self.begin(MockOp::DeleteCropStatus)?;
        let mut state = self.lock();
        let before = state.crop_status.len();
        state.crop_status.retain(|r| r.id != id);
        if state.crop_status.len() == before {
            return Err(ApiError::new(404, "Crop status record not found"));
        }
        Ok(deleted("Crop status record deleted successfully"))
    }

    async fn list_farm_plots(&self) -> ApiResult<Vec<FarmPlot>> {
        self.begin(MockOp::ListFarmPlots)?;
        self.delay(MockOp::ListFarmPlots, "").await;
        Ok(self.farm_plots())
    }

    async fn create_farm_plot(&self, payload: &FarmPlotPayload) -> ApiResult<FarmPlot> {
        self.begin(MockOp::CreateFarmPlot)?;
        let mut state = self.lock();
        Self::require_beneficiary(&state, &payload.beneficiary_id)?;
        let created = farm_plot_from(new_id(), payload);
        state.farm_plots.push(created.clone());
        Ok(created)
    }

    async fn update_farm_plot(&self, id: &str, payload: &FarmPlotPayload) -> ApiResult<FarmPlot> {
        self.begin(MockOp::UpdateFarmPlot)?;
        let mut state = self.lock();
        let existing = state
            .farm_plots
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ApiError::new(404, "Farm plot not found"))?;
        *existing = farm_plot_from(id.to_string(), payload);
        Ok(existing.clone())
    }

    async fn delete_farm_plot(&self, id: &str) -> ApiResult<DeleteSummary> {
        self.begin(MockOp::DeleteFarmPlot)?;
        let mut state = self.lock();
        let before = state.farm_plots.len();
        state.farm_plots.retain(|r| r.id != id);
        if state.farm_plots.len() == before {
            return Err(ApiError::new(404, "Farm plot not found"));
        }
        Ok(deleted("Farm plot deleted successfully"))
    }

    async fn provinces(&self) -> ApiResult<Vec<String>> {
        self.begin(MockOp::Provinces)?;
        self.delay(MockOp::Provinces, "").await;
        Ok(self.lock().address.keys().cloned().collect())
    }

    async fn municipalities(&self, province: &str) -> ApiResult<Vec<String>> {
        self.begin(MockOp::Municipalities)?;
        self.delay(MockOp::Municipalities, province).await;
        Ok(self
            .lock()
            .address
            .get(province)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn barangays(&self, province: &str, municipality: &str) -> ApiResult<Vec<String>> {
        self.begin(MockOp::Barangays)?;
        self.delay(MockOp::Barangays, municipality).await;
        Ok(self
            .lock()
            .address
            .get(province)
            .and_then(|m| m.get(municipality))
            .cloned()
            .unwrap_or_default())
    }

    async fn statistics(&self) -> ApiResult<Statistics> {
        self.begin(MockOp::Statistics)?;
        let state = self.lock();
        Ok(Statistics {
            total_beneficiaries: state.beneficiaries.len() as u64,
            total_seeds_distributed: state.seedlings.iter().map(|r| u64::from(r.received)).sum(),
            total_alive: state.crop_status.iter().map(|r| u64::from(r.alive_crops)).sum(),
            total_dead: state.crop_status.iter().map(|r| u64::from(r.dead_crops)).sum(),
        })
    }
}
