//! reqwest-backed client for the monitoring REST API

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::DashboardApi;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Attachment, Beneficiary, BeneficiaryPayload, CropStatusPayload, CropStatusRecord,
    DeleteSummary, FarmPlot, FarmPlotPayload, GenerateIdRequest, LoginRequest, LoginResponse,
    SeedlingPayload, SeedlingRecord, Statistics, User,
};
use crate::session::SessionStore;

/// Client configuration
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Base URL including the API prefix (e.g. "http://localhost:5000/api")
    pub base_url: String,
    /// Request timeout in milliseconds (default: 30000)
    pub timeout_ms: u64,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            timeout_ms: 30_000,
        }
    }
}

/// Some endpoints wrap their result in `{ "data": ... }`, others do not
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Envelope::Wrapped { data } => data,
            Envelope::Bare(value) => value,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedId {
    beneficiary_id: String,
}

/// HTTP client for the monitoring API
///
/// Reads the bearer token from the session store on every request and
/// clears the session when the server answers 401.
pub struct HttpApi {
    client: Client,
    config: HttpApiConfig,
    session: Arc<dyn SessionStore>,
}

impl HttpApi {
    pub fn new(config: HttpApiConfig, session: Arc<dyn SessionStore>) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ApiError::no_response(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // ==================== Helper Methods ====================

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%url, "GET");
        self.client.get(url)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%url, "POST");
        self.client.post(url)
    }

    fn put(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%url, "PUT");
        self.client.put(url)
    }

    fn delete(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!(%url, "DELETE");
        self.client.delete(url)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<String> {
        let request = match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Request failed without a response");
            ApiError::from(e)
        })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Server returned 401, clearing session");
            self.session.clear_session();
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = ApiError::from_body(status.as_u16(), &body);
            debug!(status = status.as_u16(), message = %error.message, "API error");
            return Err(error);
        }

        response.text().await.map_err(ApiError::from)
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApiResult<T> {
        let body = self.send(request).await?;
        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        Ok(envelope.into_inner())
    }

    /// DELETE endpoints may answer with an empty body
    async fn execute_delete(&self, request: RequestBuilder) -> ApiResult<DeleteSummary> {
        let body = self.send(request).await?;
        if body.trim().is_empty() {
            return Ok(DeleteSummary::default());
        }
        match serde_json::from_str::<Envelope<DeleteSummary>>(&body) {
            Ok(envelope) => Ok(envelope.into_inner()),
            Err(e) => {
                debug!(error = %e, "Unrecognized delete response body, treating as plain success");
                Ok(DeleteSummary::default())
            }
        }
    }
}

fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

fn file_part(attachment: &Attachment) -> ApiResult<Part> {
    Part::bytes(attachment.bytes.clone())
        .file_name(attachment.file_name.clone())
        .mime_str(&attachment.content_type)
        .map_err(ApiError::from)
}

fn beneficiary_form(payload: &BeneficiaryPayload) -> ApiResult<Form> {
    let mut form = Form::new();
    for (name, value) in payload.text_fields() {
        form = form.text(name, value);
    }
    if let Some(picture) = &payload.picture {
        form = form.part("picture", file_part(picture)?);
    }
    Ok(form)
}

fn crop_status_form(payload: &CropStatusPayload, include_existing: bool) -> ApiResult<Form> {
    let mut form = Form::new();
    for (name, value) in payload.text_fields() {
        form = form.text(name, value);
    }
    if include_existing {
        form = form.text(
            "existingPictures",
            serde_json::to_string(&payload.existing_pictures)?,
        );
    }
    for picture in &payload.pictures {
        form = form.part("pictures", file_part(picture)?);
    }
    Ok(form)
}

#[async_trait]
impl DashboardApi for HttpApi {
    async fn login(&self, request: &LoginRequest) -> ApiResult<LoginResponse> {
        self.execute(self.post("/auth/login").json(request)).await
    }

    async fn current_user(&self) -> ApiResult<User> {
        self.execute(self.get("/auth/me")).await
    }

    async fn list_beneficiaries(&self) -> ApiResult<Vec<Beneficiary>> {
        self.execute(self.get("/beneficiaries")).await
    }

    async fn get_beneficiary(&self, id: &str) -> ApiResult<Beneficiary> {
        self.execute(self.get(&format!("/beneficiaries/{}", segment(id))))
            .await
    }

    async fn generate_beneficiary_id(&self, request: &GenerateIdRequest) -> ApiResult<String> {
        let generated: GeneratedId = self
            .execute(self.post("/beneficiaries/generate-id").json(request))
            .await?;
        Ok(generated.beneficiary_id)
    }

    async fn create_beneficiary(&self, payload: &BeneficiaryPayload) -> ApiResult<Beneficiary> {
        let form = beneficiary_form(payload)?;
        self.execute(self.post("/beneficiaries").multipart(form)).await
    }

    async fn update_beneficiary(&self, id: &str, payload: &BeneficiaryPayload) -> ApiResult<Beneficiary> {
        let form = beneficiary_form(payload)?;
        self.execute(self.put(&format!("/beneficiaries/{}", segment(id))).multipart(form))
            .await
    }

    async fn delete_beneficiary(&self, id: &str) -> ApiResult<DeleteSummary> {
        self.execute_delete(self.delete(&format!("/beneficiaries/{}", segment(id))))
            .await
    }

    async fn list_seedlings(&self) -> ApiResult<Vec<SeedlingRecord>> {
        self.execute(self.get("/seedlings")).await
    }

    async fn create_seedling(&self, payload: &SeedlingPayload) -> ApiResult<SeedlingRecord> {
        self.execute(self.post("/seedlings").json(payload)).await
    }

    async fn update_seedling(&self, id: &str, payload: &SeedlingPayload) -> ApiResult<SeedlingRecord> {
        self.execute(self.put(&format!("/seedlings/{}", segment(id))).json(payload))
            .await
    }

    async fn delete_seedling(&self, id: &str) -> ApiResult<DeleteSummary> {
        self.execute_delete(self.delete(&format!("/seedlings/{}", segment(id))))
            .await
    }

    async fn list_crop_status(&self) -> ApiResult<Vec<CropStatusRecord>> {
        self.execute(self.get("/crop-status")).await
    }

    async fn create_crop_status(&self, payload: &CropStatusPayload) -> ApiResult<CropStatusRecord> {
        let form = crop_status_form(payload, false)?;
        self.execute(self.post("/crop-status").multipart(form)).await
    }

    async fn update_crop_status(
        &self,
        id: &str,
        payload: &CropStatusPayload,
    ) -> ApiResult<CropStatusRecord> {
        let form = crop_status_form(payload, true)?;
        self.execute(self.put(&format!("/crop-status/{}", segment(id))).multipart(form))
            .await
    }

    async fn delete_crop_status(&self, id: &str) -> ApiResult<DeleteSummary> {
        self.execute_delete(self.delete(&format!("/crop-status/{}", segment(id))))
            .await
    }

    async fn list_farm_plots(&self) -> ApiResult<Vec<FarmPlot>> {
        self.execute(self.get("/farm-plots")).await
    }

    async fn create_farm_plot(&self, payload: &FarmPlotPayload) -> ApiResult<FarmPlot> {
        self.execute(self.post("/farm-plots").json(payload)).await
    }

    async fn update_farm_plot(&self, id: &str, payload: &FarmPlotPayload) -> ApiResult<FarmPlot> {
        self.execute(self.put(&format!("/farm-plots/{}", segment(id))).json(payload))
            .await
    }

    async fn delete_farm_plot(&self, id: &str) -> ApiResult<DeleteSummary> {
        self.execute_delete(self.delete(&format!("/farm-plots/{}", segment(id))))
            .await
    }

    async fn provinces(&self) -> ApiResult<Vec<String>> {
        self.execute(self.get("/addresses/provinces")).await
    }

    async fn municipalities(&self, province: &str) -> ApiResult<Vec<String>> {
        self.execute(self.get(&format!("/addresses/municipalities/{}", segment(province))))
            .await
    }

    async fn barangays(&self, province: &str, municipality: &str) -> ApiResult<Vec<String>> {
        self.execute(self.get(&format!(
            "/addresses/barangays/{}/{}",
            segment(province),
            segment(municipality)
        )))
        .await
    }

    async fn statistics(&self) -> ApiResult<Statistics> {
        self.execute(self.get("/statistics")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemorySessionStore;

    fn api(base_url: &str) -> HttpApi {
        HttpApi::new(
            HttpApiConfig {
                base_url: base_url.to_string(),
                ..Default::default()
            },
            Arc::new(MemorySessionStore::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_url_joining() {
        let api = api("http://localhost:5000/api/");
        assert_eq!(api.url("/seedlings"), "http://localhost:5000/api/seedlings");
        assert_eq!(segment("Misamis Oriental"), "Misamis%20Oriental");
    }

    #[test]
    fn test_envelope_accepts_both_shapes() {
        let wrapped: Envelope<Vec<String>> = serde_json::from_str(r#"{"data":["a","b"]}"#).unwrap();
        assert_eq!(wrapped.into_inner(), vec!["a", "b"]);
        let bare: Envelope<Vec<String>> = serde_json::from_str(r#"["c"]"#).unwrap();
        assert_eq!(bare.into_inner(), vec!["c"]);
    }
}
