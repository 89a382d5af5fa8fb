//! Route gate for protected dashboard views
//!
//! Presence of a token is sufficient; actual validity is decided by the API,
//! and a 401 from any call clears the session.

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::DashboardApi;
use crate::error::{ApiError, ApiResult};
use crate::models::{LoginRequest, User};

use super::store::SessionStore;

/// Where unauthenticated users are sent
pub const LOGIN_PATH: &str = "/login";

/// Where users land after login when no destination was preserved
pub const DEFAULT_LANDING: &str = "/dashboard";

/// Outcome of checking a protected destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Render the requested view
    Allow,
    /// Show the login view, then return to `return_to`
    RedirectToLogin { login_path: String, return_to: String },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }
}

/// Gate in front of every protected view
#[derive(Clone)]
pub struct SessionGate {
    store: Arc<dyn SessionStore>,
}

impl SessionGate {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Check a destination before rendering it
    pub fn check(&self, destination: &str) -> GateDecision {
        if self.store.is_authenticated() {
            return GateDecision::Allow;
        }
        GateDecision::RedirectToLogin {
            login_path: LOGIN_PATH.to_string(),
            return_to: sanitize_destination(destination),
        }
    }

    /// Force logout when the API rejects the credential.
    ///
    /// Returns `true` if the session was cleared.
    pub fn handle_api_error(&self, error: &ApiError) -> bool {
        if error.is_unauthorized() {
            warn!("API rejected credential, clearing session");
            self.store.clear_session();
            return true;
        }
        false
    }

    /// Resolve where to go after a successful login
    pub fn post_login_destination(return_to: Option<&str>) -> String {
        return_to
            .map(sanitize_destination)
            .unwrap_or_else(|| DEFAULT_LANDING.to_string())
    }
}

/// Only same-origin, non-login paths are preserved
fn sanitize_destination(destination: &str) -> String {
    let trimmed = destination.trim();
    let same_origin = trimmed.starts_with('/') && !trimmed.starts_with("//");
    if !same_origin || trimmed == LOGIN_PATH || trimmed.starts_with("/login?") {
        return DEFAULT_LANDING.to_string();
    }
    trimmed.to_string()
}

/// Authenticate and initialize the session
pub async fn login(
    api: &dyn DashboardApi,
    store: &dyn SessionStore,
    username: &str,
    password: &str,
) -> ApiResult<User> {
    let request = LoginRequest {
        username: username.to_string(),
        password: password.to_string(),
    };
    let response = api.login(&request).await?;
    store
        .set_session(&response.token, &response.user)
        .map_err(|e| ApiError::no_response(format!("Failed to store session: {}", e)))?;
    info!(username = %response.user.username, "Logged in");
    Ok(response.user)
}

/// Tear down the session
pub fn logout(store: &dyn SessionStore) {
    store.clear_session();
    info!("Logged out");
}
