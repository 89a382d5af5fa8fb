//! API error normalization
//!
//! Every failure that crosses the network boundary is reduced to a
//! `{message, status}` pair. Status `0` means no response was received.

use serde::Deserialize;
use thiserror::Error;

/// Result type for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Normalized network/API error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// Human-readable message, server-provided when available
    pub message: String,
    /// HTTP status code, `0` when the server could not be reached
    pub status: u16,
}

/// Error body shapes returned by the backend
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    /// The request never produced a response (connectivity, timeout)
    pub fn no_response(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    /// Build from a non-2xx response body, preferring the server's message
    pub fn from_body(status: u16, body: &str) -> Self {
        if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
            if let Some(message) = parsed.message.or(parsed.error).filter(|m| !m.trim().is_empty()) {
                return Self::new(status, message);
            }
        }

        let trimmed = body.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('<') && trimmed.len() <= 200 {
            return Self::new(status, trimmed);
        }

        Self::new(status, default_message(status))
    }

    pub fn is_no_response(&self) -> bool {
        self.status == 0
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

fn default_message(status: u16) -> String {
    match status {
        400 => "The request was rejected by the server".to_string(),
        401 => "Your session has expired, please log in again".to_string(),
        403 => "You do not have permission to perform this action".to_string(),
        404 => "The requested record was not found".to_string(),
        500..=599 => "The server encountered an error".to_string(),
        _ => format!("Request failed with status {}", status),
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::new(status.as_u16(), default_message(status.as_u16()));
        }
        if err.is_connect() || err.is_timeout() || err.is_request() {
            return Self::no_response(format!("Unable to reach the server: {}", err));
        }
        if err.is_decode() {
            return Self::no_response(format!("Unexpected response from server: {}", err));
        }
        Self::no_response(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::no_response(format!("Invalid data: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_preferred() {
        let err = ApiError::from_body(400, r#"{"message":"Beneficiary already exists"}"#);
        assert_eq!(err.status, 400);
        assert_eq!(err.message, "Beneficiary already exists");

        let err = ApiError::from_body(409, r#"{"error":"Duplicate ID"}"#);
        assert_eq!(err.message, "Duplicate ID");
    }

    #[test]
    fn test_plain_text_and_empty_bodies() {
        let err = ApiError::from_body(502, "Bad gateway");
        assert_eq!(err.message, "Bad gateway");

        let err = ApiError::from_body(500, "");
        assert_eq!(err.message, "The server encountered an error");

        let err = ApiError::from_body(500, "<html><body>oops</body></html>");
        assert_eq!(err.message, "The server encountered an error");
    }

    #[test]
    fn test_status_helpers() {
        assert!(ApiError::no_response("offline").is_no_response());
        assert!(ApiError::new(401, "nope").is_unauthorized());
        assert!(ApiError::new(404, "missing").is_not_found());
        assert_eq!(ApiError::new(418, "teapot").to_string(), "teapot");
    }
}
