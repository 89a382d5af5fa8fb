//! Submission lifecycle
//!
//! `Idle → Submitting → {Idle, Failed}`. At most one submission per form is
//! in flight; a second `begin` while submitting is refused.

use thiserror::Error;

use super::FieldErrors;
use crate::error::ApiError;

/// Why a form operation was refused or failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    /// Local validation failed; nothing was sent
    #[error("Please correct the highlighted fields")]
    Invalid(FieldErrors),
    /// A submission is in flight; inputs are disabled
    #[error("A submission is already in progress")]
    Busy,
    #[error("The form is not open")]
    Closed,
    #[error("{0}")]
    Api(#[from] ApiError),
}

/// Where the form is in its submit cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
    /// Last submission failed; the draft is kept for retry
    Failed(String),
}

impl SubmissionState {
    pub fn is_submitting(&self) -> bool {
        matches!(self, SubmissionState::Submitting)
    }

    /// Submission-level error shown inline above the form
    pub fn error(&self) -> Option<&str> {
        match self {
            SubmissionState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn begin(&mut self) -> Result<(), SubmitError> {
        if self.is_submitting() {
            return Err(SubmitError::Busy);
        }
        *self = SubmissionState::Submitting;
        Ok(())
    }

    pub fn succeed(&mut self) {
        *self = SubmissionState::Idle;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        *self = SubmissionState::Failed(message.into());
    }
}
