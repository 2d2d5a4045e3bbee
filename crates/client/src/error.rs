use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use taskgate_core::{FieldError, backend_message, validation_errors};

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The gateway answered with a non-success status.
    #[error("{message} ({status})")]
    Status {
        status: StatusCode,
        message: String,
        /// Parsed response body (`Null` when empty, a string when not JSON).
        data: Value,
    },

    #[error("network error: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),

    /// No signed-in user where one is required.
    #[error("not authenticated")]
    NotAuthenticated,
}

impl ApiError {
    /// Build the error for a failed response: message from the payload, then
    /// the status reason, then a generic fallback.
    pub fn from_response(status: StatusCode, data: Value) -> Self {
        let message = backend_message(&data)
            .or_else(|| status.canonical_reason())
            .unwrap_or("API error")
            .to_string();
        Self::Status {
            status,
            message,
            data,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotAuthenticated => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Status { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Field-level validation failures, for rendering next to form inputs.
    pub fn validation_errors(&self) -> Vec<FieldError> {
        self.data().map(validation_errors).unwrap_or_default()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
