//! Gateway error model and its JSON rendering.
//!
//! Every failure ends up as a JSON body with a `message`; nothing escapes as
//! an unhandled fault.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use thiserror::Error;

use taskgate_core::ModelError;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub const MISSING_SESSION_MESSAGE: &str = "No token found";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// No usable session cookie on the inbound request.
    #[error("no session token")]
    MissingSession,

    /// Inbound body could not be parsed.
    #[error("invalid request body: {0}")]
    InvalidBody(String),

    /// Backend unreachable, timed out, or its body could not be read.
    #[error("backend transport failure: {0}")]
    Transport(#[source] reqwest::Error),

    /// Login/signup/refresh succeeded but carried no usable `access_token`.
    #[error("backend response carried no usable access token")]
    MissingAccessToken,

    #[error("unexpected backend payload: {0}")]
    Model(#[from] ModelError),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Backend {
        status: StatusCode,
        message: String,
        details: Option<Value>,
    },
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        match self {
            GatewayError::MissingSession => {
                json_error(StatusCode::UNAUTHORIZED, MISSING_SESSION_MESSAGE, None)
            }
            GatewayError::Backend {
                status,
                message,
                details,
            } => json_error(status, message, details),
            other => {
                tracing::error!(error = %other, "gateway request failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE, None)
            }
        }
    }
}

/// `{ "message": ..., "error_details"?: ... }` with the given status.
pub fn json_error(status: StatusCode, message: impl Into<String>, details: Option<Value>) -> Response {
    let mut body = json!({ "message": message.into() });
    if let Some(details) = details {
        body["error_details"] = details;
    }
    (status, axum::Json(body)).into_response()
}
