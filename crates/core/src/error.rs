//! Model error type.

use thiserror::Error;

/// Result type used when decoding backend payloads into the model.
pub type ModelResult<T> = Result<T, ModelError>;

/// A backend payload could not be mapped onto the model.
///
/// These are deterministic shape failures; transport problems live in the
/// gateway and client crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A required field was absent or null.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The payload did not have any of the accepted shapes.
    #[error("unexpected payload shape: {0}")]
    UnexpectedShape(String),

    /// A field was present but could not be decoded.
    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ModelError {
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::UnexpectedShape(msg.into())
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
