//! Backend response envelope helpers.
//!
//! The backend wraps successful results as `{ success, message, data, metadata }`
//! and errors as `{ success: false, message, error_details }`. Older endpoints
//! answer with the bare object instead, so every accessor here accepts both.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of a backend response, decoded as leniently as the gateway needs.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Zero-length body.
    Empty,
    /// Body parsed as JSON.
    Json(Value),
    /// Body that was not valid JSON, kept verbatim.
    Text(String),
}

impl Payload {
    /// Parse a raw response body: JSON when possible, otherwise the raw text.
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(v) => Some(v),
            _ => None,
        }
    }

    /// The payload as a JSON value (`null` for an empty body, a string for text).
    pub fn into_value(self) -> Value {
        match self {
            Payload::Empty => Value::Null,
            Payload::Json(v) => v,
            Payload::Text(t) => Value::String(t),
        }
    }

    /// Backend-supplied error message, if any.
    pub fn message(&self) -> Option<&str> {
        self.as_json().and_then(backend_message)
    }

    /// Backend-supplied `error_details`, if any.
    pub fn error_details(&self) -> Option<&Value> {
        self.as_json()
            .and_then(|v| v.get("error_details"))
            .filter(|d| !d.is_null())
    }
}

/// One field-level validation failure reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

/// `result.data` when present and non-null, otherwise the value itself.
pub fn unwrap_data(value: &Value) -> &Value {
    match value.get("data") {
        Some(data) if !data.is_null() => data,
        _ => value,
    }
}

/// Non-empty `message` string carried by a backend payload.
pub fn backend_message(value: &Value) -> Option<&str> {
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
}

/// Field-level errors from `error_details.validationErrors`.
///
/// Entries that do not have both a `field` and an `error` string are skipped.
pub fn validation_errors(value: &Value) -> Vec<FieldError> {
    let Some(list) = value
        .get("error_details")
        .and_then(|d| d.get("validationErrors"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    list.iter()
        .filter_map(|entry| serde_json::from_value::<FieldError>(entry.clone()).ok())
        .collect()
}
