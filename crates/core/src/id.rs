//! Backend entity identifiers.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;

/// Identifier of a backend entity (user, task).
///
/// The backend emits either integers or strings; both are kept verbatim so the
/// value round-trips through the gateway unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl EntityId {
    /// Decode an identifier from a JSON value.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) if !s.is_empty() => Some(Self::Str(s.clone())),
            _ => None,
        }
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            EntityId::Int(v) => core::fmt::Display::fmt(v, f),
            EntityId::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl FromStr for EntityId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ModelError::invalid("id", "empty identifier"));
        }
        Ok(s.parse::<i64>().map(Self::Int).unwrap_or_else(|_| Self::Str(s.to_string())))
    }
}
