//! Current-user identity as exposed to the UI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::envelope::unwrap_data;
use crate::error::{ModelError, ModelResult};
use crate::id::EntityId;
use crate::time::{lenient, parse_timestamp};

/// Role of the signed-in user.
///
/// The backend reports roles upper-cased (`ADMIN`); the UI always sees the
/// lower-cased form.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// Map a backend role string onto a role, case-insensitively.
    ///
    /// Missing or unknown roles grant the unprivileged `user` role.
    pub fn from_backend(raw: Option<&str>) -> Self {
        match raw {
            Some(r) if r.trim().eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated user, derived from a backend profile/login response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: EntityId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, with = "lenient", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "lenient", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CurrentUser {
    /// Normalise a backend user record (enveloped or bare).
    ///
    /// Only `id` is mandatory; `name`/`email` default to empty strings and the
    /// role is lower-cased.
    pub fn from_backend(value: &Value) -> ModelResult<Self> {
        let data = unwrap_data(value);
        if !data.is_object() {
            return Err(ModelError::shape("user record is not an object"));
        }

        let id = data
            .get("id")
            .and_then(EntityId::from_value)
            .ok_or(ModelError::MissingField("id"))?;

        let text = |key: &str| {
            data.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let timestamp = |key: &str| data.get(key).and_then(Value::as_str).and_then(parse_timestamp);

        Ok(Self {
            id,
            name: text("name"),
            email: text("email"),
            role: Role::from_backend(data.get("role").and_then(Value::as_str)),
            created_at: timestamp("created_at"),
            updated_at: timestamp("updated_at"),
        })
    }

    /// Same identity, minus audit timestamps (login/signup responses omit them).
    pub fn without_timestamps(mut self) -> Self {
        self.created_at = None;
        self.updated_at = None;
        self
    }
}

/// Entry of the assignable-users list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
}
