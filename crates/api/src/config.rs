//! Gateway configuration, read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Deployment environment. Only production gets `Secure` cookies.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Base URL of the backend API, without trailing slash.
    pub api_base_url: String,
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    /// Upper bound for a single backend call, connect included.
    pub backend_timeout: Duration,
}

impl GatewayConfig {
    /// Development defaults pointing at `api_base_url`.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: normalize_base_url(&api_base_url.into()),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            environment: Environment::Development,
            backend_timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_backend_timeout(mut self, timeout: Duration) -> Self {
        self.backend_timeout = timeout;
        self
    }

    /// Load from `API_BASE_URL`, `BIND_ADDR`, `APP_ENV`, `BACKEND_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base = lookup("API_BASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("API_BASE_URL"))?;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "API_BASE_URL",
                value: base,
                reason: "expected an http(s) URL".into(),
            });
        }

        let bind = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind.clone(),
            reason: e.to_string(),
        })?;

        let environment = lookup("APP_ENV")
            .map(|v| Environment::parse(&v))
            .unwrap_or_default();

        let backend_timeout = match lookup("BACKEND_TIMEOUT_SECS") {
            None => DEFAULT_BACKEND_TIMEOUT,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "BACKEND_TIMEOUT_SECS",
                        value: raw,
                        reason: "expected a positive number of seconds".into(),
                    });
                }
            },
        };

        Ok(Self {
            api_base_url: normalize_base_url(&base),
            bind_addr,
            environment,
            backend_timeout,
        })
    }
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = GatewayConfig::from_lookup(lookup(&[("API_BASE_URL", "http://backend:8000/api/")]))
            .unwrap();

        assert_eq!(cfg.api_base_url, "http://backend:8000/api");
        assert_eq!(cfg.bind_addr.port(), 3000);
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.backend_timeout, Duration::from_secs(30));
    }

    #[test]
    fn production_and_overrides() {
        let cfg = GatewayConfig::from_lookup(lookup(&[
            ("API_BASE_URL", "https://api.example.com"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("APP_ENV", "Production"),
            ("BACKEND_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert!(cfg.environment.is_production());
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(cfg.backend_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_values_are_reported() {
        assert_eq!(
            GatewayConfig::from_lookup(lookup(&[])),
            Err(ConfigError::Missing("API_BASE_URL"))
        );
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&[("API_BASE_URL", "backend:8000")])),
            Err(ConfigError::Invalid { key: "API_BASE_URL", .. })
        ));
        assert!(matches!(
            GatewayConfig::from_lookup(lookup(&[
                ("API_BASE_URL", "http://b"),
                ("BACKEND_TIMEOUT_SECS", "0"),
            ])),
            Err(ConfigError::Invalid { key: "BACKEND_TIMEOUT_SECS", .. })
        ));
    }
}
