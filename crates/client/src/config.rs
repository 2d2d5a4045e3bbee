use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default period of the background refresh. Must stay below the backend's
/// access-token lifetime (60 minutes).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(50 * 60);

/// Where the gateway lives and how the client paces itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Gateway origin, e.g. `http://localhost:3000` (no trailing slash).
    pub origin: String,
    pub timeout: Duration,
    pub refresh_interval: Duration,
}

impl ClientConfig {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}
