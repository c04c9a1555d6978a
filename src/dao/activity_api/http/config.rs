use std::time::Duration;

/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration describing how to reach the activity service.
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Service root every endpoint path is joined to.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl HttpApiConfig {
    /// Construct a configuration from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
