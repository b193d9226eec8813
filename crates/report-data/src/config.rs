//! Connection settings for the maintenance data service

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_IMAGE_TIMEOUT_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Backend root, without the `/api/v1` prefix
    pub base_url: String,
    /// Upper bound for any single HTTP request
    pub request_timeout: Duration,
    /// How long aggregation waits for an inspection image before
    /// printing a placeholder instead
    pub image_timeout: Duration,
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_image_timeout(mut self, timeout: Duration) -> Self {
        self.image_timeout = timeout;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            image_timeout: Duration::from_millis(DEFAULT_IMAGE_TIMEOUT_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.image_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_builder_overrides_only_what_it_sets() {
        let config = ServiceConfig::new("http://backend:9000")
            .with_image_timeout(Duration::from_millis(250));
        assert_eq!(config.base_url, "http://backend:9000");
        assert_eq!(config.image_timeout, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }
}
