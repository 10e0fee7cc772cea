//! Checker settings: registry endpoints, concurrency and timeouts

use crate::concurrency::DEFAULT_MAX_CONCURRENT_FETCHES;
use crate::error::{Result, WatchError};
use crate::registry::client::{DEFAULT_REGISTRY_URL, DEFAULT_SERVICE, DEFAULT_TOKEN_URL};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    pub registry_url: String,
    pub token_url: String,
    pub service: String,
    pub max_concurrent_fetches: usize,
    /// Per-request timeout in seconds, shared by registry and notification calls
    pub timeout_secs: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            service: DEFAULT_SERVICE.to_string(),
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            timeout_secs: 30,
        }
    }
}

impl CheckerConfig {
    pub fn with_registry_url(mut self, registry_url: impl Into<String>) -> Self {
        self.registry_url = registry_url.into();
        self
    }

    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.max_concurrent_fetches = max;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, url) in [("registry_url", &self.registry_url), ("token_url", &self.token_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WatchError::Config(format!(
                    "Invalid {}: {}. Must start with http:// or https://",
                    name, url
                )));
            }
        }
        if self.service.is_empty() {
            return Err(WatchError::Config("service cannot be empty".to_string()));
        }
        if self.max_concurrent_fetches == 0 {
            return Err(WatchError::Config(
                "max_concurrent_fetches must be greater than 0".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(WatchError::Config(
                "timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = CheckerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_concurrent_fetches, 2);
    }

    #[test]
    fn test_invalid_config() {
        assert!(CheckerConfig::default().with_max_concurrent_fetches(0).validate().is_err());
        assert!(CheckerConfig::default().with_timeout(0).validate().is_err());
        assert!(CheckerConfig::default().with_registry_url("registry-1.docker.io").validate().is_err());
        assert!(CheckerConfig::default().with_service("").validate().is_err());
    }
}
