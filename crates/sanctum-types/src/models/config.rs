//! Gateway and bridge configuration.

use super::event::{DEFAULT_MONITOR, MAX_LOG_SIZE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Retry policy for outbound requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[validate(schema(function = validate_delay_ordering))]
pub struct RetryConfig {
    /// Additional attempts after the first failure
    #[validate(range(max = 20_u32))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff for the first retry, in milliseconds
    #[validate(range(min = 1_u64, max = 60_000_u64))]
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Backoff ceiling, in milliseconds; never below `base_delay_ms`
    #[validate(range(min = 1_u64, max = 600_000_u64))]
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn validate_delay_ordering(config: &RetryConfig) -> Result<(), ValidationError> {
    if config.base_delay_ms > config.max_delay_ms {
        return Err(ValidationError::new("base_delay_exceeds_max"));
    }
    Ok(())
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

pub const fn default_max_retries() -> u32 {
    3
}

pub const fn default_base_delay_ms() -> u64 {
    1000
}

pub const fn default_max_delay_ms() -> u64 {
    10_000
}

/// Request gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct GatewayConfig {
    /// Base URL for backend function calls ({base}/{function_name})
    #[serde(default = "default_functions_base_url")]
    pub functions_base_url: String,
    /// Base URL for the local REST backend ({base}/api/v1/{path})
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Per-attempt deadline in seconds
    #[validate(range(min = 1_u64, max = 3600_u64))]
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Retry policy
    #[serde(default)]
    #[validate(nested)]
    pub retry: RetryConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            functions_base_url: default_functions_base_url(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Build a config from environment variables, falling back to defaults.
    ///
    /// Honors `SANCTUM_FUNCTIONS_URL`, `SANCTUM_API_URL`, and
    /// `SANCTUM_REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("SANCTUM_FUNCTIONS_URL") {
            config.functions_base_url = url;
        }
        if let Ok(url) = std::env::var("SANCTUM_API_URL") {
            config.api_base_url = url;
        }
        if let Ok(secs) = std::env::var("SANCTUM_REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = secs.parse() {
                config.request_timeout_secs = parsed;
            }
        }
        config
    }

    /// The per-attempt deadline as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL for a named backend function.
    pub fn function_url(&self, name: &str) -> String {
        format!("{}/{}", self.functions_base_url.trim_end_matches('/'), name)
    }

    /// Full URL for a REST path under `/api/v1`.
    pub fn api_url(&self, path: &str) -> String {
        format!(
            "{}/api/v1/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

pub fn default_functions_base_url() -> String {
    "http://127.0.0.1:54321/functions/v1".to_string()
}

pub fn default_api_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

pub const fn default_request_timeout() -> u64 {
    30
}

/// Event bridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct BridgeConfig {
    /// Maximum number of events retained in the persisted log
    #[validate(range(min = 1, max = 10_000))]
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    /// Actor receiving mirrored copies of cross-module traffic
    #[validate(length(min = 1_u64))]
    #[serde(default = "default_monitor")]
    pub monitor: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self { log_capacity: default_log_capacity(), monitor: default_monitor() }
    }
}

pub const fn default_log_capacity() -> usize {
    MAX_LOG_SIZE
}

pub fn default_monitor() -> String {
    DEFAULT_MONITOR.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_defaults() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.base_delay_ms, 1000);
        assert_eq!(retry.max_delay_ms, 10_000);
        assert!(retry.validate().is_ok());
    }

    #[test]
    fn test_gateway_defaults_validate() {
        let config = GatewayConfig::default();
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_retry_rejected() {
        let retry = RetryConfig { max_retries: 100, ..RetryConfig::default() };
        assert!(retry.validate().is_err());

        let retry = RetryConfig { base_delay_ms: 0, ..RetryConfig::default() };
        assert!(retry.validate().is_err());
    }

    #[test]
    fn test_base_delay_must_not_exceed_max() {
        let retry =
            RetryConfig { base_delay_ms: 5000, max_delay_ms: 1000, ..RetryConfig::default() };
        assert!(retry.validate().is_err());

        // The nested check surfaces through the gateway config too.
        let config = GatewayConfig { retry, ..GatewayConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_url_joining() {
        let config = GatewayConfig {
            functions_base_url: "http://localhost:54321/functions/v1/".to_string(),
            api_base_url: "http://localhost:8000/".to_string(),
            ..GatewayConfig::default()
        };

        assert_eq!(
            config.function_url("send-chat"),
            "http://localhost:54321/functions/v1/send-chat"
        );
        assert_eq!(config.api_url("/tasks/42"), "http://localhost:8000/api/v1/tasks/42");
        assert_eq!(config.api_url("tasks/42"), "http://localhost:8000/api/v1/tasks/42");
    }

    #[test]
    fn test_bridge_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.log_capacity, MAX_LOG_SIZE);
        assert_eq!(config.monitor, DEFAULT_MONITOR);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: GatewayConfig =
            serde_json::from_str(r#"{"request_timeout_secs": 10}"#).unwrap();
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.functions_base_url, default_functions_base_url());
    }
}
