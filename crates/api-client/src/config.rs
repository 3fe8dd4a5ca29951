//! Configuration for the Fleetline API client
//!
//! Supports environment-based configuration with sensible defaults. Out of
//! range timeouts and call rates are clamped rather than rejected.

use crate::error::{ApiError, ApiResult};
use fleetline_core::rate_limit::RateLimitConfig;
use fleetline_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default service host
pub const DEFAULT_BASE_URL: &str = "https://onfleet.com";
/// Default API path under the host
pub const DEFAULT_API_PATH: &str = "/api";
/// Default API version
pub const DEFAULT_API_VERSION: &str = "v2";
/// Per-call timeout, also the largest allowed
pub const MAX_TIMEOUT: Duration = Duration::from_millis(70_000);
/// Default outbound call rate
pub const DEFAULT_MAX_CALLS_PER_SECOND: u32 = 18;
/// Highest call rate the service accepts
pub const MAX_CALLS_PER_SECOND: u32 = 20;

/// Environment variable names read by [`ClientConfig::from_env`]
pub mod env_vars {
    /// API key (required)
    pub const API_KEY: &str = "FLEETLINE_API_KEY";
    /// Service host
    pub const BASE_URL: &str = "FLEETLINE_BASE_URL";
    /// API path under the host
    pub const API_PATH: &str = "FLEETLINE_API_PATH";
    /// API version
    pub const API_VERSION: &str = "FLEETLINE_API_VERSION";
    /// Per-call timeout in milliseconds
    pub const TIMEOUT_MS: &str = "FLEETLINE_TIMEOUT_MS";
    /// Outbound call rate
    pub const MAX_CALLS_PER_SECOND: &str = "FLEETLINE_MAX_CALLS_PER_SECOND";
}

/// Client configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API key, sent as the Basic auth user name
    pub api_key: String,
    /// Service host, e.g. `https://onfleet.com`
    pub base_url: String,
    /// API path under the host
    pub path: String,
    /// API version segment
    pub api_version: String,
    /// Per-call timeout, limiter waits and retries included
    #[serde(with = "duration_millis")]
    pub timeout: Duration,
    /// Outbound calls per second shared by every caller of one client
    pub max_calls_per_second: u32,
    /// Calls that may be sent back to back
    pub burst: u32,
    /// Retry configuration
    pub retry: RetryConfig,
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        u64::try_from(duration.as_millis())
            .unwrap_or(u64::MAX)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("path", &self.path)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .field("max_calls_per_second", &self.max_calls_per_second)
            .field("burst", &self.burst)
            .field("retry", &self.retry)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            path: DEFAULT_API_PATH.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: MAX_TIMEOUT,
            max_calls_per_second: DEFAULT_MAX_CALLS_PER_SECOND,
            burst: 1,
            retry: RetryConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Default configuration for an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `FLEETLINE_API_KEY`: API key (required)
    /// - `FLEETLINE_BASE_URL`: Service host
    /// - `FLEETLINE_API_PATH`: API path under the host
    /// - `FLEETLINE_API_VERSION`: API version
    /// - `FLEETLINE_TIMEOUT_MS`: Per-call timeout in milliseconds
    /// - `FLEETLINE_MAX_CALLS_PER_SECOND`: Outbound call rate
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let api_key = lookup(env_vars::API_KEY)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ApiError::missing_env(env_vars::API_KEY))?;

        let mut config = Self::new(api_key);
        if let Some(url) = lookup(env_vars::BASE_URL) {
            config = config.with_base_url(url);
        }
        if let Some(path) = lookup(env_vars::API_PATH) {
            config = config.with_path(path);
        }
        if let Some(version) = lookup(env_vars::API_VERSION) {
            config = config.with_api_version(version);
        }
        if let Some(raw) = lookup(env_vars::TIMEOUT_MS) {
            let millis = parse_number(env_vars::TIMEOUT_MS, &raw)?;
            config = config.with_timeout(Duration::from_millis(millis));
        }
        if let Some(raw) = lookup(env_vars::MAX_CALLS_PER_SECOND) {
            let rate = parse_number(env_vars::MAX_CALLS_PER_SECOND, &raw)?;
            config = config.with_max_calls_per_second(u32::try_from(rate).unwrap_or(u32::MAX));
        }

        Ok(config)
    }

    /// Builder-style method to set the service host
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set the API path
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Builder-style method to set the API version
    #[must_use]
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Builder-style method to set the timeout; zero or too long means the maximum
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = clamp_timeout(timeout);
        self
    }

    /// Builder-style method to set the call rate; zero means the default,
    /// anything above the service limit means the limit
    #[must_use]
    pub fn with_max_calls_per_second(mut self, rate: u32) -> Self {
        self.max_calls_per_second = clamp_rate(rate);
        self
    }

    /// Builder-style method to set the burst size
    #[must_use]
    pub fn with_burst(mut self, burst: u32) -> Self {
        self.burst = burst.max(1);
        self
    }

    /// Builder-style method to set retry config
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Copy with every clamped field brought into range.
    ///
    /// Needed for values that bypassed the builders, such as deserialized ones.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.timeout = clamp_timeout(self.timeout);
        self.max_calls_per_second = clamp_rate(self.max_calls_per_second);
        self.burst = self.burst.max(1);
        self
    }

    /// Full API root: host, path and version joined with single slashes
    #[must_use]
    pub fn api_url(&self) -> String {
        let parts = [
            self.base_url.trim_end_matches('/'),
            self.path.trim_matches('/'),
            self.api_version.trim_matches('/'),
        ];
        parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Rate limiter settings for this configuration
    #[must_use]
    pub fn rate_limit(&self) -> RateLimitConfig {
        RateLimitConfig::per_second(clamp_rate(self.max_calls_per_second))
            .with_burst(self.burst.max(1))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ApiError::config("api_key cannot be empty"));
        }

        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::config("base_url must start with http:// or https://"));
        }

        self.rate_limit().validate()?;
        self.retry.validate()?;

        Ok(())
    }
}

fn clamp_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() || timeout > MAX_TIMEOUT {
        MAX_TIMEOUT
    } else {
        timeout
    }
}

fn clamp_rate(rate: u32) -> u32 {
    match rate {
        0 => DEFAULT_MAX_CALLS_PER_SECOND,
        r => r.min(MAX_CALLS_PER_SECOND),
    }
}

fn parse_number(var: &str, raw: &str) -> ApiResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| ApiError::config(format!("{var} must be a whole number, got `{raw}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::new("key");
        assert_eq!(config.api_url(), "https://onfleet.com/api/v2");
        assert_eq!(config.timeout, Duration::from_secs(70));
        assert_eq!(config.max_calls_per_second, 18);
        assert_eq!(config.burst, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_timeout_clamped() {
        let config = ClientConfig::new("key");
        assert_eq!(config.clone().with_timeout(Duration::ZERO).timeout, MAX_TIMEOUT);
        assert_eq!(
            config.clone().with_timeout(Duration::from_secs(600)).timeout,
            MAX_TIMEOUT
        );
        assert_eq!(
            config.with_timeout(Duration::from_millis(1500)).timeout,
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn test_rate_clamped() {
        let config = ClientConfig::new("key");
        assert_eq!(config.clone().with_max_calls_per_second(0).max_calls_per_second, 18);
        assert_eq!(config.clone().with_max_calls_per_second(50).max_calls_per_second, 20);
        assert_eq!(config.with_max_calls_per_second(5).max_calls_per_second, 5);
    }

    #[test]
    fn test_normalized_fixes_deserialized_values() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "api_key": "key",
            "base_url": "https://onfleet.com",
            "path": "/api",
            "api_version": "v2",
            "timeout": 0,
            "max_calls_per_second": 99,
            "burst": 0,
            "retry": RetryConfig::default(),
        }))
        .unwrap();

        let config = config.normalized();
        assert_eq!(config.timeout, MAX_TIMEOUT);
        assert_eq!(config.max_calls_per_second, MAX_CALLS_PER_SECOND);
        assert_eq!(config.burst, 1);
    }

    #[test]
    fn test_api_url_joins_slashes() {
        let config = ClientConfig::new("key")
            .with_base_url("http://localhost:8080/")
            .with_path("/api/")
            .with_api_version("v2");
        assert_eq!(config.api_url(), "http://localhost:8080/api/v2");

        let bare = ClientConfig::new("key")
            .with_base_url("http://127.0.0.1:1234")
            .with_path("");
        assert_eq!(bare.api_url(), "http://127.0.0.1:1234/v2");
    }

    #[test]
    fn test_rate_limit_from_config() {
        let limits = ClientConfig::new("key")
            .with_max_calls_per_second(10)
            .with_burst(3)
            .rate_limit();
        assert_eq!(limits.max_requests, 10);
        assert_eq!(limits.burst, 3);
        assert_eq!(limits.window, Duration::from_secs(1));
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            ClientConfig::default().validate(),
            Err(ApiError::Config(_))
        ));
        assert!(ClientConfig::new("key").with_base_url("").validate().is_err());
        assert!(ClientConfig::new("key")
            .with_base_url("ftp://onfleet.com")
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_env_requires_key() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ApiError::MissingEnvVar(var) if var == env_vars::API_KEY));
    }

    #[test]
    fn test_from_env_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            (env_vars::API_KEY, "secret"),
            (env_vars::BASE_URL, "http://localhost:9000"),
            (env_vars::API_VERSION, "v3"),
            (env_vars::TIMEOUT_MS, "2500"),
            (env_vars::MAX_CALLS_PER_SECOND, "40"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "secret");
        assert_eq!(config.api_url(), "http://localhost:9000/api/v3");
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.max_calls_per_second, MAX_CALLS_PER_SECOND);
    }

    #[test]
    fn test_from_env_rejects_garbage_numbers() {
        let err = ClientConfig::from_lookup(lookup(&[
            (env_vars::API_KEY, "secret"),
            (env_vars::TIMEOUT_MS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ApiError::Config(msg) if msg.contains(env_vars::TIMEOUT_MS)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", ClientConfig::new("super-secret"));
        assert!(!rendered.contains("super-secret"));
    }
}
