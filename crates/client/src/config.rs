//! Client configuration, built once per session from the environment.
//!
//! [`ClientConfig`] replaces ad-hoc global state: it is constructed at
//! process start (after `dotenvy::dotenv()` in the binary), read-only
//! thereafter, and rebuilt explicitly on configuration change.

use std::time::Duration;

use dramasync_core::backoff::RetryConfig;

/// Default backend base URL when `DRAMASYNC_BASE_URL` is unset.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Configuration for a [`crate::DramaApi`] instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash, e.g. `http://host:3000`.
    pub base_url: String,
    /// Retry ceiling and delay curve for transient failures.
    pub retry: RetryConfig,
    /// Treat a 404 from `get_by_name` as transient and retry it.
    ///
    /// Off by default: a missing record is a legitimate lookup result
    /// (it drives the create decision). Enable only where a caller must
    /// ride out backend propagation delay.
    pub retry_not_found: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            retry: RetryConfig::default(),
            retry_not_found: false,
        }
    }
}

impl ClientConfig {
    /// Build the configuration from environment variables.
    ///
    /// Recognized variables (all optional):
    /// - `DRAMASYNC_BASE_URL`
    /// - `DRAMASYNC_RETRY_ATTEMPTS`
    /// - `DRAMASYNC_RETRY_BASE_MS`
    /// - `DRAMASYNC_RETRY_MAX_MS`
    ///
    /// Unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("DRAMASYNC_BASE_URL")
            .unwrap_or(defaults.base_url)
            .trim_end_matches('/')
            .to_string();

        let retry = RetryConfig {
            attempts: env_u32("DRAMASYNC_RETRY_ATTEMPTS", defaults.retry.attempts),
            base_delay: Duration::from_millis(u64::from(env_u32(
                "DRAMASYNC_RETRY_BASE_MS",
                defaults.retry.base_delay.as_millis() as u32,
            ))),
            max_delay: Duration::from_millis(u64::from(env_u32(
                "DRAMASYNC_RETRY_MAX_MS",
                defaults.retry.max_delay.as_millis() as u32,
            ))),
            offset: defaults.retry.offset,
        };

        Self {
            base_url,
            retry,
            retry_not_found: defaults.retry_not_found,
        }
    }

    /// Versioned API root, e.g. `http://host:3000/api/v1`.
    pub fn api_url(&self) -> String {
        format!("{}/api/v1", self.base_url)
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
