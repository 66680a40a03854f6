//! Retry backoff policy for the record client.
//!
//! Delays grow logarithmically rather than doubling: bursts of
//! navigation-triggered calls back off together without hammering the
//! backend, while a single blip recovers after one short delay.

use std::time::Duration;

/// Tunable parameters for the retry policy.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    pub attempts: u32,
    /// Base delay multiplied by `log2(attempt + offset)`.
    pub base_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Added to the attempt number inside the log so the first retry is
    /// not immediate (`log2(1)` would be zero).
    pub offset: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
            offset: 1,
        }
    }
}

/// Delay before retry `attempt` (1-indexed).
///
/// `min(log2(attempt + offset) * base_delay, max_delay)`. Non-decreasing
/// in `attempt` and never exceeds [`RetryConfig::max_delay`].
pub fn delay_for_attempt(attempt: u32, config: &RetryConfig) -> Duration {
    let factor = f64::from(attempt + config.offset).log2();
    let delay_ms = (config.base_delay.as_millis() as f64 * factor) as u64;
    Duration::from_millis(delay_ms).min(config.max_delay)
}
