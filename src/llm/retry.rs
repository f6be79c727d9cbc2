//! Bounded retry policy for model calls.

use std::time::Duration;

/// How many times a model call is attempted and how long to wait between
/// attempts.
///
/// Rate-limited attempts back off linearly (`rate_limit_backoff × attempt`);
/// transport failures wait a fixed `network_backoff`. Every other failure
/// is terminal and never consults the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never less than 1.
    pub max_attempts: u32,
    /// Base delay after an HTTP 429.
    pub rate_limit_backoff: Duration,
    /// Delay after a transport-level failure.
    pub network_backoff: Duration,
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one.
    #[must_use]
    pub fn new(max_attempts: u32, rate_limit_backoff: Duration, network_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            rate_limit_backoff,
            network_backoff,
        }
    }

    /// Returns `true` if another attempt may follow attempt number `attempt`
    /// (1-based).
    #[must_use]
    pub const fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before the attempt following a 429 on attempt `attempt`.
    #[must_use]
    pub fn rate_limit_delay(&self, attempt: u32) -> Duration {
        self.rate_limit_backoff.saturating_mul(attempt)
    }

    /// Delay before the attempt following a transport failure.
    #[must_use]
    pub const fn network_delay(&self) -> Duration {
        self.network_backoff
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(1))
    }
}
