//! Retry policy for summarization calls.
//!
//! Only transport-level failures are retried (429, 5xx, connection resets,
//! timeouts). A reply that arrives but fails to parse is never retried here:
//! the cycle aborts and the trigger re-evaluates on the next round.

use std::time::Duration;

/// HTTP statuses worth another attempt.
const TRANSIENT_STATUSES: [&str; 5] = ["429", "500", "502", "503", "504"];

/// Error fragments that indicate a network-level hiccup.
const TRANSIENT_PATTERNS: [&str; 7] = [
    "request failed:",
    "connection reset",
    "connection refused",
    "timed out",
    "timeout",
    "broken pipe",
    "network",
];

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (0 = fail on the first error).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Shave a deterministic fraction off each delay so parallel sessions
    /// don't retry in lockstep.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            multiplier: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Default backoff with the given number of retries.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_retries: retries,
            ..Default::default()
        }
    }

    /// No retries at all.
    pub fn disabled() -> Self {
        Self::with_retries(0)
    }

    /// Delay before retry number `attempt` (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let capped = base.min(self.max_delay.as_secs_f64());
        let factor = if self.jitter {
            [0.75, 0.9, 0.6, 0.85][(attempt % 4) as usize]
        } else {
            1.0
        };
        Duration::from_secs_f64(capped * factor)
    }
}

/// Whether a transport error string describes a transient failure.
pub fn is_transient_error(error: &str) -> bool {
    if TRANSIENT_STATUSES
        .iter()
        .any(|s| error.contains(&format!("HTTP {s}")))
    {
        return true;
    }
    let lower = error.to_lowercase();
    TRANSIENT_PATTERNS.iter().any(|p| lower.contains(p))
}
