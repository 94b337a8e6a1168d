//! Ticker configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Floor for the default backoff unit when `interval` is zero or very small.
const BACKOFF_MIN_UNIT: Duration = Duration::from_millis(10);

/// Ticker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerConfig {
    /// Minimum spacing between the start times of two consecutive task
    /// executions, in milliseconds. Zero disables pacing.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Per-task deadline measured from submission, in milliseconds. The
    /// deadline spans all retry attempts. `None` disables timeouts.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Additional attempts after the first failure
    #[serde(default)]
    pub retries: u32,

    /// Delay policy between retry attempts
    #[serde(default)]
    pub backoff: BackoffPolicy,
}

fn default_interval_ms() -> u64 {
    16
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 16,
            timeout_ms: None,
            retries: 0,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl TickerConfig {
    /// Get the pacing interval as a Duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Get the per-task deadline as a Duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Bare-interval shorthand for the common "just pace me" case
impl From<Duration> for TickerConfig {
    fn from(interval: Duration) -> Self {
        Self {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }
}

/// Computes the wait before a retry attempt. Custom curves are supplied as a
/// function via [`Ticker::with_backoff_fn`](super::Ticker::with_backoff_fn).
pub type BackoffFn = Box<dyn Fn(u32) -> Duration + Send>;

/// Delay between retry attempts, as a function of the attempt number
/// (the first retry is attempt 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackoffPolicy {
    /// Retry immediately
    None,

    /// `(multiplier << attempt) * max(interval, 10ms)`. Coarse by intent;
    /// callers needing a precise curve supply their own function.
    Multiplier(u32),
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::Multiplier(2)
    }
}

impl BackoffPolicy {
    /// Compute the wait before retry `attempt`
    pub fn delay(&self, attempt: u32, interval: Duration) -> Duration {
        match self {
            BackoffPolicy::None => Duration::ZERO,
            BackoffPolicy::Multiplier(multiplier) => {
                let unit = interval.max(BACKOFF_MIN_UNIT);
                let factor = multiplier.checked_shl(attempt).unwrap_or(u32::MAX);
                unit.saturating_mul(factor)
            }
        }
    }

    pub(crate) fn into_fn(self, interval: Duration) -> BackoffFn {
        Box::new(move |attempt| self.delay(attempt, interval))
    }
}
