//! Bounded retry with exponential backoff and jitter for upstream fetches.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::data_source::SourceError;

/// Delay schedule between attempts: `initial * multiplier^attempt`, capped at
/// `ceiling`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub multiplier: u32,
    pub ceiling: Duration,
    /// Spread each delay uniformly over `[delay / 2, delay * 3 / 2]`.
    pub jitter: bool,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(200),
            multiplier: 2,
            ceiling: Duration::from_secs(2),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Same delay before every retry.
    pub const fn constant(delay: Duration) -> Self {
        Self {
            initial: delay,
            multiplier: 1,
            ceiling: delay,
            jitter: false,
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay(self, attempt: u32) -> Duration {
        let growth = self.multiplier.checked_pow(attempt).unwrap_or(u32::MAX);
        let capped = self.initial.saturating_mul(growth).min(self.ceiling);
        if !self.jitter {
            return capped;
        }

        let millis = u64::try_from(capped.as_millis()).unwrap_or(u64::MAX);
        let half = millis / 2;
        Duration::from_millis(half.saturating_add(fastrand::u64(0..=millis)))
    }
}

/// Retry policy for transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts are `max_retries + 1`. Zero disables retrying.
    pub max_retries: u32,
    pub backoff: Backoff,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Backoff::default(),
        }
    }
}

impl RetryConfig {
    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::constant(delay),
        }
    }

    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Runs `operation`, retrying while it fails with a retryable error and
    /// the retry budget lasts. Non-retryable errors return immediately.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.retryable() && attempt < self.max_retries => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        target: "quotecache::retry",
                        %label,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "transient upstream failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
