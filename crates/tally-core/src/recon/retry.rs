//! Retry with exponential backoff and jitter.

use crate::source::SourceError;
use std::future::Future;
use std::time::Duration;

/// Ceiling on any single backoff delay.
const MAX_DELAY_MS: u64 = 30_000;

/// Proportion of the exponential term used as the jitter range.
const JITTER_FACTOR: f64 = 0.3;

/// Retry configuration for a single source operation.
///
/// `max_attempts` counts retries, not total attempts: an operation runs
/// at most `max_attempts + 1` times.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay applied before retry number `retry` (1-based).
    ///
    /// Computed as `base * 2^retry` plus a uniform jitter in
    /// `[0, 0.3 * base * 2^retry)`, capped at 30 seconds. Saturating
    /// arithmetic keeps large retry counts at the cap instead of
    /// overflowing.
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let exponential = base_ms.saturating_mul(1u64.checked_shl(retry).unwrap_or(u64::MAX));
        let jitter_range = (exponential as f64 * JITTER_FACTOR).min(MAX_DELAY_MS as f64);
        let jitter = if jitter_range > 0.0 {
            (rand::random::<f64>() * jitter_range) as u64
        } else {
            0
        };
        Duration::from_millis(exponential.saturating_add(jitter).min(MAX_DELAY_MS))
    }

    /// Runs `op`, retrying on retryable errors up to `max_attempts` times.
    ///
    /// Terminal errors (see [`SourceError::is_retryable`]) surface
    /// immediately. Each retry waits [`backoff_delay`](Self::backoff_delay)
    /// first.
    pub async fn execute<T, Op, Fut>(&self, mut op: Op) -> Result<T, SourceError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut retry = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.max_attempts => {
                    retry += 1;
                    let delay = self.backoff_delay(retry);
                    tracing::warn!(
                        retry,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "source operation failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
