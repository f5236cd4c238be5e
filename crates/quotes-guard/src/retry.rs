//! Bounded retry with exponential backoff and jitter.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use quotes_core::{QuoteError, Result};

/// Backoff schedule for retrying a fallible operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Number of re-attempts after the initial call.
    pub max_retries: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`
    /// plus up to half of `base` in jitter, capped at `max_delay`.
    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2_u32.saturating_pow(attempt));
        let jitter_ceiling = (self.base_delay / 2).as_millis() as u64;
        let jitter = if jitter_ceiling == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ceiling))
        };
        (exp + jitter).min(self.max_delay)
    }
}

/// Runs `op`, retrying transient failures per `policy`.
///
/// Non-transient errors (see [`QuoteError::is_transient`]) propagate
/// immediately; otherwise the last error is returned once the retry budget
/// is exhausted. `label` names the operation in log output.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &BackoffPolicy,
    label: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_transient() => {
                debug!(label, error = %e, "Not retryable, giving up");
                return Err(e);
            }
            Err(e) if attempt >= policy.max_retries => {
                warn!(label, attempts = attempt + 1, error = %e, "Retry budget exhausted");
                return Err(e);
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                debug!(label, attempt, ?delay, error = %e, "Retrying after backoff");
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
