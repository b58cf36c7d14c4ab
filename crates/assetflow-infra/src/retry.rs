//! Retry policy shared by the upload and persist stages
//!
//! Delay for retry `n` (0-based) is `base * 2^n`, plus uniform jitter of up
//! to 25% of that delay, capped at [`MAX_RETRY_BACKOFF_MS`].

use assetflow_core::PipelineConfig;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

pub const MAX_RETRY_BACKOFF_MS: u64 = 60_000;
const JITTER_RATIO: f64 = 0.25;

/// Backoff in milliseconds for a given retry count (exponential with cap).
#[inline]
pub fn compute_backoff_ms(base_delay_ms: u64, retry: u32) -> u64 {
    let factor = 2_u64.checked_pow(retry).unwrap_or(u64::MAX);
    base_delay_ms
        .saturating_mul(factor)
        .min(MAX_RETRY_BACKOFF_MS)
}

fn with_jitter(delay_ms: u64) -> u64 {
    let max_jitter = (delay_ms as f64 * JITTER_RATIO) as u64;
    let jitter = if max_jitter == 0 {
        0
    } else {
        rand::rng().random_range(0..=max_jitter)
    };
    delay_ms.saturating_add(jitter).min(MAX_RETRY_BACKOFF_MS)
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Per-call timeout
    pub call_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.retry_base_delay_ms,
            call_timeout: config.call_timeout(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `retry` (0 for the first retry), jitter included.
    pub fn delay_for(&self, retry: u32) -> Duration {
        Duration::from_millis(with_jitter(compute_backoff_ms(self.base_delay_ms, retry)))
    }
}

/// Run `fut` under `timeout`; expiry is turned into an error by `on_timeout`.
pub async fn call_with_timeout<T, E, Fut>(
    timeout: Duration,
    fut: Fut,
    on_timeout: impl FnOnce(u64) -> E,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(on_timeout(timeout.as_millis() as u64)),
    }
}

/// Call `op` until it succeeds, fails with a non-transient error or the
/// policy runs out of retries. `op` receives the 1-based attempt number and
/// is responsible for its own per-call timeout.
///
/// Returns the value or the last error, together with the number of attempts made.
pub async fn retry_transient<T, E, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
    is_transient: impl Fn(&E) -> bool,
) -> (Result<T, E>, u32)
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(value) => return (Ok(value), attempt),
            Err(e) if is_transient(&e) && attempt < policy.max_attempts() => {
                let delay = policy.delay_for(attempt - 1);
                tracing::warn!(
                    operation,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return (Err(e), attempt),
        }
    }
}
