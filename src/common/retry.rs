use std::fmt::Display;
use std::time::Duration;

use futures::future::BoxFuture;
use tracing::{debug, error, warn};

/// Retry an async operation with a pluggable backoff strategy.
///
/// The operation is attempted up to `max_attempts` times; the final error is
/// returned unchanged so callers keep their own error type.
pub async fn with_retry_and_backoff<T, E, F, B>(
    operation: F,
    max_attempts: usize,
    log_context: &str,
    backoff_fn: B,
) -> Result<T, E>
where
    F: Fn() -> BoxFuture<'static, Result<T, E>> + Send + Sync,
    E: Display + Send,
    B: Fn(usize) -> Duration + Send + Sync,
    T: Send,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded after {} attempts", log_context, attempt);
                }
                return Ok(value);
            }
            Err(e) if attempt >= max_attempts => {
                error!("{} failed after {} attempts: {}", log_context, attempt, e);
                return Err(e);
            }
            Err(e) => {
                let delay = backoff_fn(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    log_context, attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Constant backoff duration
pub fn constant_backoff(duration_ms: u64) -> impl Fn(usize) -> Duration + Send + Sync {
    move |_| Duration::from_millis(duration_ms)
}

/// Exponential backoff: base * 2^(attempt-1), with an optional cap
pub fn exponential_backoff(
    base_ms: u64,
    max_ms: Option<u64>,
) -> impl Fn(usize) -> Duration + Send + Sync {
    move |attempt| {
        let delay = base_ms * 2u64.pow((attempt - 1) as u32);
        match max_ms {
            Some(max) => Duration::from_millis(delay.min(max)),
            None => Duration::from_millis(delay),
        }
    }
}

/// Add up to 25% jitter to any backoff function to avoid thundering herds
pub fn with_jitter<F>(backoff_fn: F) -> impl Fn(usize) -> Duration + Send + Sync
where
    F: Fn(usize) -> Duration + Send + Sync,
{
    move |attempt| {
        let delay = backoff_fn(attempt);
        let jitter_factor = fastrand::f64() * 0.25;
        let jitter_ms = (delay.as_millis() as f64 * jitter_factor) as u64;
        delay + Duration::from_millis(jitter_ms)
    }
}
