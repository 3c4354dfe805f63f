//! RateLimiter & Retry (spec §4.11, C12). A counting semaphore bounds
//! in-flight provider calls; a retry wrapper re-attempts a fallible async
//! operation with exponential backoff and jitter. Grounded on
//! `tokio::sync::Semaphore` (already transitively pulled in by the teacher's
//! `tokio = { features = ["full"] }`) plus the defensive `reqwest`
//! error-handling shape already present in `oracle::mod.rs`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Semaphore, SemaphorePermit};
use tokio::time::sleep;

use crate::core::errors::Result;

pub const MAX_ATTEMPTS: u32 = 3;
pub const BASE_DELAY: Duration = Duration::from_secs(30);
pub const BACKOFF_FACTOR: u32 = 2;
pub const JITTER_FRACTION: f64 = 0.2;

/// Bounds concurrent in-flight provider calls.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
}

impl RateLimiter {
    pub fn new(max_concurrency: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(max_concurrency.max(1))) }
    }

    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.semaphore.acquire().await.expect("semaphore never closed")
    }
}

/// Invoked before each retry sleep, `(attempt, delay_ms, reason)` (spec
/// §4.11 `onRetry`).
pub type OnRetry<'a> = dyn Fn(u32, u64, &str) + Send + Sync + 'a;

/// Default retryable predicate: HTTP 429/500/503/529 and connection errors,
/// detected by substring match against the error's display text (providers
/// may supply their own predicate).
pub fn default_is_retryable(error_text: &str) -> bool {
    ["429", "500", "503", "529", "connection"].iter().any(|needle| error_text.contains(needle))
}

/// Retries `operation` up to `MAX_ATTEMPTS` times with base delay 30s,
/// exponential factor 2 (30/60/120s), plus ±20% jitter. `on_retry` fires
/// before each sleep, never after the final failed attempt.
pub async fn retry_with_backoff<T, F, Fut>(
    mut operation: F,
    is_retryable: impl Fn(&str) -> bool,
    on_retry: Option<&OnRetry<'_>>,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                let text = err.to_string();
                if attempt >= MAX_ATTEMPTS || !is_retryable(&text) {
                    return Err(err);
                }

                let delay = backoff_delay(attempt);
                if let Some(cb) = on_retry {
                    cb(attempt, delay.as_millis() as u64, &text);
                }
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// `base * factor^(attempt-1)` with ±20% jitter applied multiplicatively.
fn backoff_delay(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1);
    let base_secs = BASE_DELAY.as_secs_f64() * (BACKOFF_FACTOR as f64).powi(exponent as i32);
    let jitter = rand::thread_rng().gen_range(-JITTER_FRACTION..=JITTER_FRACTION);
    let jittered = (base_secs * (1.0 + jitter)).max(0.0);
    Duration::from_secs_f64(jittered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn default_retryable_matches_spec_codes() {
        assert!(default_is_retryable("status 429 too many requests"));
        assert!(default_is_retryable("503 service unavailable"));
        assert!(!default_is_retryable("400 bad request"));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_up_to_max_attempts_then_gives_up() {
        let attempts = AtomicU32::new(0);
        let retry_calls = AtomicU32::new(0);

        let result: Result<()> = retry_with_backoff(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(crate::core::errors::HandoverError::provider("PROVIDER_UNKNOWN", "429 rate limited")) }
            },
            |_| true,
            Some(&|_attempt, _delay_ms, _reason| {
                retry_calls.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), MAX_ATTEMPTS);
        assert_eq!(retry_calls.load(Ordering::SeqCst), MAX_ATTEMPTS - 1);
    }

    #[tokio::test]
    async fn succeeds_without_retry_when_first_attempt_works() {
        let result: Result<i32> = retry_with_backoff(|| async { Ok(42) }, |_| true, None).await;
        assert_eq!(result.unwrap(), 42);
    }
}
