//! Exponential-backoff retry for flaky outbound calls.
//!
//! [`retry_with_backoff`] retries blindly up to the cap without classifying
//! errors; the delay doubles each attempt with no jitter. Rate-limit handling
//! ([`is_rate_limit_error`] / [`handle_rate_limit`]) is a separate path that
//! callers invoke explicitly; it is never composed into the retry loop.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

pub const DEFAULT_MAX_RETRIES: usize = 3;
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(1000);

/// Call `f` up to `max_retries` times, sleeping `initial_delay * 2^attempt`
/// between attempts. Returns the last error once attempts are exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(
    mut f: F,
    max_retries: usize,
    initial_delay: Duration,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last_error = None;

    for attempt in 0..max_retries {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < max_retries - 1 {
                    let delay = initial_delay * 2u32.pow(attempt as u32);
                    warn!(
                        attempt = attempt + 1,
                        max = max_retries,
                        ?delay,
                        error = %e,
                        "Attempt failed; backing off"
                    );
                    last_error = Some(e);
                    sleep(delay).await;
                } else {
                    warn!(attempt = attempt + 1, max = max_retries, error = %e, "Retries exhausted");
                    last_error = Some(e);
                }
            }
        }
    }

    Err(last_error.expect("max_retries must be at least 1"))
}

/// Convenience wrapper with the default cap and initial delay.
pub async fn retry<T, E, F, Fut>(f: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    retry_with_backoff(f, DEFAULT_MAX_RETRIES, DEFAULT_INITIAL_DELAY).await
}

/// Recognize HTTP 429 responses and common rate-limit message patterns.
pub fn is_rate_limit_error(status: Option<reqwest::StatusCode>, message: &str) -> bool {
    if status == Some(reqwest::StatusCode::TOO_MANY_REQUESTS) {
        return true;
    }
    let lower = message.to_lowercase();
    lower.contains("rate limit") || lower.contains("too many requests")
}

/// Sleep for a `Retry-After`-derived duration (seconds; 60 when absent or
/// unparseable). Invoked explicitly by callers that hit a rate limit.
pub async fn handle_rate_limit(retry_after: Option<&str>) {
    let secs = retry_after
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60);
    debug!(secs, "Rate limited; waiting before retry");
    sleep(Duration::from_secs(secs)).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_two_failures_with_doubling_delays() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);
        let start = Instant::now();

        let result = retry_with_backoff(
            move || {
                let calls = Arc::clone(&calls2);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err("transient")
                    } else {
                        Ok("success")
                    }
                }
            },
            3,
            Duration::from_millis(1000),
        )
        .await;

        assert_eq!(result, Ok("success"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1000ms after attempt 0, 2000ms after attempt 1
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_last_error_when_exhausted() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls2 = Arc::clone(&calls);

        let result: Result<(), String> = retry_with_backoff(
            move || {
                let calls = Arc::clone(&calls2);
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    Err(format!("failure {n}"))
                }
            },
            3,
            Duration::from_millis(10),
        )
        .await;

        assert_eq!(result, Err("failure 2".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_try_success_does_not_sleep() {
        let result: Result<i32, &str> =
            retry_with_backoff(|| async { Ok(42) }, 3, Duration::from_secs(60)).await;
        assert_eq!(result, Ok(42));
    }

    #[test]
    fn rate_limit_detection() {
        assert!(is_rate_limit_error(
            Some(reqwest::StatusCode::TOO_MANY_REQUESTS),
            ""
        ));
        assert!(is_rate_limit_error(None, "GitHub API rate limit exceeded"));
        assert!(is_rate_limit_error(None, "Too Many Requests"));
        assert!(!is_rate_limit_error(
            Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
            "boom"
        ));
    }
}
