//! Bounded retry with exponential back-off and jitter.
//!
//! Only transient communication failures are retried (see
//! [`CommunicationError::is_transient`]). Everything else, including
//! `LocationNotFound` and non-429 4xx responses, is returned on the first
//! occurrence.

use std::future::Future;
use std::time::Duration;

use fotd_core::{CommunicationError, FlavorError};

const MAX_BACKOFF_MS: u64 = 60_000;
const MAX_RATE_LIMIT_WAIT: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first, at least 1.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry.
    pub backoff_base: Duration,
    /// Wait after a 429 that carried no `Retry-After` hint.
    pub rate_limit_fallback: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base: Duration::from_millis(1000),
            rate_limit_fallback: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Back-off before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at 60 s, with ±25 % jitter.
    fn backoff(&self, retry: u32) -> Duration {
        let base_ms = u64::try_from(self.backoff_base.as_millis()).unwrap_or(u64::MAX);
        let computed = base_ms.saturating_mul(1u64 << (retry.saturating_sub(1)).min(10));
        let capped = computed.min(MAX_BACKOFF_MS);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
        Duration::from_millis(delay_ms)
    }

    /// Rate-limited responses wait at least as long as the server asked, or
    /// the fallback when it did not say.
    fn delay_for(&self, err: &CommunicationError, retry: u32) -> Duration {
        let backoff = self.backoff(retry);
        match err {
            CommunicationError::RateLimited {
                retry_after_secs, ..
            } => {
                let hinted = retry_after_secs
                    .map_or(self.rate_limit_fallback, Duration::from_secs)
                    .min(MAX_RATE_LIMIT_WAIT);
                backoff.max(hinted)
            }
            _ => backoff,
        }
    }
}

/// Runs `operation` until it succeeds, fails permanently, or uses up
/// `policy.max_attempts`.
///
/// When attempts run out the last transient error is wrapped in
/// [`CommunicationError::RetriesExhausted`].
///
/// # Errors
///
/// Returns the first non-transient error unchanged, or the wrapped last
/// transient error.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, FlavorError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FlavorError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(FlavorError::Communication(err)) if err.is_transient() => err,
            Err(err) => return Err(err),
        };

        if attempt >= max_attempts {
            return Err(FlavorError::Communication(
                CommunicationError::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(err),
                },
            ));
        }

        let delay = policy.delay_for(&err, attempt);
        tracing::warn!(
            attempt,
            max_attempts,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient upstream error, retrying after back-off"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use fotd_core::ErrorKind;
    use tokio::time::Instant;

    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_base: Duration::ZERO,
            rate_limit_fallback: Duration::ZERO,
        }
    }

    fn timeout() -> FlavorError {
        FlavorError::Communication(CommunicationError::Timeout {
            url: "https://example.com".to_owned(),
        })
    }

    fn status(status: u16) -> FlavorError {
        FlavorError::Communication(CommunicationError::UnexpectedStatus {
            status,
            url: "https://example.com".to_owned(),
        })
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&policy(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, FlavorError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&policy(3), || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(timeout())
                } else {
                    Ok::<u32, FlavorError>(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_at_max_attempts_and_wraps_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&policy(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(status(503))
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let err = result.unwrap_err();
        assert!(
            matches!(
                err,
                FlavorError::Communication(CommunicationError::RetriesExhausted { attempts: 3, .. })
            ),
            "expected RetriesExhausted, got: {err:?}"
        );
        assert_eq!(err.status(), Some(503));
    }

    #[tokio::test]
    async fn single_attempt_policy_still_wraps() {
        let result = retry_with_backoff(&policy(1), || async { Err::<u32, _>(timeout()) }).await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.to_string().contains("1 attempts"));
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        for code in [400, 403, 404, 422] {
            let calls = Arc::new(AtomicU32::new(0));
            let c = Arc::clone(&calls);
            let result = retry_with_backoff(&policy(3), || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(status(code))
                }
            })
            .await;
            assert_eq!(calls.load(Ordering::SeqCst), 1, "{code} must not be retried");
            assert_eq!(result.unwrap_err().status(), Some(code));
        }
    }

    #[tokio::test]
    async fn does_not_retry_location_not_found() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&policy(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(FlavorError::location_not_found("nowhere"))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(FlavorError::LocationNotFound { .. })));
    }

    #[tokio::test]
    async fn does_not_retry_malformed_responses() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&policy(3), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(FlavorError::malformed("locator", "expected value"))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.unwrap_err().kind(), ErrorKind::Communication);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_waits_for_server_hint() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let start = Instant::now();
        let result = retry_with_backoff(&policy(2), || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(FlavorError::Communication(CommunicationError::RateLimited {
                        url: "https://example.com".to_owned(),
                        retry_after_secs: Some(7),
                    }))
                } else {
                    Ok::<u32, FlavorError>(1)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
        assert!(start.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_without_hint_uses_fallback() {
        let policy = RetryPolicy {
            max_attempts: 2,
            backoff_base: Duration::ZERO,
            rate_limit_fallback: Duration::from_secs(30),
        };
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let start = Instant::now();
        let _ = retry_with_backoff(&policy, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(FlavorError::Communication(CommunicationError::RateLimited {
                    url: "https://example.com".to_owned(),
                    retry_after_secs: None,
                }))
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[test]
    fn backoff_doubles_within_jitter_bounds() {
        let policy = RetryPolicy {
            backoff_base: Duration::from_millis(1000),
            ..RetryPolicy::default()
        };
        for (retry, nominal) in [(1u32, 1000u64), (2, 2000), (3, 4000)] {
            let ms = u64::try_from(policy.backoff(retry).as_millis()).unwrap();
            assert!(ms >= nominal * 3 / 4 && ms <= nominal * 5 / 4, "retry {retry}: {ms}ms");
        }
    }

    #[test]
    fn backoff_is_capped() {
        let policy = RetryPolicy {
            backoff_base: Duration::from_secs(50),
            ..RetryPolicy::default()
        };
        let ms = u64::try_from(policy.backoff(8).as_millis()).unwrap();
        assert!(ms <= MAX_BACKOFF_MS * 5 / 4);
    }
}
