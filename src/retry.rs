//! Bounded retry with exponential backoff for external provider calls.
//!
//! Every HTTP client in this crate takes a [`RetryPolicy`] at construction
//! instead of hard-coding attempt counts at call sites. The Meshy client
//! defaults to 5 attempts (SSL/transport flakiness on that endpoint is
//! frequent enough to warrant it); the Gemini client defaults to 3.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 5xx and transport errors are transient and frequent under
//! load. Exponential backoff (`base_backoff_ms * 2^(attempt-1)`) avoids
//! thundering-herd: with 500 ms base and 3 attempts the wait sequence is
//! 500 ms → 1 s, totalling < 2 s of back-off per call. Business errors
//! (4xx other than 429) are never retried.

use crate::error::WedcardError;
use reqwest::StatusCode;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Attempt bound and backoff base for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first call. Minimum 1.
    pub max_attempts: u32,
    /// Backoff before attempt 2; doubles after each further attempt.
    pub base_backoff_ms: u64,
}

impl RetryPolicy {
    /// Default for the text/image generation provider: 3 attempts, 500 ms base.
    pub fn gemini_default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 500,
        }
    }

    /// Default for the image-to-3D provider: 5 attempts, 1 s base.
    pub fn meshy_default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 1000,
        }
    }

    /// Backoff duration before the given attempt (attempts are 1-based;
    /// attempt 1 never waits).
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.base_backoff_ms * 2u64.pow(attempt - 2))
    }
}

/// How a single call attempt failed, from the retry loop's point of view.
#[derive(Debug)]
pub enum CallFailure {
    /// Network-level failure (connect, timeout, TLS). Always retried.
    Transport(reqwest::Error),
    /// Non-success HTTP status. Retried only for 429 and 5xx.
    Status { status: StatusCode, body: String },
    /// Domain-level failure that retrying cannot fix.
    Permanent(WedcardError),
}

/// 429 and 5xx are worth retrying; other statuses are business errors.
fn is_transient_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Run `op` under `policy`, retrying transient failures with backoff.
///
/// `op` receives the 1-based attempt number, mainly for logging. On
/// exhaustion the last transient failure is folded into
/// [`WedcardError::ProviderUnavailable`]; permanent failures surface
/// immediately.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    provider: &'static str,
    mut op: F,
) -> Result<T, WedcardError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, CallFailure>>,
{
    let max = policy.max_attempts.max(1);
    let mut last: Option<CallFailure> = None;

    for attempt in 1..=max {
        let wait = policy.backoff(attempt);
        if !wait.is_zero() {
            warn!(
                provider,
                attempt,
                max_attempts = max,
                backoff_ms = wait.as_millis() as u64,
                "retrying after transient failure"
            );
            sleep(wait).await;
        }

        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(CallFailure::Permanent(err)) => return Err(err),
            Err(CallFailure::Status { status, body }) if !is_transient_status(status) => {
                // Non-transient status: surface the provider's own message.
                return Err(WedcardError::ProviderRejected {
                    provider,
                    message: format!("HTTP {status}: {}", truncate(&body, 300)),
                });
            }
            Err(failure) => last = Some(failure),
        }
    }

    let detail = match last {
        Some(CallFailure::Transport(e)) => e.to_string(),
        Some(CallFailure::Status { status, body }) => {
            format!("HTTP {status}: {}", truncate(&body, 300))
        }
        _ => "unknown failure".to_string(),
    };
    Err(WedcardError::ProviderUnavailable {
        provider,
        attempts: max,
        detail,
    })
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_doubles() {
        let p = RetryPolicy {
            max_attempts: 4,
            base_backoff_ms: 500,
        };
        assert_eq!(p.backoff(1), Duration::ZERO);
        assert_eq!(p.backoff(2), Duration::from_millis(500));
        assert_eq!(p.backoff(3), Duration::from_millis(1000));
        assert_eq!(p.backoff(4), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 3,
            base_backoff_ms: 1,
        };
        let result = with_retry(&policy, "test", |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(CallFailure::Status {
                        status: StatusCode::SERVICE_UNAVAILABLE,
                        body: "overloaded".into(),
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 5,
            base_backoff_ms: 1,
        };
        let result: Result<(), _> = with_retry(&policy, "test", |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(CallFailure::Status {
                    status: StatusCode::BAD_REQUEST,
                    body: "bad prompt".into(),
                })
            }
        })
        .await;
        assert!(matches!(
            result,
            Err(WedcardError::ProviderRejected { .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_reports_attempt_count() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_backoff_ms: 1,
        };
        let result: Result<(), _> = with_retry(&policy, "meshy", |_| async {
            Err(CallFailure::Status {
                status: StatusCode::BAD_GATEWAY,
                body: String::new(),
            })
        })
        .await;
        match result {
            Err(WedcardError::ProviderUnavailable {
                provider, attempts, ..
            }) => {
                assert_eq!(provider, "meshy");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
