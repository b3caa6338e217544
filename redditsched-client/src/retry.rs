//! Call wrappers: classification, retries, and cancellation.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use redditsched_core::{ClassifiedError, classify};
use redditsched_store::Settings;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ApiError;

/// Predicate deciding whether a classified failure is retried.
pub type RetryCondition = Arc<dyn Fn(&ClassifiedError) -> bool + Send + Sync>;

/// Retry policy for idempotent calls.
#[derive(Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay after the first failed attempt; doubles each time.
    pub base_delay: Duration,
    retry_condition: RetryCondition,
}

impl std::fmt::Debug for RetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryConfig")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .finish_non_exhaustive()
    }
}

impl RetryConfig {
    /// Creates a policy with the default condition.
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            retry_condition: Arc::new(ClassifiedError::is_transient),
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Replaces the retry condition.
    #[must_use]
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&ClassifiedError) -> bool + Send + Sync + 'static,
    {
        self.retry_condition = Arc::new(condition);
        self
    }

    /// Returns true if `error` should be retried.
    pub fn should_retry(&self, error: &ClassifiedError) -> bool {
        (self.retry_condition)(error)
    }

    /// Delay after failed attempt `attempt` (0-indexed): `base * 2^attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

impl From<&Settings> for RetryConfig {
    fn from(settings: &Settings) -> Self {
        Self::new(settings.max_retries, settings.retry_base_delay())
    }
}

// ============================================================================
// Wrappers
// ============================================================================

/// Runs `call`, classifying raw transport failures.
///
/// Every other outcome passes through unchanged.
///
/// # Errors
///
/// Returns the call's error, with [`ApiError::Transport`] replaced by
/// [`ApiError::Classified`].
pub async fn with_error_handling<F, Fut, T>(call: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    call().await.map_err(|err| match err {
        ApiError::Transport(raw) => {
            let classified = classify(&raw);
            debug!(code = %classified.code, status = ?classified.status, "Request failed");
            ApiError::Classified(classified)
        }
        other => other,
    })
}

/// Runs `call` under [`with_error_handling`], retrying classified failures
/// that satisfy the policy's condition.
///
/// # Errors
///
/// Returns the last classified error once retries are exhausted, or the
/// first error that is not retryable.
pub async fn with_retry<F, Fut, T>(mut call: F, config: &RetryConfig) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 0;
    loop {
        match with_error_handling(&mut call).await {
            Err(ApiError::Classified(err))
                if attempt < config.max_retries && config.should_retry(&err) =>
            {
                let delay = config.delay_for_attempt(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    code = %err.code,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            outcome => return outcome,
        }
    }
}

/// Runs `future` until it completes or `token` is cancelled.
///
/// # Errors
///
/// Returns [`ApiError::Cancelled`] if the token fires first, otherwise the
/// future's own error.
pub async fn with_cancellation<Fut, T>(token: &CancellationToken, future: Fut) -> Result<T, ApiError>
where
    Fut: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => {
            debug!("Call cancelled");
            Err(ApiError::Cancelled)
        }
        outcome = future => outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redditsched_core::{AuthenticationRequiredError, ErrorCode, TransportError};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn failing(
        calls: &AtomicU32,
        error: TransportError,
    ) -> impl FnMut() -> std::future::Ready<Result<(), ApiError>> + '_ {
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Err(ApiError::Transport(error.clone())))
        }
    }

    #[test]
    fn test_delay_doubles() {
        let config = RetryConfig::default();
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(4000));
        assert_eq!(config.delay_for_attempt(64), Duration::MAX);
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            max_retries: 5,
            retry_base_delay_ms: 250,
            ..Settings::default()
        };
        let config = RetryConfig::from(&settings);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.base_delay, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_error_handling_classifies_transport_errors() {
        let err = with_error_handling(|| async {
            Err::<(), _>(ApiError::Transport(TransportError::status(
                404,
                json!({"error": "Post not found"}),
            )))
        })
        .await
        .unwrap_err();

        let classified = err.classified().unwrap();
        assert_eq!(classified.code, ErrorCode::NotFound);
        assert_eq!(classified.message, "Post not found");
    }

    #[tokio::test]
    async fn test_error_handling_passes_other_errors() {
        let err = with_error_handling(|| async {
            Err::<(), _>(ApiError::AuthenticationRequired(
                AuthenticationRequiredError::default(),
            ))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::AuthenticationRequired(_)));

        let ok = with_error_handling(|| async { Ok::<_, ApiError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_retry_until_exhausted() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let err = with_retry(
            failing(&calls, TransportError::status(503, json!({}))),
            &RetryConfig::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(err.classified().unwrap().code, ErrorCode::ServerError);
        // 1s + 2s + 4s of backoff
        assert!(start.elapsed() >= Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_errors_retry() {
        let calls = AtomicU32::new(0);

        let err = with_retry(
            failing(&calls, TransportError::Network("unreachable".to_string())),
            &RetryConfig::new(2, Duration::from_millis(10)),
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.code(), Some(ErrorCode::NetworkError));
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_errors_do_not_retry() {
        let calls = AtomicU32::new(0);

        let err = with_retry(
            failing(&calls, TransportError::status(400, json!({"error": "Invalid cron"}))),
            &RetryConfig::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(err.classified().unwrap().code, ErrorCode::BadRequest);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let calls = AtomicU32::new(0);

        let value = with_retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        Err(ApiError::Transport(TransportError::Timeout("slow".to_string())))
                    } else {
                        Ok("ok")
                    }
                }
            },
            &RetryConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(value, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_condition() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new(2, Duration::from_millis(1))
            .with_condition(|e| e.code == ErrorCode::RateLimitExceeded);

        let _ = with_retry(
            failing(&calls, TransportError::status(429, json!({}))),
            &config,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation() {
        let token = CancellationToken::new();
        let child = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            child.cancel();
        });

        let err = with_cancellation(&token, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, ApiError>(())
        })
        .await
        .unwrap_err();

        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_uncancelled_call_completes() {
        let token = CancellationToken::new();
        let value = with_cancellation(&token, async { Ok::<_, ApiError>(1) }).await;
        assert_eq!(value.unwrap(), 1);
    }
}
