//! Retry logic for S3 listing calls.
//!
//! Provides exponential backoff with jitter for transient listing failures.

use as3_error::ErrorCategory;
use std::fmt::Display;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries before giving up.
    pub max_retries: u32,
    /// Initial backoff duration in milliseconds.
    pub initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds.
    pub max_backoff_ms: u64,
    /// Whether to add jitter to backoff times.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 10000,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the initial backoff in milliseconds.
    pub fn with_initial_backoff_ms(mut self, initial_backoff_ms: u64) -> Self {
        self.initial_backoff_ms = initial_backoff_ms;
        self
    }

    /// Set the maximum backoff in milliseconds.
    pub fn with_max_backoff_ms(mut self, max_backoff_ms: u64) -> Self {
        self.max_backoff_ms = max_backoff_ms;
        self
    }

    /// Enable or disable jitter.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Backoff before retry number `attempt + 1`.
    pub fn backoff_duration(&self, attempt: u32) -> Duration {
        let base_ms = self
            .initial_backoff_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        let capped_ms = base_ms.min(self.max_backoff_ms);

        let final_ms = if self.jitter {
            let jitter_range = capped_ms / 4; // 25% jitter
            let jitter = rand::rng().random_range(0..=jitter_range);
            capped_ms.saturating_add(jitter)
        } else {
            capped_ms
        };

        Duration::from_millis(final_ms)
    }
}

/// Run an operation, retrying failures that `classify` deems transient.
///
/// [`ErrorCategory::Fatal`] failures are returned immediately. Others are
/// retried up to `config.max_retries` times; the last failure is returned
/// once retries are exhausted.
pub async fn with_retry<F, Fut, T, E, C>(
    config: &RetryConfig,
    operation_name: &str,
    classify: C,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Display,
    C: Fn(&E) -> ErrorCategory,
{
    let mut attempt = 0;

    loop {
        let error = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if classify(&error) == ErrorCategory::Fatal {
            warn!(
                operation = operation_name,
                attempt = attempt,
                error = %error,
                "Non-retryable error"
            );
            return Err(error);
        }

        if attempt >= config.max_retries {
            warn!(
                operation = operation_name,
                attempts = attempt + 1,
                error = %error,
                "Retries exhausted"
            );
            return Err(error);
        }

        let backoff = config.backoff_duration(attempt);
        warn!(
            operation = operation_name,
            attempt = attempt,
            error = %error,
            backoff_ms = backoff.as_millis(),
            "Retryable error, backing off"
        );
        sleep(backoff).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use as3_error::{ListingError, classify_listing_error};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.initial_backoff_ms, 100);
        assert_eq!(config.max_backoff_ms, 10000);
        assert!(config.jitter);
    }

    #[test]
    fn test_backoff_duration_no_jitter() {
        let config = RetryConfig::new()
            .with_initial_backoff_ms(100)
            .with_max_backoff_ms(10000)
            .with_jitter(false);

        assert_eq!(config.backoff_duration(0), Duration::from_millis(100));
        assert_eq!(config.backoff_duration(1), Duration::from_millis(200));
        assert_eq!(config.backoff_duration(3), Duration::from_millis(800));
    }

    #[test]
    fn test_backoff_duration_capped() {
        let config = RetryConfig::new()
            .with_initial_backoff_ms(1000)
            .with_max_backoff_ms(2000)
            .with_jitter(false);

        assert_eq!(config.backoff_duration(1), Duration::from_millis(2000));
        assert_eq!(config.backoff_duration(64), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_jitter_bounded() {
        let config = RetryConfig::new()
            .with_initial_backoff_ms(100)
            .with_jitter(true);

        for _ in 0..20 {
            let backoff = config.backoff_duration(0);
            assert!(backoff >= Duration::from_millis(100));
            assert!(backoff <= Duration::from_millis(125));
        }
    }

    #[tokio::test]
    async fn test_with_retry_success_after_retry() {
        let config = RetryConfig::new()
            .with_initial_backoff_ms(1)
            .with_jitter(false);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(&config, "list", classify_listing_error, || {
            let count = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err(ListingError::Failed("503 SlowDown".to_string()))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_access_error_not_retried() {
        let config = RetryConfig::new();
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = with_retry(&config, "list", classify_listing_error, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ListingError::AccessOrNotFound("AccessDenied".to_string())) }
        })
        .await;

        assert!(result.unwrap_err().is_access_or_not_found());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_gives_up() {
        let config = RetryConfig::new()
            .with_max_retries(2)
            .with_initial_backoff_ms(1)
            .with_jitter(false);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = with_retry(&config, "list", classify_listing_error, || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(ListingError::Failed("timeout".to_string())) }
        })
        .await;

        assert_eq!(result, Err(ListingError::Failed("timeout".to_string())));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_uses_given_classifier() {
        let config = RetryConfig::new()
            .with_initial_backoff_ms(1)
            .with_jitter(false);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), String> = with_retry(
            &config,
            "list",
            |_: &String| ErrorCategory::Fatal,
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("SlowDown".to_string()) }
            },
        )
        .await;

        assert_eq!(result, Err("SlowDown".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
