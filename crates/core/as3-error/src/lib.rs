//! Error types and classification for the as3 prefix crawler.
//!
//! This crate provides:
//! - [`CrawlError`] - Top-level error enum for a crawl
//! - [`ListingError`] - Failures reported by a listing backend
//! - [`ErrorCategory`] for retry decisions inside listing backends

use thiserror::Error;

/// Top-level error type for a crawl.
#[derive(Error, Debug)]
pub enum CrawlError {
    /// The listing backend rejected or failed a list call
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    /// A crawl task could not be spawned or terminated without a result
    #[error("Scheduling error: {0}")]
    Scheduling(String),

    /// Invalid crawl parameters
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CrawlError {
    /// Whether this error means the container or prefix is inaccessible or absent.
    pub fn is_access_or_not_found(&self) -> bool {
        matches!(self, Self::Listing(e) if e.is_access_or_not_found())
    }
}

/// Errors surfaced by a listing backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListingError {
    /// Container or prefix is inaccessible (403) or does not exist (404)
    #[error("Access denied or not found: {0}")]
    AccessOrNotFound(String),

    /// Any other failure, including timeouts and throttling
    #[error("List call failed: {0}")]
    Failed(String),
}

impl ListingError {
    /// Whether the backend reported an access or not-found condition.
    pub fn is_access_or_not_found(&self) -> bool {
        matches!(self, Self::AccessOrNotFound(_))
    }
}

/// Error classification for retry decisions.
///
/// The crawler itself never retries. Listing backends that wrap a remote
/// service use this to decide whether a failed call is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient error - retry with exponential backoff
    ///
    /// Examples: network timeout, 503, SlowDown
    Retryable,

    /// Permanent error - surface immediately
    ///
    /// Examples: access denied, missing bucket
    Fatal,
}

/// Classifies a listing error from its kind and message.
///
/// Backends that know the service's error code or status should classify on
/// those instead; message text only recognises well-known error code names.
pub fn classify_listing_error(error: &ListingError) -> ErrorCategory {
    match error {
        ListingError::AccessOrNotFound(_) => ErrorCategory::Fatal,
        ListingError::Failed(message) => classify_message(message),
    }
}

/// Classifies a crawl error. Only listing failures can ever be retryable.
pub fn classify_error(error: &CrawlError) -> ErrorCategory {
    match error {
        CrawlError::Listing(e) => classify_listing_error(e),
        CrawlError::Scheduling(_) | CrawlError::Config(_) => ErrorCategory::Fatal,
    }
}

fn classify_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();

    if lower.contains("invalidrequest")
        || lower.contains("invalidargument")
        || lower.contains("malformed")
    {
        return ErrorCategory::Fatal;
    }

    // Throttling, 5xx, timeouts, dropped connections and anything unknown
    ErrorCategory::Retryable
}

/// Result type alias using CrawlError.
pub type Result<T> = std::result::Result<T, CrawlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_or_not_found_is_fatal() {
        let error = ListingError::AccessOrNotFound("NoSuchBucket: missing".to_string());
        assert!(error.is_access_or_not_found());
        assert_eq!(classify_listing_error(&error), ErrorCategory::Fatal);
    }

    #[test]
    fn test_transient_failures_are_retryable() {
        for message in ["SlowDown: reduce request rate", "503 Service Unavailable", "timeout"] {
            let error = ListingError::Failed(message.to_string());
            assert_eq!(
                classify_listing_error(&error),
                ErrorCategory::Retryable,
                "{message}"
            );
        }
    }

    #[test]
    fn test_bad_request_is_fatal() {
        let error = ListingError::Failed("InvalidArgument: bad continuation token".to_string());
        assert_eq!(classify_listing_error(&error), ErrorCategory::Fatal);
    }

    #[test]
    fn test_crawl_error_wraps_listing_error() {
        let error: CrawlError = ListingError::AccessOrNotFound("AccessDenied".to_string()).into();
        assert!(error.is_access_or_not_found());
        assert!(error.to_string().contains("Access denied or not found"));
        assert_eq!(classify_error(&error), ErrorCategory::Fatal);
    }

    #[test]
    fn test_scheduling_error_is_fatal() {
        let error = CrawlError::Scheduling("task panicked".to_string());
        assert!(!error.is_access_or_not_found());
        assert_eq!(classify_error(&error), ErrorCategory::Fatal);
        assert_eq!(error.to_string(), "Scheduling error: task panicked");
    }

    #[test]
    fn test_digits_in_message_do_not_make_a_failure_fatal() {
        let error = ListingError::Failed("SlowDown: request id 4000ABC, 400 bytes".to_string());
        assert_eq!(classify_listing_error(&error), ErrorCategory::Retryable);
    }

    #[test]
    fn test_config_error_is_fatal() {
        let error = CrawlError::Config("parallelism must be at least 1".to_string());
        assert_eq!(classify_error(&error), ErrorCategory::Fatal);
    }
}
