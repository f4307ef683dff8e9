//! `ListObjectsV2` listing backend.

use as3_error::{ErrorCategory, ListingError};
use as3_traits::ListingClient;
use as3_types::{ListPage, ObjectRecord};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use std::fmt;
use tracing::debug;

use super::retry::{RetryConfig, with_retry};

/// S3 error codes meaning the bucket or prefix is inaccessible or absent.
const ACCESS_OR_NOT_FOUND_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "InvalidBucketName",
    "NoSuchBucket",
    "NoSuchKey",
];

/// S3 error codes for transient conditions, some of which come back as 4xx.
const TRANSIENT_CODES: &[&str] = &[
    "InternalError",
    "RequestTimeout",
    "RequestLimitExceeded",
    "ServiceUnavailable",
    "SlowDown",
    "Throttling",
    "ThrottlingException",
];

/// S3 error codes for requests that will fail the same way if repeated.
const MALFORMED_REQUEST_CODES: &[&str] = &[
    "AuthorizationHeaderMalformed",
    "ExpiredToken",
    "InvalidAccessKeyId",
    "InvalidArgument",
    "InvalidRequest",
    "InvalidToken",
    "MalformedXML",
    "SignatureDoesNotMatch",
];

/// A failed attempt together with its retry category.
#[derive(Debug)]
struct S3Failure {
    error: ListingError,
    category: ErrorCategory,
}

impl fmt::Display for S3Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

/// Listing backend over an S3 client.
#[derive(Debug, Clone)]
pub struct S3Listing {
    client: Client,
    retry: RetryConfig,
}

impl S3Listing {
    /// Wrap an S3 client with the default retry policy.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry: RetryConfig::default(),
        }
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn list_once(
        &self,
        container: &str,
        prefix: &str,
        delimiter: Option<char>,
        continuation: Option<&str>,
    ) -> Result<ListPage, S3Failure> {
        let mut req = self
            .client
            .list_objects_v2()
            .bucket(container)
            .prefix(prefix);

        if let Some(delimiter) = delimiter {
            req = req.delimiter(delimiter.to_string());
        }
        if let Some(token) = continuation {
            req = req.continuation_token(token);
        }

        let resp = req.send().await.map_err(|e| {
            let status = e.raw_response().map(|r| r.status().as_u16());
            S3Failure {
                error: classify_s3_failure(e.code(), status, &DisplayErrorContext(&e).to_string()),
                category: s3_failure_category(e.code(), status),
            }
        })?;

        let items = resp
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?;
                let size = obj.size().unwrap_or(0).max(0) as u64;
                Some(ObjectRecord::new(key, size))
            })
            .collect();

        let group_prefixes = resp
            .common_prefixes()
            .iter()
            .filter_map(|cp| cp.prefix().map(str::to_string))
            .collect();

        let next_token = if resp.is_truncated() == Some(true) {
            resp.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage {
            items,
            group_prefixes,
            next_token,
        })
    }
}

#[async_trait]
impl ListingClient for S3Listing {
    async fn list(
        &self,
        container: &str,
        prefix: &str,
        delimiter: Option<char>,
        continuation: Option<&str>,
    ) -> Result<ListPage, ListingError> {
        let page = with_retry(
            &self.retry,
            "list_objects_v2",
            |failure: &S3Failure| failure.category,
            || self.list_once(container, prefix, delimiter, continuation),
        )
        .await
        .map_err(|failure| failure.error)?;

        debug!(
            bucket = container,
            prefix = prefix,
            delimited = delimiter.is_some(),
            objects = page.items.len(),
            folders = page.group_prefixes.len(),
            truncated = page.has_more(),
            "ListObjectsV2"
        );

        Ok(page)
    }
}

/// Map a failed S3 call to a listing error.
pub fn classify_s3_failure(code: Option<&str>, status: Option<u16>, message: &str) -> ListingError {
    let access_code = code.is_some_and(|c| ACCESS_OR_NOT_FOUND_CODES.contains(&c));
    let access_status = matches!(status, Some(403 | 404));

    if access_code || access_status {
        ListingError::AccessOrNotFound(message.to_string())
    } else {
        ListingError::Failed(message.to_string())
    }
}

/// Whether a failed S3 call is worth repeating, judged by its error code and
/// HTTP status. Calls that never got a response are retryable.
pub fn s3_failure_category(code: Option<&str>, status: Option<u16>) -> ErrorCategory {
    if let Some(code) = code {
        if TRANSIENT_CODES.contains(&code) {
            return ErrorCategory::Retryable;
        }
        if ACCESS_OR_NOT_FOUND_CODES.contains(&code) || MALFORMED_REQUEST_CODES.contains(&code) {
            return ErrorCategory::Fatal;
        }
    }

    match status {
        Some(408 | 429) => ErrorCategory::Retryable,
        Some(400..=499) => ErrorCategory::Fatal,
        _ => ErrorCategory::Retryable,
    }
}
