//! S3 listing backend.
//!
//! - Client configuration with LocalStack support
//! - `ListObjectsV2` pages with retry and error mapping

mod client;
mod listing;
mod retry;

pub use client::{S3Config, create_s3_client};
pub use listing::{S3Listing, classify_s3_failure, s3_failure_category};
pub use retry::{RetryConfig, with_retry};
