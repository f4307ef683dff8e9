//! S3 client configuration and creation.

use as3_error::Result;
use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig as SdkRetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for S3 access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// AWS region
    pub region: Option<String>,

    /// Custom endpoint URL (for LocalStack)
    pub endpoint: Option<String>,

    /// Explicit AWS access key (optional)
    pub access_key: Option<String>,

    /// Explicit AWS secret key (optional)
    pub secret_key: Option<String>,

    /// AWS profile name (optional)
    pub profile: Option<String>,

    /// Per-call timeout in seconds
    pub timeout_secs: u64,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            access_key: None,
            secret_key: None,
            profile: None,
            timeout_secs: 30,
        }
    }
}

impl S3Config {
    /// Create a new S3Config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom endpoint (for LocalStack).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the AWS region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set explicit credentials.
    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    /// Set the AWS profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the per-call timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Create an S3 client from configuration.
///
/// SDK-level retries are disabled; [`S3Listing`](super::S3Listing) retries
/// with its own policy so that every attempt is visible in the logs.
pub async fn create_s3_client(config: &S3Config) -> Result<Client> {
    use aws_config::Region;

    let mut aws_config_loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(SdkRetryConfig::disabled())
        .timeout_config(
            TimeoutConfig::builder()
                .operation_attempt_timeout(Duration::from_secs(config.timeout_secs))
                .build(),
        );

    if let Some(region) = &config.region {
        aws_config_loader = aws_config_loader.region(Region::new(region.clone()));
    }

    if let Some(endpoint) = &config.endpoint {
        aws_config_loader = aws_config_loader.endpoint_url(endpoint);
    }

    if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
        let credentials =
            aws_sdk_s3::config::Credentials::new(access_key, secret_key, None, None, "as3");
        aws_config_loader = aws_config_loader.credentials_provider(credentials);
    }

    if let Some(profile) = &config.profile {
        aws_config_loader = aws_config_loader.profile_name(profile);
    }

    let aws_config = aws_config_loader.load().await;

    // Path-style addressing for custom endpoints (LocalStack)
    let s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);
    let s3_config = if config.endpoint.is_some() {
        s3_config_builder.force_path_style(true).build()
    } else {
        s3_config_builder.build()
    };

    Ok(Client::from_conf(s3_config))
}
