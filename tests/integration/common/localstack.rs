//! LocalStack test context and utilities.

use as3_crawler::s3::{S3Config, S3Listing, create_s3_client};
use aws_sdk_s3::Client as S3Client;

/// LocalStack test context providing an S3 client.
pub struct LocalStackTestContext {
    pub s3: S3Client,
    pub endpoint: String,
    pub region: String,
}

impl LocalStackTestContext {
    /// Create a new LocalStack test context.
    ///
    /// Uses the `LOCALSTACK_ENDPOINT` environment variable if set,
    /// otherwise defaults to `http://localhost:4566`.
    pub async fn new() -> Self {
        let endpoint = std::env::var("LOCALSTACK_ENDPOINT")
            .unwrap_or_else(|_| "http://localhost:4566".to_string());
        let region = "us-east-1".to_string();

        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(region.clone()))
            .endpoint_url(&endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&config)
            .force_path_style(true)
            .build();

        Self {
            s3: S3Client::from_conf(s3_config),
            endpoint,
            region,
        }
    }

    /// Check if LocalStack is available and healthy.
    pub async fn is_available(&self) -> bool {
        self.s3.list_buckets().send().await.is_ok()
    }

    /// Create an S3 bucket for testing.
    pub async fn create_bucket(&self, name: &str) -> Result<(), aws_sdk_s3::Error> {
        let buckets = self.s3.list_buckets().send().await?;
        let exists = buckets
            .buckets()
            .iter()
            .any(|b| b.name().unwrap_or_default() == name);

        if !exists {
            self.s3.create_bucket().bucket(name).send().await?;
        }
        Ok(())
    }

    /// Upload an object of `size` zero bytes.
    pub async fn put_sized(&self, bucket: &str, key: &str, size: usize) -> Result<(), aws_sdk_s3::Error> {
        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(vec![0u8; size].into())
            .send()
            .await?;
        Ok(())
    }

    /// Listing backend pointed at LocalStack through the crate's own client setup.
    pub async fn listing(&self) -> S3Listing {
        let config = S3Config::new()
            .with_endpoint(&self.endpoint)
            .with_region(&self.region)
            .with_credentials("test", "test");

        let client = create_s3_client(&config)
            .await
            .expect("failed to create S3 client");
        S3Listing::new(client)
    }
}

/// Keys of a small folder tree with objects at every depth.
pub fn folder_tree_keys() -> Vec<String> {
    let mut keys = vec!["top.txt".to_string(), "logs.txt".to_string()];
    for year in 2022..2025 {
        keys.push(format!("logs/{year}/summary.csv"));
        for month in 1..5 {
            keys.push(format!("logs/{year}/{month:02}/events.json"));
        }
    }
    for i in 0..6 {
        keys.push(format!("images/cat-{i}/a.png"));
    }
    keys
}
