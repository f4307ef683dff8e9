//! Crawler integration tests against S3 on LocalStack.

use crate::common::{LocalStackTestContext, folder_tree_keys};
use as3_crawler::{CrawlConfig, Crawler};
use as3_error::CrawlError;
use futures::StreamExt;
use std::sync::Arc;

async fn seed_bucket(ctx: &LocalStackTestContext, bucket: &str) -> Vec<String> {
    ctx.create_bucket(bucket).await.unwrap();

    let mut keys = folder_tree_keys();
    for (i, key) in keys.iter().enumerate() {
        ctx.put_sized(bucket, key, i + 1).await.unwrap();
    }
    keys.sort();
    keys
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_crawl_matches_flat_listing() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "as3-crawl-bucket";
    let expected = seed_bucket(&ctx, bucket).await;
    let crawler = Crawler::new(Arc::new(ctx.listing().await), bucket);

    for (max_level, max_folders) in [(None, None), (Some(1), None), (None, Some(2)), (Some(0), None)] {
        let config = CrawlConfig::new()
            .with_max_level(max_level)
            .with_max_folders(max_folders)
            .with_parallelism(4);

        let objects = crawler.list_all("", config).await.unwrap();
        let mut keys: Vec<String> = objects.iter().map(|o| o.key.clone()).collect();
        keys.sort();

        assert_eq!(keys, expected, "max_level={max_level:?} max_folders={max_folders:?}");
    }
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_crawl_sizes() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let bucket = "as3-size-bucket";
    ctx.create_bucket(bucket).await.unwrap();
    ctx.put_sized(bucket, "a/1.txt", 10).await.unwrap();
    ctx.put_sized(bucket, "a/2.txt", 20).await.unwrap();
    ctx.put_sized(bucket, "b/1.txt", 5).await.unwrap();

    let crawler = Crawler::new(Arc::new(ctx.listing().await), bucket);
    let mut stream = crawler
        .iterate("", CrawlConfig::new().with_parallelism(2))
        .unwrap();

    let mut count = 0;
    let mut size = 0;
    while let Some(batch) = stream.next().await {
        let batch = batch.unwrap();
        count += batch.len();
        size += batch.iter().map(|o| o.size).sum::<u64>();
    }

    assert_eq!(count, 3);
    assert_eq!(size, 35);
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_missing_bucket_is_access_or_not_found() {
    let ctx = LocalStackTestContext::new().await;

    if !ctx.is_available().await {
        eprintln!("LocalStack not available, skipping test");
        return;
    }

    let crawler = Crawler::new(Arc::new(ctx.listing().await), "as3-no-such-bucket");
    let err = crawler.list_all("", CrawlConfig::new()).await.unwrap_err();

    assert!(
        matches!(&err, CrawlError::Listing(_)) && err.is_access_or_not_found(),
        "unexpected error: {err}"
    );
}
