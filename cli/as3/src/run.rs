//! Main execution logic for the as3 CLI.

use anyhow::{Result, anyhow};
use as3_cli_common::{format_number, human_readable_size};
use as3_crawler::s3::{S3Config, S3Listing, create_s3_client};
use as3_crawler::{CrawlConfig, CrawlStats, Crawler};
use as3_traits::ListingClient;
use as3_types::ObjectRecord;
use futures::StreamExt;
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::args::{Command, ListArgs};
use crate::progress::ProgressReporter;

const S3_PROTO: &str = "s3://";
const PROGRESS_REFRESH_INTERVAL: Duration = Duration::from_millis(500);

/// Split an S3 URL into bucket and key.
pub fn split_s3_url(s3_url: &str) -> Result<(String, String)> {
    let rest = s3_url
        .strip_prefix(S3_PROTO)
        .ok_or_else(|| anyhow!("Invalid S3 URL. It should start with s3://"))?;

    Ok(match rest.split_once('/') {
        Some((bucket, key)) => (bucket.to_string(), key.to_string()),
        None => (rest.to_string(), String::new()),
    })
}

/// Execute a subcommand.
pub async fn execute(command: Command) -> Result<()> {
    let mut out = std::io::stdout();

    match command {
        Command::Ls(args) => {
            let objects = list_s3(&args, &mut out).await?;
            for object in &objects {
                writeln!(out, "{}", object.key)?;
            }
            print_summary(&mut out, &objects)?;
        }
        Command::Du(args) => {
            let objects = list_s3(&args, &mut out).await?;
            print_summary(&mut out, &objects)?;
        }
    }

    Ok(())
}

async fn list_s3(args: &ListArgs, out: &mut impl Write) -> Result<Vec<ObjectRecord>> {
    let (bucket, key) = split_s3_url(&args.s3_url)?;
    let config = crawl_config(args);
    config.validate()?;

    let mut s3_config = S3Config::new().with_timeout(args.timeout);
    if let Some(endpoint) = &args.endpoint {
        s3_config = s3_config.with_endpoint(endpoint);
    }
    if let Some(region) = &args.region {
        s3_config = s3_config.with_region(region);
    }
    if let Some(profile) = &args.profile {
        s3_config = s3_config.with_profile(profile);
    }

    let client = create_s3_client(&s3_config).await?;
    let crawler = Crawler::new(Arc::new(S3Listing::new(client)), bucket);

    list_objects(&crawler, &args.s3_url, &key, &config, args.repeat, out).await
}

/// Build the crawl parameters from CLI arguments.
pub fn crawl_config(args: &ListArgs) -> CrawlConfig {
    CrawlConfig::new()
        .with_max_level(args.max_level)
        .with_max_folders(args.max_folders)
        .with_delimiter(args.delimiter)
        .with_parallelism(args.parallelism)
}

/// List `key` `repeat` times, reporting the time of each attempt.
///
/// Returns the objects of the last attempt.
pub async fn list_objects<C: ListingClient + ?Sized + 'static>(
    crawler: &Crawler<C>,
    s3_url: &str,
    key: &str,
    config: &CrawlConfig,
    repeat: usize,
    out: &mut impl Write,
) -> Result<Vec<ObjectRecord>> {
    print_start_info(out, s3_url, config, repeat)?;

    let mut total = Duration::ZERO;
    let mut objects = Vec::new();

    for attempt in 0..repeat.max(1) {
        let started = Instant::now();
        let (listed, stats) = list_with_progress(crawler, key, config.clone()).await?;
        objects = listed;
        let elapsed = started.elapsed();
        total += elapsed;

        info!(
            attempt = attempt + 1,
            objects = stats.objects,
            batches = stats.batches,
            objects_per_second = ?stats.objects_per_second(),
            "Listing attempt finished"
        );
        writeln!(
            out,
            "({}) Elapsed time: {:.2} seconds",
            attempt + 1,
            elapsed.as_secs_f64()
        )?;
    }

    if repeat > 1 {
        writeln!(
            out,
            "Average time: {:.2} seconds",
            total.as_secs_f64() / repeat as f64
        )?;
    }

    Ok(objects)
}

async fn list_with_progress<C: ListingClient + ?Sized + 'static>(
    crawler: &Crawler<C>,
    key: &str,
    config: CrawlConfig,
) -> Result<(Vec<ObjectRecord>, CrawlStats)> {
    let mut progress = ProgressReporter::new(PROGRESS_REFRESH_INTERVAL);
    progress.start();

    let mut stats = CrawlStats::new();
    let mut objects = Vec::new();
    let mut stream = crawler.iterate(key, config)?;

    while let Some(batch) = stream.next().await {
        let batch = batch?;
        progress.record_batch(&batch);
        stats.record_batch(&batch);
        objects.extend(batch);
    }

    stats.complete();
    progress.stop().await;

    Ok((objects, stats))
}

fn print_start_info(
    out: &mut impl Write,
    s3_url: &str,
    config: &CrawlConfig,
    repeat: usize,
) -> Result<()> {
    writeln!(out, "Listing objects in {s3_url}")?;
    writeln!(
        out,
        "max_level: {}, max_folders: {}, delimiter: {}, parallelism: {}, {} times.",
        display_limit(config.max_level),
        display_limit(config.max_folders),
        config.delimiter,
        config.parallelism,
        repeat
    )?;
    Ok(())
}

fn display_limit(limit: Option<usize>) -> String {
    limit.map_or_else(|| "None".to_string(), |v| v.to_string())
}

/// Print the object count and total size.
pub fn print_summary(out: &mut impl Write, objects: &[ObjectRecord]) -> Result<()> {
    let total_size: u64 = objects.iter().map(|o| o.size).sum();
    writeln!(
        out,
        "Total objects: {}, size: {}",
        format_number(objects.len() as u64),
        human_readable_size(total_size, 2)
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use as3_crawler::memory::MemoryListing;

    #[test]
    fn test_split_s3_url() {
        assert_eq!(
            split_s3_url("s3://bucket/key/x").unwrap(),
            ("bucket".to_string(), "key/x".to_string())
        );
        assert_eq!(
            split_s3_url("s3://bucket/").unwrap(),
            ("bucket".to_string(), String::new())
        );
        assert_eq!(
            split_s3_url("s3://bucket").unwrap(),
            ("bucket".to_string(), String::new())
        );
    }

    #[test]
    fn test_split_s3_url_requires_scheme() {
        let err = split_s3_url("bucket/key").unwrap_err();
        assert_eq!(err.to_string(), "Invalid S3 URL. It should start with s3://");
    }

    #[test]
    fn test_print_summary() {
        let mut out = Vec::new();
        let objects = vec![
            ObjectRecord::new("a/1.txt", 10),
            ObjectRecord::new("a/2.txt", 20),
            ObjectRecord::new("b/1.txt", 5),
        ];
        print_summary(&mut out, &objects).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Total objects: 3, size: 35.00 B\n");
    }

    #[tokio::test]
    async fn test_list_objects_with_repeats() {
        let listing = MemoryListing::new("bucket")
            .with_object("a/1.txt", 10)
            .with_object("a/2.txt", 20)
            .with_object("b/1.txt", 5);
        let crawler = Crawler::new(Arc::new(listing), "bucket");
        let config = CrawlConfig::new().with_parallelism(2);

        let mut out = Vec::new();
        let objects = list_objects(&crawler, "s3://bucket/", "", &config, 2, &mut out)
            .await
            .unwrap();
        assert_eq!(objects.len(), 3);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Listing objects in s3://bucket/");
        assert_eq!(
            lines[1],
            "max_level: None, max_folders: None, delimiter: /, parallelism: 2, 2 times."
        );
        assert!(lines[2].starts_with("(1) Elapsed time: "));
        assert!(lines[3].starts_with("(2) Elapsed time: "));
        assert!(lines[4].starts_with("Average time: "));
    }

    #[tokio::test]
    async fn test_list_objects_reports_missing_bucket() {
        let crawler = Crawler::new(Arc::new(MemoryListing::new("bucket")), "missing");
        let mut out = Vec::new();

        let err = list_objects(&crawler, "s3://missing/", "", &CrawlConfig::new(), 1, &mut out)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Access denied or not found"));
    }
}
