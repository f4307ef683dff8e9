//! as3-crawler - bounded-concurrency prefix crawler for object stores.
//!
//! Enumerates every object under a prefix by turning the folder tree into
//! concurrent listing tasks:
//!
//! - A shared [`ConcurrencyGate`] bounds outstanding listing calls
//! - `max_level` caps how deep folders are listed one by one
//! - `max_folders` folds wide folders into groups via [`group_prefixes`]
//! - Results stream out page by page through a [`ResultStream`]
//!
//! Backends implement [`ListingClient`](as3_traits::ListingClient):
//! [`s3::S3Listing`] for S3 and [`memory::MemoryListing`] for tests.
//!
//! # Example
//!
//! ```ignore
//! use as3_crawler::{CrawlConfig, Crawler};
//! use as3_crawler::s3::{S3Config, S3Listing, create_s3_client};
//! use futures::StreamExt;
//! use std::sync::Arc;
//!
//! let client = create_s3_client(&S3Config::new()).await?;
//! let crawler = Crawler::new(Arc::new(S3Listing::new(client)), "my-bucket");
//!
//! let config = CrawlConfig::new().with_max_level(Some(2)).with_parallelism(50);
//! let mut stream = crawler.iterate("logs/", config)?;
//! while let Some(batch) = stream.next().await {
//!     for object in batch? {
//!         println!("{} {}", object.key, object.size);
//!     }
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod gate;
pub mod grouper;
pub mod memory;
pub mod s3;
pub mod session;
pub mod stats;
pub mod stream;

pub use config::{CrawlConfig, DEFAULT_DELIMITER, DEFAULT_PARALLELISM, parse_delimiter};
pub use crawler::{Crawler, ObjectBatch, PrefixTask};
pub use gate::{ConcurrencyGate, GatePermit};
pub use grouper::{GroupedPrefixSet, group_prefixes, longest_common_prefix};
pub use session::CrawlSession;
pub use stats::CrawlStats;
pub use stream::ResultStream;
