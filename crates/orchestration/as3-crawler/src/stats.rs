//! Statistics for crawl runs.

use as3_types::ObjectRecord;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Totals collected while consuming a crawl.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlStats {
    /// When the crawl started
    pub started_at: Option<DateTime<Utc>>,

    /// When the crawl completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Objects received
    pub objects: usize,

    /// Sum of object sizes
    pub bytes: u64,

    /// Batches received
    pub batches: usize,
}

impl CrawlStats {
    /// Create a new stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Record one batch from the result stream.
    pub fn record_batch(&mut self, batch: &[ObjectRecord]) {
        self.batches += 1;
        self.objects += batch.len();
        self.bytes += batch.iter().map(|o| o.size).sum::<u64>();
    }

    /// Mark the crawl as complete with the current time.
    pub fn complete(&mut self) {
        self.completed_at = Some(Utc::now());
    }

    /// Get the duration of the crawl.
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Throughput in objects per second.
    pub fn objects_per_second(&self) -> Option<f64> {
        self.duration().map(|d| {
            let secs = d.num_milliseconds() as f64 / 1000.0;
            if secs > 0.0 {
                self.objects as f64 / secs
            } else {
                0.0
            }
        })
    }
}
