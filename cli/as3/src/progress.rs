//! Progress reporting for as3.

use as3_cli_common::{format_number, human_readable_size};
use as3_types::ObjectRecord;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Periodic progress line on stderr while a listing runs.
pub struct ProgressReporter {
    interval: Duration,
    state: Arc<ProgressState>,
    handle: Option<JoinHandle<()>>,
}

struct ProgressState {
    objects: AtomicU64,
    bytes: AtomicU64,
    start_time: Instant,
}

impl ProgressReporter {
    /// Create a new progress reporter.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: Arc::new(ProgressState {
                objects: AtomicU64::new(0),
                bytes: AtomicU64::new(0),
                start_time: Instant::now(),
            }),
            handle: None,
        }
    }

    /// Start the background progress reporter.
    pub fn start(&mut self) {
        let state = Arc::clone(&self.state);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut interval_timer = tokio::time::interval(interval);
            interval_timer.tick().await; // Skip first immediate tick

            loop {
                interval_timer.tick().await;

                let _ = writeln!(
                    io::stderr(),
                    "[Progress] Objects: {}, size: {} ({:.1}s elapsed)",
                    format_number(state.objects.load(Ordering::Relaxed)),
                    human_readable_size(state.bytes.load(Ordering::Relaxed), 2),
                    state.start_time.elapsed().as_secs_f64()
                );
            }
        });

        self.handle = Some(handle);
    }

    /// Record a batch received from the crawl.
    pub fn record_batch(&self, batch: &[ObjectRecord]) {
        self.state
            .objects
            .fetch_add(batch.len() as u64, Ordering::Relaxed);
        self.state.bytes.fetch_add(
            batch.iter().map(|o| o.size).sum::<u64>(),
            Ordering::Relaxed,
        );
    }

    /// Objects recorded so far.
    pub fn objects(&self) -> u64 {
        self.state.objects.load(Ordering::Relaxed)
    }

    /// Stop reporting.
    pub async fn stop(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
