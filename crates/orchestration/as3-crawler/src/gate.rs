//! Admission control for listing calls.

use as3_error::{CrawlError, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting gate bounding the number of outstanding listing calls of a crawl.
///
/// Cloning a gate shares its permit pool. Permits are handed out as
/// [`GatePermit`] guards and return to the pool when the guard is dropped,
/// whether the holder finished, failed, or was cancelled.
#[derive(Debug, Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// A granted permit. Dropping it releases the permit.
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    /// Create a gate with `parallelism` permits.
    pub fn new(parallelism: usize) -> Result<Self> {
        if parallelism == 0 {
            return Err(CrawlError::Config(
                "parallelism must be at least 1".to_string(),
            ));
        }
        if parallelism > Semaphore::MAX_PERMITS {
            return Err(CrawlError::Config(format!(
                "parallelism {parallelism} exceeds the maximum of {}",
                Semaphore::MAX_PERMITS
            )));
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(parallelism)),
            capacity: parallelism,
        })
    }

    /// Wait for a permit.
    pub async fn acquire(&self) -> Result<GatePermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| CrawlError::Scheduling(format!("Failed to acquire permit: {e}")))?;

        Ok(GatePermit { _permit: permit })
    }

    /// Permits currently available.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits currently held.
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    /// Configured parallelism.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
