//! Per-crawl shared state.

use as3_error::Result;
use as3_traits::ListingClient;
use as3_types::ListPage;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::CrawlConfig;
use crate::gate::{ConcurrencyGate, GatePermit};

/// State shared by every task of one crawl.
///
/// A session is created by each call to
/// [`Crawler::iterate`](crate::Crawler::iterate) and dropped with the last
/// task that references it.
pub struct CrawlSession<C: ?Sized> {
    container: String,
    client: Arc<C>,
    gate: ConcurrencyGate,
    config: CrawlConfig,
    in_flight: AtomicUsize,
    list_calls: AtomicUsize,
}

impl<C: ?Sized> CrawlSession<C> {
    pub(crate) fn new(
        container: String,
        client: Arc<C>,
        gate: ConcurrencyGate,
        config: CrawlConfig,
    ) -> Self {
        Self {
            container,
            client,
            gate,
            config,
            in_flight: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
        }
    }

    /// The container being crawled.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// The crawl parameters.
    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// The gate bounding listing calls of this crawl.
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Tasks started and not yet finished or cancelled.
    pub fn in_flight_tasks(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Listing calls issued so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Register a running task until the returned guard is dropped.
    pub(crate) fn enter_task(&self) -> TaskGuard<'_> {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        TaskGuard {
            in_flight: &self.in_flight,
        }
    }
}

impl<C: ListingClient + ?Sized> CrawlSession<C> {
    /// Issue one listing call under a gate permit.
    ///
    /// The permit is returned with the page so the caller can keep it until
    /// the page's objects have been handed to the result stream.
    pub(crate) async fn list_page(
        &self,
        prefix: &str,
        delimiter: Option<char>,
        continuation: Option<&str>,
    ) -> Result<(ListPage, GatePermit)> {
        let permit = self.gate.acquire().await?;
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        let page = self
            .client
            .list(&self.container, prefix, delimiter, continuation)
            .await?;
        Ok((page, permit))
    }
}

/// Decrements the in-flight task count on drop.
pub(crate) struct TaskGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}
