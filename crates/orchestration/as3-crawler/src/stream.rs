//! Consumer side of a crawl.

use as3_error::Result;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::crawler::ObjectBatch;
use crate::gate::ConcurrencyGate;
use crate::session::CrawlSession;

/// Lazy sequence of object batches produced by a running crawl.
///
/// Batches arrive in completion order. A failure is delivered as a single
/// `Err` item, after which the stream yields `None` even if batches from
/// tasks still unwinding are queued behind it. Dropping the stream cancels
/// every task of the crawl; their gate permits return to the pool as they
/// unwind.
pub struct ResultStream<C: ?Sized> {
    receiver: mpsc::Receiver<Result<ObjectBatch>>,
    driver: JoinHandle<()>,
    session: Arc<CrawlSession<C>>,
    failed: bool,
}

impl<C: ?Sized> ResultStream<C> {
    pub(crate) fn new(
        receiver: mpsc::Receiver<Result<ObjectBatch>>,
        driver: JoinHandle<()>,
        session: Arc<CrawlSession<C>>,
    ) -> Self {
        Self {
            receiver,
            driver,
            session,
            failed: false,
        }
    }

    /// Shared state of the crawl.
    pub fn session(&self) -> &Arc<CrawlSession<C>> {
        &self.session
    }

    /// Whether the root task has finished.
    pub fn is_finished(&self) -> bool {
        self.driver.is_finished()
    }

    /// Stop the crawl. Equivalent to dropping the stream.
    pub fn cancel(self) {}

    /// The gate bounding this crawl's listing calls.
    pub fn gate(&self) -> &ConcurrencyGate {
        self.session.gate()
    }
}

impl<C: ?Sized> Stream for ResultStream<C> {
    type Item = Result<ObjectBatch>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.failed {
            return Poll::Ready(None);
        }

        let item = self.receiver.poll_recv(cx);
        if let Poll::Ready(Some(Err(_))) = &item {
            self.failed = true;
            self.receiver.close();
        }
        item
    }
}

impl<C: ?Sized> Drop for ResultStream<C> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}
