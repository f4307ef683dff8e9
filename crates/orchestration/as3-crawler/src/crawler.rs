//! Recursive bounded-concurrency prefix crawler.
//!
//! Every discovered folder becomes a task. A task either lists its prefix
//! flatly (depth budget spent), or lists it with the delimiter, emits the
//! direct objects and then fans out: one child task per sub-folder, or, when
//! there are more sub-folders than `max_folders`, one flat listing per group
//! of sub-folders folded by [`group_prefixes`].
//!
//! Listing calls of all tasks share a single [`ConcurrencyGate`]. Objects are
//! pushed through a bounded channel into the [`ResultStream`] as soon as each
//! page arrives.

use as3_error::{CrawlError, ListingError, Result};
use as3_traits::ListingClient;
use as3_types::{ListPage, ObjectRecord};
use async_stream::try_stream;
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt, pin_mut};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::CrawlConfig;
use crate::gate::{ConcurrencyGate, GatePermit};
use crate::grouper::group_prefixes;
use crate::session::CrawlSession;
use crate::stream::ResultStream;

/// Objects emitted together from one listing page.
pub type ObjectBatch = Vec<ObjectRecord>;

type BatchSender = mpsc::Sender<Result<ObjectBatch>>;

/// One unit of scheduled work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixTask {
    /// Prefix to list
    pub prefix: String,

    /// Depth below the crawl root (root = 0)
    pub level: usize,
}

impl PrefixTask {
    /// The task for the crawl root.
    pub fn root(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            level: 0,
        }
    }

    /// A task for a sub-folder one level below this one.
    pub fn child(&self, prefix: String) -> Self {
        Self {
            prefix,
            level: self.level + 1,
        }
    }
}

/// Which objects of a flat listing belong to the task.
#[derive(Debug, Clone, Copy)]
enum FlatScope {
    /// Everything under the prefix.
    Subtree,

    /// Only objects inside a sub-folder of the parent. The parent's direct
    /// objects were already emitted by its delimited listing.
    Nested { parent_len: usize, delimiter: char },
}

impl FlatScope {
    fn keeps(&self, record: &ObjectRecord) -> bool {
        match *self {
            Self::Subtree => true,
            Self::Nested {
                parent_len,
                delimiter,
            } => record
                .key
                .get(parent_len..)
                .is_some_and(|rest| rest.contains(delimiter)),
        }
    }
}

/// Crawler over one container of a listing backend.
pub struct Crawler<C: ?Sized> {
    client: Arc<C>,
    container: String,
}

impl<C: ?Sized> Clone for Crawler<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            container: self.container.clone(),
        }
    }
}

impl<C: ListingClient + ?Sized + 'static> Crawler<C> {
    /// Create a crawler for `container`.
    pub fn new(client: Arc<C>, container: impl Into<String>) -> Self {
        Self {
            client,
            container: container.into(),
        }
    }

    /// The container this crawler lists.
    pub fn container(&self) -> &str {
        &self.container
    }

    /// Start crawling `root_prefix` and return the stream of object batches.
    ///
    /// The crawl runs on the current Tokio runtime. It starts immediately and
    /// is cancelled when the returned stream is dropped.
    pub fn iterate(
        &self,
        root_prefix: impl Into<String>,
        config: CrawlConfig,
    ) -> Result<ResultStream<C>> {
        config.validate()?;

        let runtime = Handle::try_current().map_err(|e| {
            CrawlError::Scheduling(format!("No Tokio runtime to run the crawl on: {e}"))
        })?;

        let root = PrefixTask::root(root_prefix);
        info!(
            container = %self.container,
            prefix = %root.prefix,
            max_level = ?config.max_level,
            max_folders = ?config.max_folders,
            delimiter = %config.delimiter,
            parallelism = config.parallelism,
            "Starting crawl"
        );

        let gate = ConcurrencyGate::new(config.parallelism)?;
        let (tx, rx) = mpsc::channel(config.parallelism);
        let session = Arc::new(CrawlSession::new(
            self.container.clone(),
            Arc::clone(&self.client),
            gate,
            config,
        ));

        let driver = runtime.spawn(drive(Arc::clone(&session), root, tx));

        Ok(ResultStream::new(rx, driver, session))
    }

    /// Crawl `root_prefix` and collect every object.
    pub async fn list_all(
        &self,
        root_prefix: impl Into<String>,
        config: CrawlConfig,
    ) -> Result<Vec<ObjectRecord>> {
        let mut stream = self.iterate(root_prefix, config)?;
        let mut objects = Vec::new();

        while let Some(batch) = stream.next().await {
            objects.extend(batch?);
        }

        Ok(objects)
    }
}

/// Run the root task and forward its outcome to the stream.
async fn drive<C: ListingClient + ?Sized + 'static>(
    session: Arc<CrawlSession<C>>,
    root: PrefixTask,
    tx: BatchSender,
) {
    let mut tasks = JoinSet::new();
    tasks.spawn(explore(Arc::clone(&session), root, tx.clone()));

    match join_all(&mut tasks).await {
        Ok(()) => info!(
            list_calls = session.list_calls(),
            "Crawl completed"
        ),
        Err(e) => {
            warn!(error = %e, list_calls = session.list_calls(), "Crawl aborted");
            // Fails only if the consumer is gone, in which case nobody is listening.
            let _ = tx.send(Err(e)).await;
        }
    }
}

/// Process one folder task.
fn explore<C: ListingClient + ?Sized + 'static>(
    session: Arc<CrawlSession<C>>,
    task: PrefixTask,
    tx: BatchSender,
) -> BoxFuture<'static, Result<()>> {
    async move {
        let _guard = session.enter_task();
        let config = session.config();

        if config.max_level.is_some_and(|max| task.level >= max) {
            debug!(prefix = %task.prefix, level = task.level, "Depth budget spent, listing flatly");
            return flat_listing(&session, &task.prefix, FlatScope::Subtree, &tx).await;
        }

        let children = delimited_listing(&session, &task.prefix, &tx).await?;
        if children.is_empty() {
            debug!(prefix = %task.prefix, level = task.level, "No sub-folders");
            return Ok(());
        }

        let mut tasks = JoinSet::new();
        match config.max_folders {
            Some(cap) if children.len() > cap => {
                let groups = group_prefixes(&children, cap);
                debug!(
                    prefix = %task.prefix,
                    level = task.level,
                    folders = children.len(),
                    groups = groups.len(),
                    "Too many sub-folders, listing groups flatly"
                );

                let scope = FlatScope::Nested {
                    parent_len: task.prefix.len(),
                    delimiter: config.delimiter,
                };
                for group in groups {
                    tasks.spawn(list_group(Arc::clone(&session), group, scope, tx.clone()));
                }
            }
            _ => {
                debug!(
                    prefix = %task.prefix,
                    level = task.level,
                    folders = children.len(),
                    "Expanding sub-folders"
                );
                for child in children {
                    let child = task.child(child);
                    tasks.spawn(explore(Arc::clone(&session), child, tx.clone()));
                }
            }
        }

        join_all(&mut tasks).await
    }
    .boxed()
}

/// Flat listing of one group of sub-folders.
async fn list_group<C: ListingClient + ?Sized + 'static>(
    session: Arc<CrawlSession<C>>,
    prefix: String,
    scope: FlatScope,
    tx: BatchSender,
) -> Result<()> {
    let _guard = session.enter_task();
    flat_listing(&session, &prefix, scope, &tx).await
}

/// Wait for every child task; the first failure aborts the remaining ones.
async fn join_all(tasks: &mut JoinSet<Result<()>>) -> Result<()> {
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(e) if e.is_panic() => {
                return Err(CrawlError::Scheduling(format!("Crawl task panicked: {e}")));
            }
            Err(e) => {
                return Err(CrawlError::Scheduling(format!(
                    "Crawl task did not complete: {e}"
                )));
            }
        }
    }
    Ok(())
}

/// Pages of one `(prefix, delimiter)` listing.
///
/// Each page comes with the permit of the call that produced it. The next
/// call is only issued once the stream is polled again.
fn pages<'a, C: ListingClient + ?Sized>(
    session: &'a CrawlSession<C>,
    prefix: &'a str,
    delimiter: Option<char>,
) -> impl Stream<Item = Result<(ListPage, GatePermit)>> + 'a {
    try_stream! {
        let mut continuation: Option<String> = None;

        loop {
            let (page, permit) = session
                .list_page(prefix, delimiter, continuation.as_deref())
                .await?;

            let next = page.next_token.clone();
            if next.is_some() && next == continuation {
                Err::<(), _>(ListingError::Failed(format!(
                    "continuation token for {prefix:?} did not advance"
                )))?;
            }

            yield (page, permit);

            match next {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }
    }
}

async fn flat_listing<C: ListingClient + ?Sized>(
    session: &CrawlSession<C>,
    prefix: &str,
    scope: FlatScope,
    tx: &BatchSender,
) -> Result<()> {
    let pages = pages(session, prefix, None);
    pin_mut!(pages);

    while let Some(page) = pages.next().await {
        let (page, permit) = page?;
        let items: ObjectBatch = page
            .items
            .into_iter()
            .filter(|record| scope.keeps(record))
            .collect();
        debug!(prefix = %prefix, objects = items.len(), "Listed page");
        emit(tx, items).await?;
        drop(permit);
    }

    Ok(())
}

/// Delimited listing: emits the direct objects and returns the sub-folders.
async fn delimited_listing<C: ListingClient + ?Sized>(
    session: &CrawlSession<C>,
    prefix: &str,
    tx: &BatchSender,
) -> Result<Vec<String>> {
    let pages = pages(session, prefix, Some(session.config().delimiter));
    pin_mut!(pages);

    let mut children = Vec::new();
    while let Some(page) = pages.next().await {
        let (page, permit) = page?;

        for child in &page.group_prefixes {
            if child.len() <= prefix.len() || !child.starts_with(prefix) {
                return Err(ListingError::Failed(format!(
                    "group prefix {child:?} is not below {prefix:?}"
                ))
                .into());
            }
        }

        debug!(
            prefix = %prefix,
            objects = page.items.len(),
            folders = page.group_prefixes.len(),
            "Listed page"
        );
        children.extend(page.group_prefixes);
        emit(tx, page.items).await?;
        drop(permit);
    }

    Ok(children)
}

async fn emit(tx: &BatchSender, batch: ObjectBatch) -> Result<()> {
    if batch.is_empty() {
        return Ok(());
    }
    tx.send(Ok(batch))
        .await
        .map_err(|_| CrawlError::Scheduling("result stream closed".to_string()))
}
