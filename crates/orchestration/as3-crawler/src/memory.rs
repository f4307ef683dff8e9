//! In-memory listing backend.
//!
//! Serves listings from a sorted key map with the same shape as S3
//! `ListObjectsV2`: keys with the delimiter after the prefix collapse into a
//! common prefix, entries come back in key order, and a continuation token is
//! the name of the last entry of the previous page. Latency and failures can
//! be injected, and a [`CallProbe`] records how the backend was driven.

use as3_error::ListingError;
use as3_traits::ListingClient;
use as3_types::{ListPage, ObjectRecord};
use async_trait::async_trait;
use rand::Rng;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Default number of entries per page, as in S3.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Counters describing how a backend was called.
#[derive(Debug, Default)]
pub struct CallProbe {
    calls: AtomicUsize,
    delimited_calls: AtomicUsize,
    outstanding: AtomicUsize,
    peak_outstanding: AtomicUsize,
}

impl CallProbe {
    /// Total calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls made with a delimiter.
    pub fn delimited_calls(&self) -> usize {
        self.delimited_calls.load(Ordering::SeqCst)
    }

    /// Calls made without a delimiter.
    pub fn flat_calls(&self) -> usize {
        self.calls() - self.delimited_calls()
    }

    /// Calls currently running.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }

    /// Highest number of calls that ran at the same time.
    pub fn peak_outstanding(&self) -> usize {
        self.peak_outstanding.load(Ordering::SeqCst)
    }

    fn begin(&self, delimited: bool) -> CallGuard<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if delimited {
            self.delimited_calls.fetch_add(1, Ordering::SeqCst);
        }
        let now = self.outstanding.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_outstanding.fetch_max(now, Ordering::SeqCst);
        CallGuard { probe: self }
    }
}

struct CallGuard<'a> {
    probe: &'a CallProbe,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.probe.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

enum Entry<'a> {
    Object(&'a str, u64),
    Prefix(&'a str),
}

impl<'a> Entry<'a> {
    fn name(&self) -> &'a str {
        match *self {
            Entry::Object(key, _) | Entry::Prefix(key) => key,
        }
    }
}

/// Listing backend over an in-memory container.
#[derive(Debug)]
pub struct MemoryListing {
    container: String,
    objects: BTreeMap<String, u64>,
    page_size: usize,
    latency: Option<(Duration, Duration)>,
    failures: Vec<(String, ListingError)>,
    probe: CallProbe,
}

impl MemoryListing {
    /// Create an empty container named `container`.
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            objects: BTreeMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            latency: None,
            failures: Vec::new(),
            probe: CallProbe::default(),
        }
    }

    /// Add an object.
    pub fn with_object(mut self, key: impl Into<String>, size: u64) -> Self {
        self.objects.insert(key.into(), size);
        self
    }

    /// Add several objects.
    pub fn with_objects<K: Into<String>>(mut self, objects: impl IntoIterator<Item = (K, u64)>) -> Self {
        self.objects
            .extend(objects.into_iter().map(|(key, size)| (key.into(), size)));
        self
    }

    /// Set the maximum entries per page (at least 1).
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delay every call by a random duration between `min` and `max`.
    pub fn with_latency(mut self, min: Duration, max: Duration) -> Self {
        self.latency = Some((min.min(max), min.max(max)));
        self
    }

    /// Fail every call whose prefix starts with `prefix`.
    pub fn with_failure(mut self, prefix: impl Into<String>, error: ListingError) -> Self {
        self.failures.push((prefix.into(), error));
        self
    }

    /// Call counters.
    pub fn probe(&self) -> &CallProbe {
        &self.probe
    }

    /// Every stored object under `prefix`, in key order.
    pub fn records_under(&self, prefix: &str) -> Vec<ObjectRecord> {
        self.objects
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, size)| ObjectRecord::new(key.clone(), *size))
            .collect()
    }

    fn entries<'a>(
        &'a self,
        prefix: &'a str,
        delimiter: Option<char>,
    ) -> impl Iterator<Item = Entry<'a>> + 'a {
        let mut last_prefix: Option<&'a str> = None;

        self.objects
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(key, _)| key.starts_with(prefix))
            .filter_map(move |(key, size)| {
                let nested = delimiter.and_then(move |d| {
                    key[prefix.len()..]
                        .find(d)
                        .map(|pos| &key[..prefix.len() + pos + d.len_utf8()])
                });

                match nested {
                    Some(common) if last_prefix == Some(common) => None,
                    Some(common) => {
                        last_prefix = Some(common);
                        Some(Entry::Prefix(common))
                    }
                    None => Some(Entry::Object(key.as_str(), *size)),
                }
            })
    }

    fn pick_latency(&self) -> Option<Duration> {
        let (min, max) = self.latency?;
        let micros = rand::rng().random_range(min.as_micros() as u64..=max.as_micros() as u64);
        Some(Duration::from_micros(micros))
    }
}

#[async_trait]
impl ListingClient for MemoryListing {
    async fn list(
        &self,
        container: &str,
        prefix: &str,
        delimiter: Option<char>,
        continuation: Option<&str>,
    ) -> Result<ListPage, ListingError> {
        let _call = self.probe.begin(delimiter.is_some());

        if let Some(delay) = self.pick_latency() {
            tokio::time::sleep(delay).await;
        }

        if container != self.container {
            return Err(ListingError::AccessOrNotFound(format!(
                "NoSuchBucket: {container}"
            )));
        }

        if let Some((_, error)) = self
            .failures
            .iter()
            .find(|(failing, _)| prefix.starts_with(failing.as_str()))
        {
            return Err(error.clone());
        }

        let mut entries = self
            .entries(prefix, delimiter)
            .skip_while(|entry| continuation.is_some_and(|token| entry.name() <= token));

        let mut page = ListPage::default();
        let mut last = None;
        let mut taken = 0;
        for entry in entries.by_ref() {
            last = Some(entry.name());
            match entry {
                Entry::Object(key, size) => page.items.push(ObjectRecord::new(key, size)),
                Entry::Prefix(common) => page.group_prefixes.push(common.to_string()),
            }
            taken += 1;
            if taken == self.page_size {
                break;
            }
        }

        if taken == self.page_size && entries.next().is_some() {
            page.next_token = last.map(str::to_string);
        }

        Ok(page)
    }
}
