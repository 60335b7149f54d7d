//! Crawl frontier: pending queue plus process-lifetime seen set
//!
//! Owned and mutated only by the orchestrator's single control flow, so no
//! locking is needed. The invariant the frontier enforces is global: a URL
//! that has ever been handed out for processing is never handed out again,
//! no matter how many pages rediscover it.

use crate::url::seen_key;
use std::collections::{HashSet, VecDeque};

/// One not-yet-fetched URL known to the crawl
///
/// Priority is advisory: sitemap-seeded entries carry 1, link-discovered
/// entries carry 0, and ordering beyond FIFO is not enforced.
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: u32,
    pub priority: u32,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: u32, priority: u32) -> Self {
        Self {
            url: url.into(),
            depth,
            priority,
        }
    }
}

/// The frontier of a single crawl
#[derive(Debug, Default)]
pub struct Frontier {
    pending: VecDeque<FrontierEntry>,
    seen: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry unless its URL was already dispatched
    ///
    /// Returns true when the entry was accepted. The pending queue itself
    /// may hold duplicates; they are skipped defensively at dispatch time.
    pub fn enqueue(&mut self, entry: FrontierEntry) -> bool {
        if self.seen.contains(&seen_key(&entry.url)) {
            return false;
        }
        self.pending.push_back(entry);
        true
    }

    /// Pushes an entry to the front of the queue (used for the seed URL)
    pub fn enqueue_front(&mut self, entry: FrontierEntry) -> bool {
        if self.seen.contains(&seen_key(&entry.url)) {
            return false;
        }
        self.pending.push_front(entry);
        true
    }

    /// Takes up to `max` entries for dispatch, marking each as seen
    ///
    /// Entries whose URL was already dispatched are skipped, which also
    /// collapses duplicates sitting in the queue.
    pub fn next_batch(&mut self, max: usize) -> Vec<FrontierEntry> {
        let mut batch = Vec::new();
        while batch.len() < max {
            let Some(entry) = self.pending.pop_front() else {
                break;
            };
            if self.seen.insert(seen_key(&entry.url)) {
                batch.push(entry);
            }
        }
        batch
    }

    /// Iterates over the URLs currently queued for processing
    pub fn pending_urls(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(|entry| entry.url.as_str())
    }

    /// Whether a URL is currently queued for processing
    pub fn contains_pending(&self, url: &str) -> bool {
        let key = seen_key(url);
        self.pending.iter().any(|entry| seen_key(&entry.url) == key)
    }

    /// Whether a URL was ever dispatched
    pub fn has_seen(&self, url: &str) -> bool {
        self.seen.contains(&seen_key(url))
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
