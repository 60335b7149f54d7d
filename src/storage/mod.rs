//! Storage module for persisting crawl data
//!
//! This module holds the document-store interface the crawl core writes
//! through, plus the SQLite backend: session records, page records, and
//! the end-of-crawl analysis outputs.

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteStore;
pub use traits::{CrawlStore, StorageError, StorageResult};

use std::collections::BTreeMap;

/// A crawling session, keyed by its deterministic crawling id
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub crawling_id: String,
    pub website_domain: String,
    pub starting_points: Vec<String>,
    pub extracted_keywords: Vec<String>,
    pub created_at: String,
}

/// One fetched (or broken) page of a session
///
/// A record is complete or broken, never partially applied: either the
/// full page data is persisted, or a broken-page record with the error.
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub crawling_id: String,
    pub page_url_relative: String,
    pub title: Option<String>,
    pub status_code: Option<u16>,
    pub is_broken: bool,
    pub error: Option<String>,
    pub depth: u32,
    pub word_count: Option<usize>,
    pub load_time_ms: Option<u64>,
    pub content_hash: Option<u64>,
    pub canonical_href: Option<String>,
    pub meta_description: Option<String>,
    pub scores: BTreeMap<String, f64>,
}

impl PageRecord {
    /// Creates a broken-page record for a URL that could not be processed
    pub fn broken(
        crawling_id: &str,
        page_url_relative: &str,
        depth: u32,
        status_code: Option<u16>,
        error: Option<String>,
    ) -> Self {
        Self {
            crawling_id: crawling_id.to_string(),
            page_url_relative: page_url_relative.to_string(),
            title: None,
            status_code,
            is_broken: true,
            error,
            depth,
            word_count: None,
            load_time_ms: None,
            content_hash: None,
            canonical_href: None,
            meta_description: None,
            scores: BTreeMap::new(),
        }
    }
}
