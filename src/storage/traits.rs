//! Storage trait and error types
//!
//! The crawl core talks to persistence exclusively through [`CrawlStore`];
//! crawl correctness relies on per-record upsert atomicity and nothing
//! stronger.

use crate::analysis::{CanonicalConsistencyAnalysis, DuplicateReport};
use crate::storage::{PageRecord, SessionRecord};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Document store interface for sessions and page records
pub trait CrawlStore: Send + Sync {
    // ===== Session Management =====

    /// Looks up the session for a domain, creating it if absent
    ///
    /// Sessions are keyed by the deterministic crawling id, so re-crawling
    /// a domain reuses its session instead of forking a new one.
    fn ensure_session(
        &self,
        crawling_id: &str,
        website_domain: &str,
        starting_points: &[String],
    ) -> StorageResult<SessionRecord>;

    /// Gets a session by crawling id
    fn get_session(&self, crawling_id: &str) -> StorageResult<Option<SessionRecord>>;

    /// Replaces the session's accumulated keyword set
    fn update_extracted_keywords(
        &self,
        crawling_id: &str,
        keywords: &[String],
    ) -> StorageResult<()>;

    /// Stores the canonical consistency analysis output
    fn update_canonical_analysis(
        &self,
        crawling_id: &str,
        analysis: &CanonicalConsistencyAnalysis,
    ) -> StorageResult<()>;

    /// Stores the duplicate and near-duplicate adjacency maps
    fn update_duplicate_content(
        &self,
        crawling_id: &str,
        report: &DuplicateReport,
    ) -> StorageResult<()>;

    /// Stores the directory tree analysis for a session
    fn update_directory_tree(
        &self,
        crawling_id: &str,
        analysis: &serde_json::Value,
    ) -> StorageResult<()>;

    // ===== Page Management =====

    /// Inserts or replaces one page record
    fn upsert_page(&self, page: &PageRecord) -> StorageResult<()>;

    /// Inserts or replaces a batch of page records in one transaction
    fn bulk_upsert_pages(&self, pages: &[PageRecord]) -> StorageResult<()>;

    /// Returns all page records of a session
    fn find_pages(&self, crawling_id: &str) -> StorageResult<Vec<PageRecord>>;

    /// Averages the score maps of all non-broken pages of a session
    fn average_scores(&self, crawling_id: &str) -> StorageResult<BTreeMap<String, f64>>;
}
