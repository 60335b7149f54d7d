//! Database schema definitions
//!
//! All SQL schema definitions for the Seoscope database.

use rusqlite::Connection;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One crawling session per target domain
CREATE TABLE IF NOT EXISTS sessions (
    crawling_id TEXT PRIMARY KEY,
    website_domain TEXT NOT NULL,
    starting_points TEXT NOT NULL DEFAULT '[]',
    extracted_keywords TEXT NOT NULL DEFAULT '[]',
    canonical_consistency TEXT,
    duplicate_content TEXT,
    near_duplicate_content TEXT,
    directory_tree TEXT,
    created_at TEXT NOT NULL
);

-- One record per fetched (or broken) page, keyed by session and relative URL
CREATE TABLE IF NOT EXISTS pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    crawling_id TEXT NOT NULL REFERENCES sessions(crawling_id),
    page_url_relative TEXT NOT NULL,
    title TEXT,
    status_code INTEGER,
    is_broken INTEGER NOT NULL DEFAULT 0,
    error TEXT,
    depth INTEGER NOT NULL DEFAULT 0,
    word_count INTEGER,
    load_time_ms INTEGER,
    content_hash INTEGER,
    canonical_href TEXT,
    meta_description TEXT,
    scores TEXT,
    fetched_at TEXT NOT NULL,
    UNIQUE(crawling_id, page_url_relative)
);

CREATE INDEX IF NOT EXISTS idx_pages_session ON pages(crawling_id);
CREATE INDEX IF NOT EXISTS idx_pages_broken ON pages(crawling_id, is_broken);
"#;

/// Applies the schema to a connection
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
