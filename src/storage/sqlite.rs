//! SQLite implementation of the document store

use crate::analysis::{CanonicalConsistencyAnalysis, DuplicateReport};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{CrawlStore, StorageResult};
use crate::storage::{PageRecord, SessionRecord};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

/// SQLite storage backend
///
/// The connection sits behind a mutex so the store can be shared as
/// `Arc<dyn CrawlStore>`; the orchestrator is the only writer in practice.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a database at the given path
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database, useful for tests
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn row_to_page(row: &Row) -> rusqlite::Result<(PageRecord, Option<String>)> {
        let scores_json: Option<String> = row.get(12)?;
        let page = PageRecord {
            crawling_id: row.get(0)?,
            page_url_relative: row.get(1)?,
            title: row.get(2)?,
            status_code: row.get::<_, Option<i64>>(3)?.map(|v| v as u16),
            is_broken: row.get(4)?,
            error: row.get(5)?,
            depth: row.get::<_, i64>(6)? as u32,
            word_count: row.get::<_, Option<i64>>(7)?.map(|v| v as usize),
            load_time_ms: row.get::<_, Option<i64>>(8)?.map(|v| v as u64),
            content_hash: row.get::<_, Option<i64>>(9)?.map(|v| v as u64),
            canonical_href: row.get(10)?,
            meta_description: row.get(11)?,
            scores: BTreeMap::new(),
        };
        Ok((page, scores_json))
    }

    fn upsert_page_on(conn: &Connection, page: &PageRecord) -> StorageResult<()> {
        let scores_json = if page.scores.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&page.scores)?)
        };
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO pages (
                crawling_id, page_url_relative, title, status_code, is_broken, error,
                depth, word_count, load_time_ms, content_hash, canonical_href,
                meta_description, scores, fetched_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(crawling_id, page_url_relative) DO UPDATE SET
                title = excluded.title,
                status_code = excluded.status_code,
                is_broken = excluded.is_broken,
                error = excluded.error,
                depth = excluded.depth,
                word_count = excluded.word_count,
                load_time_ms = excluded.load_time_ms,
                content_hash = excluded.content_hash,
                canonical_href = excluded.canonical_href,
                meta_description = excluded.meta_description,
                scores = excluded.scores,
                fetched_at = excluded.fetched_at",
            params![
                page.crawling_id,
                page.page_url_relative,
                page.title,
                page.status_code.map(|v| v as i64),
                page.is_broken,
                page.error,
                page.depth as i64,
                page.word_count.map(|v| v as i64),
                page.load_time_ms.map(|v| v as i64),
                page.content_hash.map(|v| v as i64),
                page.canonical_href,
                page.meta_description,
                scores_json,
                now,
            ],
        )?;
        Ok(())
    }
}

impl CrawlStore for SqliteStore {
    fn ensure_session(
        &self,
        crawling_id: &str,
        website_domain: &str,
        starting_points: &[String],
    ) -> StorageResult<SessionRecord> {
        let conn = self.conn.lock().unwrap();

        let existing = conn
            .query_row(
                "SELECT crawling_id, website_domain, starting_points, extracted_keywords, created_at
                 FROM sessions WHERE crawling_id = ?1",
                params![crawling_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        if let Some((id, domain, starting_json, keywords_json, created_at)) = existing {
            return Ok(SessionRecord {
                crawling_id: id,
                website_domain: domain,
                starting_points: serde_json::from_str(&starting_json)?,
                extracted_keywords: serde_json::from_str(&keywords_json)?,
                created_at,
            });
        }

        let now = Utc::now().to_rfc3339();
        let starting_json = serde_json::to_string(starting_points)?;
        conn.execute(
            "INSERT INTO sessions (crawling_id, website_domain, starting_points, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![crawling_id, website_domain, starting_json, now],
        )?;

        Ok(SessionRecord {
            crawling_id: crawling_id.to_string(),
            website_domain: website_domain.to_string(),
            starting_points: starting_points.to_vec(),
            extracted_keywords: Vec::new(),
            created_at: now,
        })
    }

    fn get_session(&self, crawling_id: &str) -> StorageResult<Option<SessionRecord>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                "SELECT crawling_id, website_domain, starting_points, extracted_keywords, created_at
                 FROM sessions WHERE crawling_id = ?1",
                params![crawling_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some((id, domain, starting_json, keywords_json, created_at)) => {
                Ok(Some(SessionRecord {
                    crawling_id: id,
                    website_domain: domain,
                    starting_points: serde_json::from_str(&starting_json)?,
                    extracted_keywords: serde_json::from_str(&keywords_json)?,
                    created_at,
                }))
            }
            None => Ok(None),
        }
    }

    fn update_extracted_keywords(
        &self,
        crawling_id: &str,
        keywords: &[String],
    ) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let json = serde_json::to_string(keywords)?;
        conn.execute(
            "UPDATE sessions SET extracted_keywords = ?1 WHERE crawling_id = ?2",
            params![json, crawling_id],
        )?;
        Ok(())
    }

    fn update_canonical_analysis(
        &self,
        crawling_id: &str,
        analysis: &CanonicalConsistencyAnalysis,
    ) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let json = serde_json::to_string(analysis)?;
        conn.execute(
            "UPDATE sessions SET canonical_consistency = ?1 WHERE crawling_id = ?2",
            params![json, crawling_id],
        )?;
        Ok(())
    }

    fn update_duplicate_content(
        &self,
        crawling_id: &str,
        report: &DuplicateReport,
    ) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let duplicates = serde_json::to_string(&report.duplicates)?;
        let near_duplicates = serde_json::to_string(&report.near_duplicates)?;
        conn.execute(
            "UPDATE sessions SET duplicate_content = ?1, near_duplicate_content = ?2
             WHERE crawling_id = ?3",
            params![duplicates, near_duplicates, crawling_id],
        )?;
        Ok(())
    }

    fn update_directory_tree(
        &self,
        crawling_id: &str,
        analysis: &serde_json::Value,
    ) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE sessions SET directory_tree = ?1 WHERE crawling_id = ?2",
            params![analysis.to_string(), crawling_id],
        )?;
        Ok(())
    }

    fn upsert_page(&self, page: &PageRecord) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        Self::upsert_page_on(&conn, page)
    }

    fn bulk_upsert_pages(&self, pages: &[PageRecord]) -> StorageResult<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        for page in pages {
            Self::upsert_page_on(&tx, page)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn find_pages(&self, crawling_id: &str) -> StorageResult<Vec<PageRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT crawling_id, page_url_relative, title, status_code, is_broken, error,
                    depth, word_count, load_time_ms, content_hash, canonical_href,
                    meta_description, scores
             FROM pages WHERE crawling_id = ?1 ORDER BY page_url_relative",
        )?;

        let rows = stmt.query_map(params![crawling_id], Self::row_to_page)?;

        let mut pages = Vec::new();
        for row in rows {
            let (mut page, scores_json) = row?;
            if let Some(json) = scores_json {
                page.scores = serde_json::from_str(&json)?;
            }
            pages.push(page);
        }
        Ok(pages)
    }

    fn average_scores(&self, crawling_id: &str) -> StorageResult<BTreeMap<String, f64>> {
        let pages = self.find_pages(crawling_id)?;
        let scored: Vec<&PageRecord> = pages
            .iter()
            .filter(|p| !p.is_broken && !p.scores.is_empty())
            .collect();

        if scored.is_empty() {
            return Ok(BTreeMap::new());
        }

        let mut totals: BTreeMap<String, f64> = BTreeMap::new();
        for page in &scored {
            for (key, value) in &page.scores {
                *totals.entry(key.clone()).or_insert(0.0) += value;
            }
        }

        let count = scored.len() as f64;
        Ok(totals
            .into_iter()
            .map(|(key, total)| (key, total / count))
            .collect())
    }
}
