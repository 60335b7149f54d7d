//! Crawl orchestration
//!
//! One control flow owns the frontier, the worker pool, and the wave loop:
//! seed the frontier (sitemaps plus the start URL), drain it in bounded
//! waves, then finalize with the cross-page dedup pass. The frontier, the
//! seen set and the session accumulators are mutated only between awaits,
//! so none of them need locks.

use crate::analysis::{
    analyze_canonical_consistency, detect_duplicate_content, CanonicalConsistencyAnalysis,
};
use crate::config::{Config, CrawlConfig, CrawlOptions};
use crate::crawler::events::{CrawlEvent, EventSink};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::monitor::{PerformanceMonitor, TaskOutcome};
use crate::crawler::progress::ProgressEstimator;
use crate::sitemap::SitemapCrawler;
use crate::storage::{CrawlStore, PageRecord};
use crate::url::{crawling_id_for, extract_domain, UrlFilter};
use crate::worker::{TaskReply, WorkerPool, WorkerTask};
use crate::{CrawlError, UrlError};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use url::Url;

/// Page records buffered before each write-behind flush
const WRITE_BEHIND_FLUSH: usize = 20;

/// Result of a completed crawl
#[derive(Debug)]
pub struct CrawlReport {
    pub crawling_id: String,
    pub pages_processed: usize,
    pub average_scores: std::collections::BTreeMap<String, f64>,
    pub canonical_consistency: CanonicalConsistencyAnalysis,
}

/// The crawl orchestrator
///
/// Owns the worker pool (created once, fixed size) and the concurrency
/// semaphore that bounds in-flight fetch-class work independently of the
/// pool size.
pub struct Coordinator {
    config: Config,
    store: Arc<dyn CrawlStore>,
    events: Arc<dyn EventSink>,
    pool: WorkerPool,
    filter: Arc<UrlFilter>,
    sitemaps: SitemapCrawler,
    semaphore: Arc<Semaphore>,
}

impl Coordinator {
    /// Builds the orchestrator and spawns its worker pool
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(
        config: Config,
        store: Arc<dyn CrawlStore>,
        events: Arc<dyn EventSink>,
    ) -> crate::Result<Self> {
        let filter = Arc::new(UrlFilter::new());
        let pool = WorkerPool::new(&config, filter.clone());
        let sitemaps = SitemapCrawler::new(&config)?;
        let semaphore = Arc::new(Semaphore::new(config.workers.concurrency_limit));

        Ok(Self {
            config,
            store,
            events,
            pool,
            filter,
            sitemaps,
            semaphore,
        })
    }

    /// The runtime-mutable inclusion/exclusion filter shared with workers
    pub fn filter(&self) -> &Arc<UrlFilter> {
        &self.filter
    }

    /// Crawls a website under the given options
    ///
    /// Resolves the session for the target domain (idempotently), seeds
    /// the frontier, drains it in waves under the URL budget, and runs the
    /// dedup pass. Task failures degrade to broken-page records; the only
    /// error raised before work starts is invalid configuration.
    pub async fn crawl_website(
        &self,
        url: &str,
        options: &CrawlOptions,
    ) -> crate::Result<CrawlReport> {
        let parsed = Url::parse(url)?;
        let domain = extract_domain(&parsed).ok_or(UrlError::MissingDomain)?;
        let crawl_config = self.config.resolve(options)?;
        let crawling_id = crawling_id_for(&domain);

        tracing::info!(
            "Starting crawl for {} (session {}, url limit {}, depth limit {})",
            url,
            crawling_id,
            crawl_config.url_limit,
            crawl_config.depth_limit
        );

        let starting_points = if options.specific_url_list.is_empty() {
            let mut points = vec![url.to_string()];
            points.extend(options.custom_starting_points.iter().cloned());
            points
        } else {
            options.specific_url_list.clone()
        };
        self.store
            .ensure_session(&crawling_id, &domain, &starting_points)?;

        let mut monitor = PerformanceMonitor::new();
        let mut processed = 0;

        if options.use_directory_tree_crawling {
            if let Some(root) = &options.directory_tree_root_path {
                self.crawl_directory_tree(&crawling_id, Path::new(root)).await?;
            } else {
                return Err(CrawlError::Config(crate::ConfigError::Validation(
                    "directory tree crawling requires a root path".to_string(),
                )));
            }
        } else {
            let mut frontier = Frontier::new();

            if options.specific_url_list.is_empty() {
                self.seed_frontier(url, options, &crawl_config, &mut frontier)
                    .await;
            } else {
                for list_url in &options.specific_url_list {
                    frontier.enqueue(FrontierEntry::new(list_url.clone(), 0, 1));
                }
            }

            processed = self
                .drain_frontier(&crawling_id, &crawl_config, &mut frontier, &mut monitor)
                .await?;
        }

        self.finalize(&crawling_id, processed, &monitor)
    }

    /// Seeding: sitemap discovery plus the original start URL
    ///
    /// Sitemap-seeded entries carry priority 1. A sitemap that fails to
    /// fetch or parse degrades to fewer discovered URLs, never to a crawl
    /// failure. The start URL goes to the FRONT of the queue when the
    /// sitemaps did not already include it.
    async fn seed_frontier(
        &self,
        url: &str,
        options: &CrawlOptions,
        config: &CrawlConfig,
        frontier: &mut Frontier,
    ) {
        if config.sitemap_enabled {
            let sitemap_urls = self.sitemaps.discover_sitemaps(url).await;
            for sitemap_url in sitemap_urls {
                match self.sitemaps.fetch_sitemap(&sitemap_url).await {
                    Ok(page_urls) => {
                        tracing::info!(
                            "Sitemap {} yielded {} URL(s)",
                            sitemap_url,
                            page_urls.len()
                        );
                        for page_url in page_urls {
                            frontier.enqueue(FrontierEntry::new(page_url, 0, 1));
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Skipping sitemap {}: {}", sitemap_url, e);
                    }
                }
            }
        }

        for extra in &options.custom_starting_points {
            frontier.enqueue(FrontierEntry::new(extra.clone(), 0, 1));
        }

        if !frontier.contains_pending(url) {
            tracing::info!("Adding start URL to the frontier: {}", url);
            frontier.enqueue_front(FrontierEntry::new(url.to_string(), 0, 1));
        }
    }

    /// Draining: the wave loop
    ///
    /// Repeats while the frontier is non-empty and the processed count is
    /// under the URL budget. Each wave dispatches up to `async_batch_size`
    /// tasks, every task gated by one semaphore permit, then merges the
    /// results before computing the next wave. Newly discovered URLs are
    /// re-enqueued at depth 0.
    async fn drain_frontier(
        &self,
        crawling_id: &str,
        config: &CrawlConfig,
        frontier: &mut Frontier,
        monitor: &mut PerformanceMonitor,
    ) -> crate::Result<usize> {
        let mut estimator = ProgressEstimator::new(config.url_limit);
        for url in frontier.pending_urls() {
            estimator.observe(url);
        }
        let mut write_behind: Vec<PageRecord> = Vec::new();
        let mut processed = 0usize;

        // The keyword set grows monotonically, also across re-crawls
        let mut keywords: BTreeSet<String> = self
            .store
            .get_session(crawling_id)?
            .map(|session| session.extracted_keywords.into_iter().collect())
            .unwrap_or_default();

        while !frontier.is_empty() && processed < config.url_limit {
            let batch_size = self
                .config
                .workers
                .async_batch_size
                .min(config.url_limit - processed);
            let batch = frontier.next_batch(batch_size);
            if batch.is_empty() {
                break;
            }
            for entry in &batch {
                estimator.observe(&entry.url);
            }
            tracing::debug!("Dispatching wave of {} task(s)", batch.len());

            let wave = batch.iter().map(|entry| {
                let task = WorkerTask::CrawlAndExtract {
                    crawling_id: crawling_id.to_string(),
                    url: entry.url.clone(),
                    depth: entry.depth,
                    config: config.clone(),
                };
                let semaphore = self.semaphore.clone();
                let pool = &self.pool;
                async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let started = Instant::now();
                    let reply = pool.dispatch(task).await;
                    (entry, started.elapsed(), reply)
                }
            });
            let results = futures::future::join_all(wave).await;
            processed += batch.len();

            let mut discovered: Vec<String> = Vec::new();
            let mut keywords_changed = false;

            for (entry, latency, reply) in results {
                match reply {
                    Ok(TaskReply::Page {
                        record,
                        new_urls,
                        keywords: page_keywords,
                    }) => {
                        monitor.record(latency, TaskOutcome::Success);
                        write_behind.push(record);
                        discovered.extend(new_urls);
                        for keyword in page_keywords {
                            if keywords.insert(keyword) {
                                keywords_changed = true;
                            }
                        }
                    }
                    Ok(TaskReply::Broken {
                        record,
                        rate_limited,
                    }) => {
                        let outcome = if rate_limited {
                            TaskOutcome::RateLimited
                        } else {
                            TaskOutcome::Failure
                        };
                        monitor.record(latency, outcome);
                        self.store.upsert_page(&record)?;
                    }
                    Ok(reply) => {
                        monitor.record(latency, TaskOutcome::Failure);
                        tracing::error!("Unexpected reply for {}: {:?}", entry.url, reply);
                    }
                    Err(e) => {
                        // A worker that never replied: record the page as
                        // broken instead of stalling the crawl
                        monitor.record(latency, TaskOutcome::Failure);
                        tracing::error!("Task for {} failed: {}", entry.url, e);
                        self.store.upsert_page(&PageRecord::broken(
                            crawling_id,
                            &relative_of(&entry.url),
                            entry.depth,
                            None,
                            Some(e.to_string()),
                        ))?;
                    }
                }
            }

            // Merge: global novelty is enforced here, once, centrally
            for url in discovered {
                estimator.observe(&url);
                frontier.enqueue(FrontierEntry::new(url, 0, 0));
            }

            if keywords_changed {
                let accumulated: Vec<String> = keywords.iter().cloned().collect();
                self.store
                    .update_extracted_keywords(crawling_id, &accumulated)?;
            }

            if write_behind.len() >= WRITE_BEHIND_FLUSH {
                self.store.bulk_upsert_pages(&write_behind)?;
                write_behind.clear();
            }

            self.events.emit(CrawlEvent::Progress {
                crawling_id: crawling_id.to_string(),
                percentage: estimator.percentage(processed),
                current_url: batch.last().map(|entry| entry.url.clone()),
            });
        }

        if !write_behind.is_empty() {
            self.store.bulk_upsert_pages(&write_behind)?;
        }

        self.events.emit(CrawlEvent::Progress {
            crawling_id: crawling_id.to_string(),
            percentage: estimator.percentage(processed),
            current_url: None,
        });
        tracing::info!("Drained frontier: {} URL(s) processed", processed);

        Ok(processed)
    }

    /// Directory-tree mode: a single walk task dispatched to one worker
    async fn crawl_directory_tree(&self, crawling_id: &str, root: &Path) -> crate::Result<()> {
        tracing::info!("Crawling directory tree at {}", root.display());

        let reply = self
            .pool
            .dispatch(WorkerTask::DirectoryTree {
                crawling_id: crawling_id.to_string(),
                root_path: root.to_path_buf(),
                config: self.config.directory_tree.clone(),
            })
            .await?;

        match reply {
            TaskReply::DirectoryTree { tree, analysis } => {
                let value = serde_json::json!({ "tree": tree, "analysis": analysis });
                self.store.update_directory_tree(crawling_id, &value)?;
                Ok(())
            }
            TaskReply::Failed { error } => Err(CrawlError::Worker(error)),
            other => Err(CrawlError::Worker(format!(
                "unexpected directory tree reply: {:?}",
                other
            ))),
        }
    }

    /// Finalizing: dedup pass, canonical analysis, score averages
    fn finalize(
        &self,
        crawling_id: &str,
        processed: usize,
        monitor: &PerformanceMonitor,
    ) -> crate::Result<CrawlReport> {
        let pages = self.store.find_pages(crawling_id)?;

        let fingerprints: Vec<(String, u64)> = pages
            .iter()
            .filter(|page| !page.is_broken)
            .filter_map(|page| {
                page.content_hash
                    .map(|hash| (page.page_url_relative.clone(), hash))
            })
            .collect();
        let duplicate_report = detect_duplicate_content(
            &fingerprints,
            self.config.dedup.near_duplicate_threshold,
        );
        self.store
            .update_duplicate_content(crawling_id, &duplicate_report)?;

        let observations: Vec<(String, String)> = pages
            .iter()
            .filter(|page| !page.is_broken)
            .filter_map(|page| {
                page.canonical_href
                    .clone()
                    .map(|canonical| (page.page_url_relative.clone(), canonical))
            })
            .collect();
        let canonical_consistency = analyze_canonical_consistency(&observations);
        self.store
            .update_canonical_analysis(crawling_id, &canonical_consistency)?;

        let average_scores = self.store.average_scores(crawling_id)?;
        monitor.log_summary();

        self.events.emit(CrawlEvent::Completed {
            crawling_id: crawling_id.to_string(),
            average_scores: average_scores.clone(),
        });
        tracing::info!("Crawl finished for session {}", crawling_id);

        Ok(CrawlReport {
            crawling_id: crawling_id.to_string(),
            pages_processed: processed,
            average_scores,
            canonical_consistency,
        })
    }
}

/// Path portion of a URL, matching the page record key used by workers
fn relative_of(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}
