//! Worker dispatch boundary
//!
//! A fixed pool of worker tasks is created once at orchestrator
//! construction. Each worker owns its full dependency graph (HTTP client,
//! rate limiter, robots cache); the orchestrator shares nothing with them
//! except messages. Dispatch is round-robin over the pool with no busy
//! tracking: the outer concurrency semaphore is the only guard against
//! oversubscribing a worker's queue.

mod crawl;
mod dirtree;

pub use dirtree::{analyze_tree, walk_directory_tree, DirectoryTreeAnalysis, DirectoryTreeNode};

use crate::config::{Config, CrawlConfig, DirectoryTreeConfig};
use crate::limiter::RateLimiter;
use crate::robots::RobotsCache;
use crate::storage::PageRecord;
use crate::url::UrlFilter;
use crate::CrawlError;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;

/// A unit of work dispatched to a worker
#[derive(Debug, Clone)]
pub enum WorkerTask {
    CrawlAndExtract {
        crawling_id: String,
        url: String,
        depth: u32,
        config: CrawlConfig,
    },
    DirectoryTree {
        crawling_id: String,
        root_path: PathBuf,
        config: DirectoryTreeConfig,
    },
}

/// The single structured reply a worker sends per task
#[derive(Debug)]
pub enum TaskReply {
    /// A page was fetched, analyzed and its links extracted
    Page {
        record: PageRecord,
        new_urls: Vec<String>,
        keywords: Vec<String>,
    },
    /// The page could not be processed; the record carries the reason
    Broken {
        record: PageRecord,
        rate_limited: bool,
    },
    /// A directory tree walk finished
    DirectoryTree {
        tree: DirectoryTreeNode,
        analysis: DirectoryTreeAnalysis,
    },
    /// A non-page task failed in a way that has no broken-page shape
    Failed { error: String },
}

struct WorkerRequest {
    task: WorkerTask,
    reply: oneshot::Sender<TaskReply>,
}

/// Per-worker dependency graph, built once per worker at pool creation
pub(crate) struct WorkerContext {
    pub(crate) id: usize,
    pub(crate) client: reqwest::Client,
    pub(crate) limiter: RateLimiter,
    pub(crate) robots: RobotsCache,
    pub(crate) filter: Arc<UrlFilter>,
}

impl WorkerContext {
    fn new(id: usize, config: &Config, filter: Arc<UrlFilter>) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.crawler.user_agent.clone())
            .timeout(Duration::from_millis(config.crawler.request_timeout_ms))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            id,
            client: client.clone(),
            limiter: RateLimiter::new(&config.rate_limit),
            robots: RobotsCache::new(client, config.crawler.user_agent.clone()),
            filter,
        })
    }
}

/// Fixed-size pool of workers reachable only by message passing
pub struct WorkerPool {
    senders: Vec<mpsc::UnboundedSender<WorkerRequest>>,
    next: AtomicUsize,
    reply_timeout: Duration,
}

impl WorkerPool {
    /// Spawns `max_threads` workers; must be called inside a Tokio runtime
    pub fn new(config: &Config, filter: Arc<UrlFilter>) -> Self {
        let mut senders = Vec::with_capacity(config.workers.max_threads);

        for id in 0..config.workers.max_threads {
            let (tx, mut rx) = mpsc::unbounded_channel::<WorkerRequest>();
            let config = config.clone();
            let filter = filter.clone();

            tokio::spawn(async move {
                let ctx = match WorkerContext::new(id, &config, filter) {
                    Ok(ctx) => ctx,
                    Err(e) => {
                        tracing::error!("Worker {} failed to initialize: {}", id, e);
                        return;
                    }
                };
                tracing::debug!("Worker {} started", ctx.id);

                while let Some(request) = rx.recv().await {
                    let reply = handle_task(&ctx, request.task).await;
                    if request.reply.send(reply).is_err() {
                        tracing::debug!("Worker {}: reply receiver dropped", ctx.id);
                    }
                }
                tracing::debug!("Worker {} shutting down", ctx.id);
            });

            senders.push(tx);
        }

        Self {
            senders,
            next: AtomicUsize::new(0),
            reply_timeout: Duration::from_millis(config.workers.async_timeout_ms),
        }
    }

    /// Sends a task to the next worker in rotation and awaits its reply
    ///
    /// The await is bounded by the configured reply timeout, so a worker
    /// that hangs or dies mid-task degrades the task instead of stalling
    /// the crawl forever.
    pub async fn dispatch(&self, task: WorkerTask) -> crate::Result<TaskReply> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.senders.len();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.senders[index]
            .send(WorkerRequest {
                task,
                reply: reply_tx,
            })
            .map_err(|_| CrawlError::Worker(format!("worker {} channel closed", index)))?;

        match timeout(self.reply_timeout, reply_rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(CrawlError::Worker(format!(
                "worker {} dropped the reply channel",
                index
            ))),
            Err(_) => Err(CrawlError::Worker(format!(
                "worker {} reply timed out after {:?}",
                index, self.reply_timeout
            ))),
        }
    }

    /// Number of workers in the pool
    pub fn size(&self) -> usize {
        self.senders.len()
    }
}

async fn handle_task(ctx: &WorkerContext, task: WorkerTask) -> TaskReply {
    match task {
        WorkerTask::CrawlAndExtract {
            crawling_id,
            url,
            depth,
            config,
        } => crawl::crawl_and_extract(ctx, &crawling_id, &url, depth, &config).await,

        WorkerTask::DirectoryTree {
            crawling_id: _,
            root_path,
            config,
        } => match walk_directory_tree(&root_path, &config) {
            Ok(tree) => {
                let analysis = analyze_tree(&tree);
                TaskReply::DirectoryTree { tree, analysis }
            }
            Err(e) => TaskReply::Failed {
                error: format!("directory tree walk failed: {}", e),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.workers.max_threads = 2;
        config.rate_limit.enabled = false;
        config
    }

    fn crawl_config() -> CrawlConfig {
        Config::default()
            .resolve(&crate::config::CrawlOptions::default())
            .unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_returns_page_reply() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><title>Home</title></head><body><p>hello world</p></body></html>",
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let pool = WorkerPool::new(&test_config(), Arc::new(UrlFilter::new()));
        let reply = pool
            .dispatch(WorkerTask::CrawlAndExtract {
                crawling_id: "c1".to_string(),
                url: format!("{}/", server.uri()),
                depth: 0,
                config: crawl_config(),
            })
            .await
            .unwrap();

        match reply {
            TaskReply::Page { record, .. } => {
                assert_eq!(record.title, Some("Home".to_string()));
                assert!(!record.is_broken);
                assert_eq!(record.status_code, Some(200));
            }
            other => panic!("expected page reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_returns_broken_reply_on_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let pool = WorkerPool::new(&test_config(), Arc::new(UrlFilter::new()));
        let reply = pool
            .dispatch(WorkerTask::CrawlAndExtract {
                crawling_id: "c1".to_string(),
                url: format!("{}/missing", server.uri()),
                depth: 0,
                config: crawl_config(),
            })
            .await
            .unwrap();

        match reply {
            TaskReply::Broken {
                record,
                rate_limited,
            } => {
                assert!(record.is_broken);
                assert_eq!(record.status_code, Some(404));
                assert!(!rate_limited);
            }
            other => panic!("expected broken reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhausted_limiter_marks_task_rate_limited() {
        let mut config = test_config();
        config.rate_limit.enabled = true;
        config.rate_limit.bucket_capacity = 1;
        config.rate_limit.refill_rate_per_sec = 0.0;
        config.workers.max_threads = 1;

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let pool = WorkerPool::new(&config, Arc::new(UrlFilter::new()));
        let task = |url: String| WorkerTask::CrawlAndExtract {
            crawling_id: "c1".to_string(),
            url,
            depth: 0,
            config: crawl_config(),
        };

        // First task consumes the only token
        let first = pool.dispatch(task(format!("{}/a", server.uri()))).await.unwrap();
        assert!(matches!(first, TaskReply::Page { .. }));

        let second = pool.dispatch(task(format!("{}/b", server.uri()))).await.unwrap();
        match second {
            TaskReply::Broken {
                record,
                rate_limited,
            } => {
                assert!(rate_limited);
                assert!(record.is_broken);
            }
            other => panic!("expected rate-limited broken reply, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_round_robin_rotates_over_pool() {
        let pool = WorkerPool::new(&test_config(), Arc::new(UrlFilter::new()));
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.next.fetch_add(1, Ordering::Relaxed) % 2, 0);
        assert_eq!(pool.next.fetch_add(1, Ordering::Relaxed) % 2, 1);
        assert_eq!(pool.next.fetch_add(1, Ordering::Relaxed) % 2, 0);
    }

    #[tokio::test]
    async fn test_directory_tree_task() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let config = test_config();
        let pool = WorkerPool::new(&config, Arc::new(UrlFilter::new()));
        let reply = pool
            .dispatch(WorkerTask::DirectoryTree {
                crawling_id: "c1".to_string(),
                root_path: dir.path().to_path_buf(),
                config: config.directory_tree.clone(),
            })
            .await
            .unwrap();

        match reply {
            TaskReply::DirectoryTree { analysis, .. } => {
                assert_eq!(analysis.file_count, 1);
            }
            other => panic!("expected directory tree reply, got {:?}", other),
        }
    }
}
