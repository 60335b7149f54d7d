use serde::Deserialize;

/// Main configuration structure for Seoscope
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub crawler: GeneralConfig,
    #[serde(default, rename = "rate-limit")]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub workers: WorkerConfig,
    #[serde(default)]
    pub sitemap: SitemapConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default, rename = "directory-tree")]
    pub directory_tree: DirectoryTreeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// General crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default maximum number of URLs to process in a crawl
    #[serde(rename = "default-url-limit")]
    pub default_url_limit: usize,

    /// Default maximum depth carried on crawl tasks
    #[serde(rename = "default-depth-limit")]
    pub default_depth_limit: u32,

    /// User agent string sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout in milliseconds
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Whether extracted candidate URLs are checked against robots.txt
    #[serde(rename = "respect-robots-txt")]
    pub respect_robots_txt: bool,

    /// Follow links to other paths on the same host
    #[serde(rename = "follow-internal-links")]
    pub follow_internal_links: bool,

    /// Follow links to other hosts
    #[serde(rename = "follow-external-links")]
    pub follow_external_links: bool,

    /// Follow links below the current page's path
    #[serde(rename = "follow-subfolder-links")]
    pub follow_subfolder_links: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_url_limit: 1000,
            default_depth_limit: 5,
            user_agent: "Seoscope Crawler/0.1".to_string(),
            request_timeout_ms: 30_000,
            respect_robots_txt: true,
            follow_internal_links: true,
            follow_external_links: false,
            follow_subfolder_links: true,
        }
    }
}

/// Token bucket rate limiter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum number of tokens the bucket can hold
    #[serde(rename = "bucket-capacity")]
    pub bucket_capacity: u32,

    /// Tokens added per second of elapsed wall-clock time
    #[serde(rename = "refill-rate-per-sec")]
    pub refill_rate_per_sec: f64,

    /// Whether the limiter gates fetches at all
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            bucket_capacity: 60,
            refill_rate_per_sec: 1.0,
            enabled: true,
        }
    }
}

/// Worker pool and wave scheduling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of worker tasks in the fixed pool
    #[serde(rename = "max-threads")]
    pub max_threads: usize,

    /// Maximum number of frontier entries dispatched per wave
    #[serde(rename = "async-batch-size")]
    pub async_batch_size: usize,

    /// Maximum number of fetch-class operations in flight at once
    #[serde(rename = "concurrency-limit")]
    pub concurrency_limit: usize,

    /// How long the orchestrator waits for a worker reply, in milliseconds
    #[serde(rename = "async-timeout-ms")]
    pub async_timeout_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_threads: 4,
            async_batch_size: 5,
            concurrency_limit: 10,
            async_timeout_ms: 30_000,
        }
    }
}

/// Sitemap discovery and parsing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Whether sitemap discovery runs during seeding
    pub enabled: bool,

    /// Global cap on URLs accumulated across a whole sitemap expansion
    #[serde(rename = "max-urls")]
    pub max_urls: usize,

    /// Per-request timeout for sitemap fetches, in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_urls: 50_000,
            timeout_ms: 30_000,
        }
    }
}

/// Content deduplication configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Similarity at or above which two pages count as near duplicates
    #[serde(rename = "near-duplicate-threshold")]
    pub near_duplicate_threshold: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            near_duplicate_threshold: 0.9,
        }
    }
}

/// Directory tree crawling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DirectoryTreeConfig {
    /// Maximum directory depth to descend
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Name substrings that exclude an entry from the walk
    #[serde(rename = "exclude-patterns")]
    pub exclude_patterns: Vec<String>,

    /// File extensions (without dot) included in the tree
    #[serde(rename = "allowed-extensions")]
    pub allowed_extensions: Vec<String>,
}

impl Default for DirectoryTreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 10,
            exclude_patterns: vec!["node_modules".to_string(), ".git".to_string()],
            allowed_extensions: vec![
                "html".to_string(),
                "htm".to_string(),
                "php".to_string(),
                "asp".to_string(),
                "aspx".to_string(),
            ],
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./seoscope.db".to_string(),
        }
    }
}

/// Per-crawl options supplied by the caller
///
/// Every field is optional; unset fields fall back to the loaded [`Config`].
#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    pub url_limit: Option<usize>,
    pub depth_limit: Option<u32>,
    pub follow_internal_links: Option<bool>,
    pub follow_external_links: Option<bool>,
    pub follow_subfolder_links: Option<bool>,
    pub specific_url_list: Vec<String>,
    pub use_directory_tree_crawling: bool,
    pub directory_tree_root_path: Option<String>,
    pub custom_starting_points: Vec<String>,
    pub sitemap_enabled: Option<bool>,
}

/// Resolved per-crawl configuration carried on every worker task
///
/// Built once per crawl by merging [`CrawlOptions`] over the loaded
/// [`Config`]; cheap to clone into task messages.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub url_limit: usize,
    pub depth_limit: u32,
    pub follow_internal_links: bool,
    pub follow_external_links: bool,
    pub follow_subfolder_links: bool,
    pub sitemap_enabled: bool,
    pub respect_robots_txt: bool,
}

impl Config {
    /// Merges per-crawl options over the loaded configuration
    ///
    /// Fails with [`crate::ConfigError::Validation`] when the resulting
    /// URL or depth limit is not positive; this is the only crawl-fatal
    /// validation and it runs before any work starts.
    pub fn resolve(&self, options: &CrawlOptions) -> crate::ConfigResult<CrawlConfig> {
        let url_limit = options.url_limit.unwrap_or(self.crawler.default_url_limit);
        let depth_limit = options
            .depth_limit
            .unwrap_or(self.crawler.default_depth_limit);
        super::validation::validate_crawl_limits(url_limit, depth_limit)?;

        Ok(CrawlConfig {
            url_limit,
            depth_limit,
            follow_internal_links: options
                .follow_internal_links
                .unwrap_or(self.crawler.follow_internal_links),
            follow_external_links: options
                .follow_external_links
                .unwrap_or(self.crawler.follow_external_links),
            follow_subfolder_links: options
                .follow_subfolder_links
                .unwrap_or(self.crawler.follow_subfolder_links),
            sitemap_enabled: options.sitemap_enabled.unwrap_or(self.sitemap.enabled),
            respect_robots_txt: self.crawler.respect_robots_txt,
        })
    }
}
