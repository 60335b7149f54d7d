//! Seoscope: a budgeted, polite SEO site crawler
//!
//! This crate crawls a website (or a directory tree treated as a URL space)
//! under an operator-supplied budget, discovering work from sitemaps and
//! in-page links while respecting robots.txt, rate limits and
//! inclusion/exclusion patterns, and deduplicating content across the run.

pub mod analysis;
pub mod config;
pub mod crawler;
pub mod limiter;
pub mod robots;
pub mod sitemap;
pub mod storage;
pub mod url;
pub mod worker;

use thiserror::Error;

/// Main error type for Seoscope operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Sitemap error for {url}: {message}")]
    Sitemap { url: String, message: String },

    #[error("Worker did not reply: {0}")]
    Worker(String),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid rule pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Seoscope operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use crate::config::{Config, CrawlConfig, CrawlOptions};
pub use crate::crawler::{Coordinator, CrawlEvent, CrawlReport, EventSink};
pub use crate::url::{extract_domain, normalize_url, UrlFilter};
