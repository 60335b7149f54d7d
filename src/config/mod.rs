//! Configuration module for Seoscope
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, plus per-crawl option resolution.

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlConfig, CrawlOptions, DedupConfig, DirectoryTreeConfig, GeneralConfig,
    OutputConfig, RateLimitConfig, SitemapConfig, WorkerConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

// Re-export validation entry points
pub use validation::{validate, validate_crawl_limits};
