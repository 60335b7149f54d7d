use crate::config::types::{Config, RateLimitConfig, WorkerConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_limits(
        config.crawler.default_url_limit,
        config.crawler.default_depth_limit,
    )?;
    validate_worker_config(&config.workers)?;
    validate_rate_limit_config(&config.rate_limit)?;

    if config.crawler.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.output.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if !(0.0..=1.0).contains(&config.dedup.near_duplicate_threshold) {
        return Err(ConfigError::Validation(format!(
            "near-duplicate-threshold must be within [0, 1], got {}",
            config.dedup.near_duplicate_threshold
        )));
    }

    Ok(())
}

/// Validates the URL and depth budget of a crawl
///
/// This is the only crawl-fatal validation: a non-positive limit prevents
/// the crawl from starting at all.
pub fn validate_crawl_limits(url_limit: usize, depth_limit: u32) -> Result<(), ConfigError> {
    if url_limit == 0 || depth_limit == 0 {
        return Err(ConfigError::Validation(format!(
            "URL limit and depth limit must be positive, got url_limit={}, depth_limit={}",
            url_limit, depth_limit
        )));
    }
    Ok(())
}

/// Validates worker pool configuration
fn validate_worker_config(config: &WorkerConfig) -> Result<(), ConfigError> {
    if config.max_threads == 0 {
        return Err(ConfigError::Validation(
            "max-threads must be >= 1".to_string(),
        ));
    }

    if config.async_batch_size == 0 {
        return Err(ConfigError::Validation(
            "async-batch-size must be >= 1".to_string(),
        ));
    }

    if config.concurrency_limit == 0 {
        return Err(ConfigError::Validation(
            "concurrency-limit must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates rate limiter configuration
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.enabled && config.bucket_capacity == 0 {
        return Err(ConfigError::Validation(
            "bucket-capacity must be >= 1 when the rate limiter is enabled".to_string(),
        ));
    }

    if config.refill_rate_per_sec < 0.0 {
        return Err(ConfigError::Validation(format!(
            "refill-rate-per-sec must not be negative, got {}",
            config.refill_rate_per_sec
        )));
    }

    Ok(())
}
