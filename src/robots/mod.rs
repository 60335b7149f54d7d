//! Robots.txt compliance for outbound fetches
//!
//! On first access to an origin the cache fetches and parses its
//! `robots.txt`; subsequent lookups reuse the parsed rules for the process
//! lifetime. There is no TTL or refresh.

mod parser;

pub use parser::{Directive, RuleSet};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Per-origin robots.txt cache
///
/// Shared by the link-extraction path of a worker; lookups for an already
/// cached origin are cheap, a cache miss fetches the file once.
pub struct RobotsCache {
    client: reqwest::Client,
    user_agent: String,
    cache: Mutex<HashMap<String, Arc<RuleSet>>>,
}

impl RobotsCache {
    /// Creates an empty cache fetching with the given client and agent
    pub fn new(client: reqwest::Client, user_agent: String) -> Self {
        Self {
            client,
            user_agent,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Checks whether a URL may be fetched according to its origin's rules
    ///
    /// A URL that cannot be parsed is allowed through; it will fail at
    /// fetch time with a more useful error. A robots.txt that cannot be
    /// fetched yields an empty rule set, which allows everything.
    pub async fn is_allowed(&self, url: &str) -> bool {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(_) => return true,
        };
        let origin = parsed.origin().ascii_serialization();
        let rules = self.rules_for(&origin).await;
        rules.is_path_allowed(&self.user_agent, parsed.path())
    }

    /// Returns the cached rules for an origin, fetching them on first use
    async fn rules_for(&self, origin: &str) -> Arc<RuleSet> {
        let mut cache = self.cache.lock().await;
        if let Some(rules) = cache.get(origin) {
            return rules.clone();
        }

        let content = self.fetch_robots(origin).await;
        let rules = Arc::new(RuleSet::parse(&content));
        cache.insert(origin.to_string(), rules.clone());
        rules
    }

    /// Fetches robots.txt for an origin, returning empty content on failure
    async fn fetch_robots(&self, origin: &str) -> String {
        let robots_url = format!("{}/robots.txt", origin);
        match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().is_success() => {
                response.text().await.unwrap_or_default()
            }
            Ok(response) => {
                tracing::debug!(
                    "robots.txt at {} returned HTTP {}",
                    robots_url,
                    response.status()
                );
                String::new()
            }
            Err(e) => {
                tracing::debug!("Failed to fetch robots.txt from {}: {}", robots_url, e);
                String::new()
            }
        }
    }
}
