//! Sitemap discovery and recursive expansion
//!
//! Discovery unions `Sitemap:` references from robots.txt with a probe of
//! well-known sitemap paths. Expansion walks sitemap indexes recursively
//! into a flat page URL list, bounded by one global cap across the whole
//! expansion so a pathological index cannot cause unbounded work.

mod parser;

pub use parser::{decode_body, parse_content, ParsedSitemap};

use crate::config::Config;
use crate::CrawlError;
use reqwest::header::CONTENT_TYPE;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// Well-known sitemap locations probed during discovery
const WELL_KNOWN_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap.txt",
    "/sitemap.rss",
    "/sitemap.atom",
];

/// Finds and expands sitemaps for a site
pub struct SitemapCrawler {
    client: reqwest::Client,
    max_urls: usize,
}

impl SitemapCrawler {
    /// Builds a sitemap crawler from the loaded configuration
    pub fn new(config: &Config) -> crate::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.crawler.user_agent.clone())
            .timeout(Duration::from_millis(config.sitemap.timeout_ms))
            .gzip(true)
            .build()?;

        Ok(Self {
            client,
            max_urls: config.sitemap.max_urls,
        })
    }

    /// Discovers sitemap URLs for the origin of the given URL
    ///
    /// Unions `Sitemap:` lines from robots.txt with well-known paths that
    /// answer a HEAD probe. Failures are logged and simply yield fewer
    /// candidates; discovery itself never fails.
    pub async fn discover_sitemaps(&self, url: &str) -> Vec<String> {
        let Ok(parsed) = Url::parse(url) else {
            return Vec::new();
        };
        let origin = parsed.origin().ascii_serialization();

        let mut seen = HashSet::new();
        let mut sitemaps = Vec::new();

        for reference in self.sitemaps_from_robots(&origin).await {
            if seen.insert(reference.clone()) {
                sitemaps.push(reference);
            }
        }

        for path in WELL_KNOWN_PATHS {
            let candidate = format!("{}{}", origin, path);
            match self.client.head(&candidate).send().await {
                Ok(response) if response.status().is_success() => {
                    if seen.insert(candidate.clone()) {
                        sitemaps.push(candidate);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("HEAD probe failed for {}: {}", candidate, e);
                }
            }
        }

        tracing::info!("Discovered {} sitemap(s) for {}", sitemaps.len(), origin);
        sitemaps
    }

    /// Expands one sitemap (or sitemap index) into a flat page URL list
    ///
    /// Child sitemaps of an index are fetched recursively; a failing child
    /// is skipped and logged rather than aborting the expansion. The
    /// returned list never exceeds the configured URL cap.
    pub async fn fetch_sitemap(&self, url: &str) -> crate::Result<Vec<String>> {
        let mut urls = Vec::new();
        self.expand(url.to_string(), &mut urls).await?;
        Ok(urls)
    }

    /// Reads `Sitemap:` lines from the origin's robots.txt
    async fn sitemaps_from_robots(&self, origin: &str) -> Vec<String> {
        let robots_url = format!("{}/robots.txt", origin);
        let body = match self.client.get(&robots_url).send().await {
            Ok(response) if response.status().is_success() => {
                response.text().await.unwrap_or_default()
            }
            Ok(_) => return Vec::new(),
            Err(e) => {
                tracing::debug!("Failed to fetch {}: {}", robots_url, e);
                return Vec::new();
            }
        };

        body.lines()
            .filter_map(|line| {
                let line = line.trim();
                let (key, value) = line.split_once(':')?;
                if key.trim().eq_ignore_ascii_case("sitemap") {
                    let value = value.trim();
                    (!value.is_empty()).then(|| value.to_string())
                } else {
                    None
                }
            })
            .collect()
    }

    /// Recursive expansion step; boxed because async recursion needs it
    fn expand<'a>(
        &'a self,
        url: String,
        accumulated: &'a mut Vec<String>,
    ) -> Pin<Box<dyn Future<Output = crate::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if accumulated.len() >= self.max_urls {
                return Ok(());
            }

            let (content, content_type) = self.download(&url).await?;
            let parsed = parser::parse_content(&content, content_type.as_deref()).map_err(
                |message| CrawlError::Sitemap {
                    url: url.clone(),
                    message,
                },
            )?;

            match parsed {
                ParsedSitemap::Urls(urls) => {
                    let remaining = self.max_urls - accumulated.len();
                    accumulated.extend(urls.into_iter().take(remaining));
                }
                ParsedSitemap::Index(children) => {
                    for child in children {
                        if accumulated.len() >= self.max_urls {
                            tracing::warn!(
                                "Sitemap URL cap of {} reached, truncating index expansion",
                                self.max_urls
                            );
                            break;
                        }
                        if let Err(e) = self.expand(child.clone(), accumulated).await {
                            tracing::warn!("Skipping child sitemap {}: {}", child, e);
                        }
                    }
                }
            }

            Ok(())
        })
    }

    /// Downloads a sitemap body, gunzipping it when the magic bytes say so
    async fn download(&self, url: &str) -> crate::Result<(String, Option<String>)> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| CrawlError::Http {
                url: url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CrawlError::Sitemap {
                url: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|source| CrawlError::Http {
            url: url.to_string(),
            source,
        })?;

        let content = parser::decode_body(&bytes).map_err(|message| CrawlError::Sitemap {
            url: url.to_string(),
            message,
        })?;

        Ok((content, content_type))
    }
}
