//! The fetch → extract → score task executed inside a worker
//!
//! A task always produces a structured reply: a full page outcome with the
//! newly discovered URLs, or a broken-page outcome carrying the status or
//! error. Failures never propagate out of the task.

use crate::analysis::{self, extract_page_content};
use crate::config::CrawlConfig;
use crate::robots::RobotsCache;
use crate::storage::PageRecord;
use crate::url::UrlFilter;
use crate::worker::{TaskReply, WorkerContext};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Instant;
use url::Url;

/// Number of top terms reported per page for the site keyword accumulator
const KEYWORDS_PER_PAGE: usize = 10;

/// Runs one crawl-and-extract task end to end
pub(crate) async fn crawl_and_extract(
    ctx: &WorkerContext,
    crawling_id: &str,
    url: &str,
    depth: u32,
    config: &CrawlConfig,
) -> TaskReply {
    let relative = relative_url(url);

    // Politeness gate: fail fast, the task is dropped rather than queued
    if ctx.limiter.acquire().is_err() {
        tracing::warn!("Rate limit exceeded for {}", url);
        return TaskReply::Broken {
            record: PageRecord::broken(
                crawling_id,
                &relative,
                depth,
                None,
                Some("Rate limit exceeded".to_string()),
            ),
            rate_limited: true,
        };
    }

    let started = Instant::now();
    let response = match ctx.client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Fetch failed for {}: {}", url, e);
            let status = e.status().map(|s| s.as_u16()).or(Some(0));
            return TaskReply::Broken {
                record: PageRecord::broken(crawling_id, &relative, depth, status, Some(e.to_string())),
                rate_limited: false,
            };
        }
    };

    let status = response.status().as_u16();
    if status >= 400 {
        tracing::warn!("Broken link detected: {} (status {})", url, status);
        return TaskReply::Broken {
            record: PageRecord::broken(crawling_id, &relative, depth, Some(status), None),
            rate_limited: false,
        };
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            return TaskReply::Broken {
                record: PageRecord::broken(
                    crawling_id,
                    &relative,
                    depth,
                    Some(status),
                    Some(e.to_string()),
                ),
                rate_limited: false,
            };
        }
    };
    let load_time_ms = started.elapsed().as_millis() as u64;

    // The parse tree is not Send, so everything derived from it happens
    // before the next await point.
    let (content, fingerprint, scores, keywords, candidates) = {
        let document = Html::parse_document(&body);
        let content = extract_page_content(&document);
        let fingerprint = analysis::fingerprint(&content.text);
        let scores = analysis::score_page(&content, load_time_ms);
        let keywords = analysis::extract_top_keywords(&content.text, KEYWORDS_PER_PAGE);
        let candidates = collect_candidate_links(&document, url, config, &ctx.filter);
        (content, fingerprint, scores, keywords, candidates)
    };

    let new_urls = if config.respect_robots_txt {
        filter_by_robots(&ctx.robots, candidates).await
    } else {
        candidates
    };

    let record = PageRecord {
        crawling_id: crawling_id.to_string(),
        page_url_relative: relative,
        title: content.title,
        status_code: Some(status),
        is_broken: false,
        error: None,
        depth,
        word_count: Some(content.word_count),
        load_time_ms: Some(load_time_ms),
        content_hash: Some(fingerprint),
        canonical_href: content.canonical_href,
        meta_description: content.meta_description,
        scores,
    };

    TaskReply::Page {
        record,
        new_urls,
        keywords,
    }
}

/// Collects filtered, locally-deduplicated candidate URLs from a page
///
/// Anchor targets are resolved against the page's origin, kept when the
/// path extension is crawlable, checked against the follow policy and the
/// inclusion/exclusion filter, and deduplicated per call. Global novelty
/// is the orchestrator's job, not this one's.
pub(crate) fn collect_candidate_links(
    document: &Html,
    base_url: &str,
    config: &CrawlConfig,
    filter: &UrlFilter,
) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let mut origin = base.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);

    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }

        let Ok(resolved) = origin.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        if !has_crawlable_extension(&resolved) {
            continue;
        }
        if !should_follow(&resolved, &base, config) {
            continue;
        }

        let resolved = resolved.to_string();
        if !filter.is_url_allowed(&resolved) {
            continue;
        }
        if seen.insert(resolved.clone()) {
            candidates.push(resolved);
        }
    }

    candidates
}

/// Accepts paths without a dot, or with one of the crawlable extensions
fn has_crawlable_extension(url: &Url) -> bool {
    let path = url.path().to_lowercase();
    match path.rfind('.') {
        None => true,
        Some(index) => matches!(&path[index..], ".html" | ".htm" | ".php" | ".asp" | ".aspx"),
    }
}

/// Applies the same-origin / subfolder / external follow policy
fn should_follow(candidate: &Url, base: &Url, config: &CrawlConfig) -> bool {
    if candidate.host_str() == base.host_str() {
        if candidate.path().starts_with(base.path()) {
            config.follow_subfolder_links
        } else {
            config.follow_internal_links
        }
    } else {
        config.follow_external_links
    }
}

/// Checks every candidate against its origin's robots rules, concurrently
async fn filter_by_robots(robots: &RobotsCache, candidates: Vec<String>) -> Vec<String> {
    let verdicts =
        futures::future::join_all(candidates.iter().map(|url| robots.is_allowed(url))).await;

    candidates
        .into_iter()
        .zip(verdicts)
        .filter_map(|(url, allowed)| allowed.then_some(url))
        .collect()
}

/// Returns the path portion of a URL, used as the page record key
fn relative_url(url: &str) -> String {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}
