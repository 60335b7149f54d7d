//! Per-page score map
//!
//! A small, bounded set of checks over the extracted content. Scores are
//! 0..=100 per key; the orchestrator averages them across all pages of a
//! session at finalization.

use crate::analysis::content::PageContent;
use std::collections::BTreeMap;

/// Computes the score map for one page
pub fn score_page(content: &PageContent, load_time_ms: u64) -> BTreeMap<String, f64> {
    let mut scores = BTreeMap::new();
    scores.insert("title".to_string(), title_score(content));
    scores.insert(
        "meta_description".to_string(),
        meta_description_score(content),
    );
    scores.insert("canonical".to_string(), canonical_score(content));
    scores.insert("content".to_string(), content_score(content));
    scores.insert("load_time".to_string(), load_time_score(load_time_ms));
    scores
}

/// Present and within the 10..=60 character window scores full marks
fn title_score(content: &PageContent) -> f64 {
    match &content.title {
        None => 0.0,
        Some(title) => {
            let len = title.chars().count();
            if (10..=60).contains(&len) {
                100.0
            } else {
                50.0
            }
        }
    }
}

/// Present and within the 50..=160 character window scores full marks
fn meta_description_score(content: &PageContent) -> f64 {
    match &content.meta_description {
        None => 0.0,
        Some(description) => {
            let len = description.chars().count();
            if (50..=160).contains(&len) {
                100.0
            } else {
                50.0
            }
        }
    }
}

fn canonical_score(content: &PageContent) -> f64 {
    if content.canonical_href.is_some() {
        100.0
    } else {
        0.0
    }
}

/// Scales linearly up to 300 words
fn content_score(content: &PageContent) -> f64 {
    let words = content.word_count.min(300) as f64;
    (words / 300.0 * 100.0).round()
}

/// Full marks at or under half a second, zero at five seconds or more
fn load_time_score(load_time_ms: u64) -> f64 {
    if load_time_ms <= 500 {
        100.0
    } else if load_time_ms >= 5000 {
        0.0
    } else {
        let span = (5000 - load_time_ms) as f64 / 4500.0;
        (span * 100.0).round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content_with(title: Option<&str>, description: Option<&str>, words: usize) -> PageContent {
        PageContent {
            title: title.map(String::from),
            meta_description: description.map(String::from),
            canonical_href: None,
            text: vec!["word"; words].join(" "),
            word_count: words,
        }
    }

    #[test]
    fn test_missing_title_scores_zero() {
        let scores = score_page(&content_with(None, None, 0), 100);
        assert_eq!(scores["title"], 0.0);
    }

    #[test]
    fn test_good_title_scores_full() {
        let scores = score_page(&content_with(Some("A well sized page title"), None, 0), 100);
        assert_eq!(scores["title"], 100.0);
    }

    #[test]
    fn test_short_title_scores_half() {
        let scores = score_page(&content_with(Some("Tiny"), None, 0), 100);
        assert_eq!(scores["title"], 50.0);
    }

    #[test]
    fn test_content_score_caps_at_300_words() {
        let scores = score_page(&content_with(None, None, 900), 100);
        assert_eq!(scores["content"], 100.0);
    }

    #[test]
    fn test_content_score_scales() {
        let scores = score_page(&content_with(None, None, 150), 100);
        assert_eq!(scores["content"], 50.0);
    }

    #[test]
    fn test_load_time_bounds() {
        assert_eq!(load_time_score(200), 100.0);
        assert_eq!(load_time_score(6000), 0.0);
        let mid = load_time_score(2750);
        assert!(mid > 0.0 && mid < 100.0);
    }

    #[test]
    fn test_all_score_keys_present() {
        let scores = score_page(&content_with(None, None, 0), 0);
        let keys: Vec<&str> = scores.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["canonical", "content", "load_time", "meta_description", "title"]
        );
    }
}
