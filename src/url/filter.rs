//! Inclusion/exclusion filtering of candidate URLs
//!
//! Operators can scope a crawl with ordered allow/deny patterns. Rules are
//! mutable at runtime while being read by many concurrent link-extraction
//! calls, so the rule lists sit behind a read-write lock: reads are the
//! common path, writes are rare.

use crate::ConfigError;
use regex::Regex;
use std::sync::RwLock;

/// A single inclusion or exclusion rule
#[derive(Debug)]
struct Rule {
    pattern: String,
    matcher: Matcher,
}

#[derive(Debug)]
enum Matcher {
    /// Substring containment
    Substring,
    /// Compiled regular expression
    Regex(Regex),
}

impl Rule {
    fn new(pattern: &str, is_regex: bool) -> Result<Self, ConfigError> {
        let matcher = if is_regex {
            let regex = Regex::new(pattern)
                .map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", pattern, e)))?;
            Matcher::Regex(regex)
        } else {
            Matcher::Substring
        };
        Ok(Self {
            pattern: pattern.to_string(),
            matcher,
        })
    }

    fn matches(&self, url: &str) -> bool {
        match &self.matcher {
            Matcher::Substring => url.contains(&self.pattern),
            Matcher::Regex(regex) => regex.is_match(url),
        }
    }
}

/// URL filter with runtime-mutable inclusion and exclusion rules
///
/// Semantics: if any inclusion rules exist, a URL must match at least one
/// of them to pass; regardless, a URL matching any exclusion rule is
/// rejected.
#[derive(Debug, Default)]
pub struct UrlFilter {
    inclusion_rules: RwLock<Vec<Rule>>,
    exclusion_rules: RwLock<Vec<Rule>>,
}

impl UrlFilter {
    /// Creates an empty filter that allows every URL
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an inclusion rule
    ///
    /// Regular-expression patterns are compiled here; an invalid pattern is
    /// rejected instead of being stored.
    pub fn add_inclusion_rule(&self, pattern: &str, is_regex: bool) -> Result<(), ConfigError> {
        let rule = Rule::new(pattern, is_regex)?;
        self.inclusion_rules.write().unwrap().push(rule);
        Ok(())
    }

    /// Adds an exclusion rule
    pub fn add_exclusion_rule(&self, pattern: &str, is_regex: bool) -> Result<(), ConfigError> {
        let rule = Rule::new(pattern, is_regex)?;
        self.exclusion_rules.write().unwrap().push(rule);
        Ok(())
    }

    /// Removes all inclusion rules with the given pattern
    pub fn remove_inclusion_rule(&self, pattern: &str) {
        self.inclusion_rules
            .write()
            .unwrap()
            .retain(|rule| rule.pattern != pattern);
    }

    /// Removes all exclusion rules with the given pattern
    pub fn remove_exclusion_rule(&self, pattern: &str) {
        self.exclusion_rules
            .write()
            .unwrap()
            .retain(|rule| rule.pattern != pattern);
    }

    /// Checks whether a URL passes the current rule set
    pub fn is_url_allowed(&self, url: &str) -> bool {
        {
            let inclusion = self.inclusion_rules.read().unwrap();
            if !inclusion.is_empty() && !inclusion.iter().any(|rule| rule.matches(url)) {
                return false;
            }
        }

        !self
            .exclusion_rules
            .read()
            .unwrap()
            .iter()
            .any(|rule| rule.matches(url))
    }

    /// Returns the patterns of all inclusion rules
    pub fn inclusion_patterns(&self) -> Vec<String> {
        self.inclusion_rules
            .read()
            .unwrap()
            .iter()
            .map(|rule| rule.pattern.clone())
            .collect()
    }

    /// Returns the patterns of all exclusion rules
    pub fn exclusion_patterns(&self) -> Vec<String> {
        self.exclusion_rules
            .read()
            .unwrap()
            .iter()
            .map(|rule| rule.pattern.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_allows_everything() {
        let filter = UrlFilter::new();
        assert!(filter.is_url_allowed("https://example.com/anything"));
    }

    #[test]
    fn test_exclusion_substring() {
        let filter = UrlFilter::new();
        filter.add_exclusion_rule("/admin", false).unwrap();

        assert!(!filter.is_url_allowed("https://example.com/admin/users"));
        assert!(filter.is_url_allowed("https://example.com/blog"));
    }

    #[test]
    fn test_inclusion_requires_a_match() {
        let filter = UrlFilter::new();
        filter.add_inclusion_rule("/blog", false).unwrap();

        assert!(filter.is_url_allowed("https://example.com/blog/post-1"));
        assert!(!filter.is_url_allowed("https://example.com/shop"));
    }

    #[test]
    fn test_exclusion_wins_over_inclusion() {
        let filter = UrlFilter::new();
        filter.add_inclusion_rule("/blog", false).unwrap();
        filter.add_exclusion_rule("draft", false).unwrap();

        assert!(filter.is_url_allowed("https://example.com/blog/post"));
        assert!(!filter.is_url_allowed("https://example.com/blog/draft-post"));
    }

    #[test]
    fn test_regex_rule() {
        let filter = UrlFilter::new();
        filter
            .add_exclusion_rule(r"\?page=\d+$", true)
            .unwrap();

        assert!(!filter.is_url_allowed("https://example.com/list?page=2"));
        assert!(filter.is_url_allowed("https://example.com/list"));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let filter = UrlFilter::new();
        let result = filter.add_exclusion_rule("[unclosed", true);
        assert!(matches!(result, Err(ConfigError::InvalidPattern(_))));
        // The broken pattern must not have been stored
        assert!(filter.is_url_allowed("https://example.com/[unclosed"));
    }

    #[test]
    fn test_remove_rule() {
        let filter = UrlFilter::new();
        filter.add_exclusion_rule("/private", false).unwrap();
        assert!(!filter.is_url_allowed("https://example.com/private"));

        filter.remove_exclusion_rule("/private");
        assert!(filter.is_url_allowed("https://example.com/private"));
    }

    #[test]
    fn test_pattern_listing() {
        let filter = UrlFilter::new();
        filter.add_inclusion_rule("/a", false).unwrap();
        filter.add_inclusion_rule("/b", false).unwrap();

        assert_eq!(filter.inclusion_patterns(), vec!["/a", "/b"]);
        assert!(filter.exclusion_patterns().is_empty());
    }
}
