//! Cross-page duplicate content and canonical consistency analysis
//!
//! Runs once per session after all pages are persisted. The content pass
//! compares every unordered pair of page fingerprints, which is O(n²) in
//! page count; that is acceptable for the intended crawl sizes (hundreds
//! to low thousands of pages) and a known scaling limit beyond that.

use crate::analysis::simhash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Duplicate and near-duplicate adjacency maps, keyed by page URL
///
/// Both maps are symmetric: if A lists B, then B lists A.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub duplicates: BTreeMap<String, Vec<String>>,
    pub near_duplicates: BTreeMap<String, Vec<String>>,
}

/// Compares all page fingerprints pairwise
///
/// Similarity of exactly 1 makes a pair duplicates; similarity in
/// `[near_threshold, 1)` makes it near duplicates.
pub fn detect_duplicate_content(
    fingerprints: &[(String, u64)],
    near_threshold: f64,
) -> DuplicateReport {
    let mut report = DuplicateReport::default();

    for i in 0..fingerprints.len() {
        for j in (i + 1)..fingerprints.len() {
            let (url_a, hash_a) = &fingerprints[i];
            let (url_b, hash_b) = &fingerprints[j];
            let similarity = simhash::similarity(*hash_a, *hash_b);

            if similarity >= 1.0 {
                link(&mut report.duplicates, url_a, url_b);
            } else if similarity >= near_threshold {
                link(&mut report.near_duplicates, url_a, url_b);
            }
        }
    }

    report
}

fn link(map: &mut BTreeMap<String, Vec<String>>, a: &str, b: &str) {
    map.entry(a.to_string()).or_default().push(b.to_string());
    map.entry(b.to_string()).or_default().push(a.to_string());
}

/// One group of pages pointing at the same canonical target without the
/// target being any of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalInconsistency {
    pub canonical_url: String,
    pub conflicting_urls: Vec<String>,
}

/// Result of the canonical consistency pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalConsistencyAnalysis {
    pub is_consistent: bool,
    pub inconsistencies: Vec<CanonicalInconsistency>,
}

/// Groups canonical observations and flags inconsistent groups
///
/// A group is inconsistent when more than one page declares the same
/// canonical target and the target is not one of those pages itself.
pub fn analyze_canonical_consistency(
    observations: &[(String, String)],
) -> CanonicalConsistencyAnalysis {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (url, canonical) in observations {
        if canonical.is_empty() {
            continue;
        }
        groups.entry(canonical.clone()).or_default().push(url.clone());
    }

    let inconsistencies: Vec<CanonicalInconsistency> = groups
        .into_iter()
        .filter(|(canonical, urls)| urls.len() > 1 && !urls.contains(canonical))
        .map(|(canonical_url, conflicting_urls)| CanonicalInconsistency {
            canonical_url,
            conflicting_urls,
        })
        .collect();

    CanonicalConsistencyAnalysis {
        is_consistent: inconsistencies.is_empty(),
        inconsistencies,
    }
}
