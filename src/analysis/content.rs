//! Page content extraction
//!
//! Pulls the pieces of a parsed HTML document that the crawl records and
//! the dedup pass consume: title, meta description, canonical declaration,
//! visible text and derived counts.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

/// Extracted content of one fetched page
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    /// Text of the `<title>` element, if present and non-empty
    pub title: Option<String>,
    /// Content of `<meta name="description">`
    pub meta_description: Option<String>,
    /// Href of `<link rel="canonical">`
    pub canonical_href: Option<String>,
    /// Visible text with scripts, styles and iframes stripped
    pub text: String,
    /// Whitespace-separated word count of the visible text
    pub word_count: usize,
}

/// Extracts page content from a parsed document
pub fn extract_page_content(document: &Html) -> PageContent {
    let title = select_text(document, "title");
    let meta_description = select_attr(document, r#"meta[name="description"]"#, "content");
    let canonical_href = select_attr(document, r#"link[rel="canonical"]"#, "href");

    let text = extract_visible_text(document);
    let word_count = text.split_whitespace().count();

    PageContent {
        title,
        meta_description,
        canonical_href,
        text,
        word_count,
    }
}

/// Extracts the visible text of a document's body
///
/// Script, style, noscript and iframe subtrees are skipped; runs of
/// whitespace collapse to single spaces.
pub fn extract_visible_text(document: &Html) -> String {
    let mut raw = String::new();

    if let Ok(body_selector) = Selector::parse("body") {
        if let Some(body) = document.select(&body_selector).next() {
            collect_text(body, &mut raw);
        }
    }

    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(element: ElementRef, out: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if matches!(name, "script" | "style" | "noscript" | "iframe") {
                continue;
            }
            collect_text(child_element, out);
        } else if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        }
    }
}

/// Returns the most frequent terms of a text
///
/// Words shorter than four characters are ignored. Ties break
/// alphabetically so the output is deterministic.
pub fn extract_top_keywords(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 3)
    {
        *counts.entry(word.to_string()).or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(word, _)| word).collect()
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|s| !s.is_empty())
}
