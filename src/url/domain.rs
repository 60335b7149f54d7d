use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to
/// lowercase. If the URL has no host, it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seoscope::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Derives the deterministic crawling session identifier for a domain
///
/// Re-crawling the same domain always maps onto the same session, so
/// results accumulate instead of forking.
///
/// # Examples
///
/// ```
/// use seoscope::url::crawling_id_for;
///
/// assert_eq!(crawling_id_for("example.com"), "crawl_example_com");
/// ```
pub fn crawling_id_for(domain: &str) -> String {
    let sanitized: String = domain
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("crawl_{}", sanitized)
}
