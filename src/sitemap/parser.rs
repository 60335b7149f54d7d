//! Sitemap body decoding and format parsing
//!
//! Four formats are understood: XML sitemaps and sitemap indexes, plain
//! text (one URL per line), RSS, and Atom. Bodies are transparently
//! gunzipped when they start with the gzip magic bytes; servers mislabel
//! compressed sitemaps often enough that the content-type header cannot be
//! trusted for this.

use flate2::read::GzDecoder;
use std::io::Read;
use sxd_document::parser;
use sxd_document::Package;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// One parsed sitemap document
#[derive(Debug)]
pub enum ParsedSitemap {
    /// A sitemap index pointing at child sitemap URLs
    Index(Vec<String>),
    /// A leaf document yielding page URLs
    Urls(Vec<String>),
}

/// Decodes a raw sitemap body, gunzipping when the magic bytes say so
pub fn decode_body(bytes: &[u8]) -> Result<String, String> {
    if bytes.len() >= 2 && bytes[0] == 0x1f && bytes[1] == 0x8b {
        let mut decoder = GzDecoder::new(bytes);
        let mut content = String::new();
        decoder
            .read_to_string(&mut content)
            .map_err(|e| format!("gzip decode error: {}", e))?;
        Ok(content)
    } else {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Parses a decoded sitemap body
///
/// Dispatches on the declared content type; when the header is missing or
/// generic the body itself is sniffed (markup versus line-delimited text).
pub fn parse_content(content: &str, content_type: Option<&str>) -> Result<ParsedSitemap, String> {
    let declared = content_type.unwrap_or("").to_lowercase();

    if declared.contains("xml") {
        parse_xml(content)
    } else if declared.contains("text/plain") {
        Ok(parse_text(content))
    } else if content.trim_start().starts_with('<') {
        parse_xml(content)
    } else {
        Ok(parse_text(content))
    }
}

/// Parses an XML document: urlset, sitemapindex, RSS channel, or Atom feed
fn parse_xml(content: &str) -> Result<ParsedSitemap, String> {
    let package = parser::parse(content).map_err(|e| format!("XML parse error: {}", e))?;
    let root_name = root_element_name(&package)
        .ok_or_else(|| "XML document has no root element".to_string())?;

    match root_name.as_str() {
        "sitemapindex" => {
            let children = evaluate_strings(&package, "//sm:loc", Some(("sm", SITEMAP_NS)))
                .or_else(|_| evaluate_strings(&package, "//loc", None))?;
            Ok(ParsedSitemap::Index(children))
        }
        "urlset" => {
            let mut urls = evaluate_strings(&package, "//sm:loc", Some(("sm", SITEMAP_NS)))?;
            if urls.is_empty() {
                // Some generators omit the namespace declaration
                urls = evaluate_strings(&package, "//loc", None)?;
            }
            Ok(ParsedSitemap::Urls(urls))
        }
        "rss" => {
            let urls = evaluate_strings(&package, "//item/link", None)?;
            Ok(ParsedSitemap::Urls(urls))
        }
        "feed" => {
            let urls = evaluate_strings(&package, "//a:entry/a:link/@href", Some(("a", ATOM_NS)))?;
            Ok(ParsedSitemap::Urls(urls))
        }
        other => Err(format!("Unsupported sitemap root element: {}", other)),
    }
}

/// Parses line-delimited text sitemaps, keeping only http(s) lines
fn parse_text(content: &str) -> ParsedSitemap {
    let urls = content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("http"))
        .map(str::to_string)
        .collect();
    ParsedSitemap::Urls(urls)
}

/// Returns the local name of the document's root element
fn root_element_name(package: &Package) -> Option<String> {
    package
        .as_document()
        .root()
        .children()
        .into_iter()
        .find_map(|child| child.element())
        .map(|element| element.name().local_part().to_string())
}

/// Evaluates an XPath expression to a list of non-empty string values
fn evaluate_strings(
    package: &Package,
    expression: &str,
    namespace: Option<(&str, &str)>,
) -> Result<Vec<String>, String> {
    let document = package.as_document();
    let factory = sxd_xpath::Factory::new();
    let mut context = sxd_xpath::Context::new();
    if let Some((prefix, uri)) = namespace {
        context.set_namespace(prefix, uri);
    }

    let xpath = factory
        .build(expression)
        .map_err(|e| format!("XPath build error: {}", e))?
        .ok_or_else(|| "Missing XPath".to_string())?;
    let value = xpath
        .evaluate(&context, document.root())
        .map_err(|e| format!("XPath evaluation error: {}", e))?;

    if let sxd_xpath::Value::Nodeset(nodes) = value {
        Ok(nodes
            .iter()
            .map(|node| node.string_value().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    } else {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/about</loc></url>
</urlset>"#;

    #[test]
    fn test_parse_xml_urlset() {
        let parsed = parse_content(URLSET, Some("application/xml")).unwrap();
        match parsed {
            ParsedSitemap::Urls(urls) => {
                assert_eq!(urls.len(), 2);
                assert!(urls.contains(&"https://example.com/".to_string()));
            }
            ParsedSitemap::Index(_) => panic!("expected urlset"),
        }
    }

    #[test]
    fn test_parse_xml_sitemapindex() {
        let content = r#"<?xml version="1.0"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/sitemap-a.xml</loc></sitemap>
  <sitemap><loc>https://example.com/sitemap-b.xml</loc></sitemap>
</sitemapindex>"#;

        let parsed = parse_content(content, Some("text/xml")).unwrap();
        match parsed {
            ParsedSitemap::Index(children) => assert_eq!(children.len(), 2),
            ParsedSitemap::Urls(_) => panic!("expected index"),
        }
    }

    #[test]
    fn test_parse_urlset_without_namespace() {
        let content = "<urlset><url><loc>https://example.com/page</loc></url></urlset>";
        let parsed = parse_content(content, Some("application/xml")).unwrap();
        match parsed {
            ParsedSitemap::Urls(urls) => assert_eq!(urls, vec!["https://example.com/page"]),
            ParsedSitemap::Index(_) => panic!("expected urlset"),
        }
    }

    #[test]
    fn test_parse_text_sitemap() {
        let content = "https://example.com/a\nhttps://example.com/b\n# comment\n\n";
        let parsed = parse_content(content, Some("text/plain")).unwrap();
        match parsed {
            ParsedSitemap::Urls(urls) => {
                assert_eq!(urls, vec!["https://example.com/a", "https://example.com/b"]);
            }
            ParsedSitemap::Index(_) => panic!("expected urls"),
        }
    }

    #[test]
    fn test_parse_rss() {
        let content = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example</title>
    <item><link>https://example.com/post-1</link></item>
    <item><link>https://example.com/post-2</link></item>
  </channel>
</rss>"#;

        let parsed = parse_content(content, Some("application/rss+xml")).unwrap();
        match parsed {
            ParsedSitemap::Urls(urls) => {
                assert_eq!(urls, vec!["https://example.com/post-1", "https://example.com/post-2"]);
            }
            ParsedSitemap::Index(_) => panic!("expected urls"),
        }
    }

    #[test]
    fn test_parse_atom() {
        let content = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example</title>
  <entry><link href="https://example.com/entry-1"/></entry>
  <entry><link href="https://example.com/entry-2"/></entry>
</feed>"#;

        let parsed = parse_content(content, Some("application/atom+xml")).unwrap();
        match parsed {
            ParsedSitemap::Urls(urls) => {
                assert_eq!(
                    urls,
                    vec!["https://example.com/entry-1", "https://example.com/entry-2"]
                );
            }
            ParsedSitemap::Index(_) => panic!("expected urls"),
        }
    }

    #[test]
    fn test_sniffs_xml_without_content_type() {
        let parsed = parse_content(URLSET, None).unwrap();
        assert!(matches!(parsed, ParsedSitemap::Urls(_)));
    }

    #[test]
    fn test_sniffs_text_without_content_type() {
        let parsed = parse_content("https://example.com/only", None).unwrap();
        match parsed {
            ParsedSitemap::Urls(urls) => assert_eq!(urls, vec!["https://example.com/only"]),
            ParsedSitemap::Index(_) => panic!("expected urls"),
        }
    }

    #[test]
    fn test_unsupported_root_rejected() {
        let result = parse_content("<html><body></body></html>", Some("application/xml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_plain_body() {
        let decoded = decode_body(b"hello").unwrap();
        assert_eq!(decoded, "hello");
    }

    #[test]
    fn test_decode_gzip_body_by_magic_bytes() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(URLSET.as_bytes()).unwrap();
        let compressed = encoder.finish().unwrap();

        assert_eq!(compressed[0], 0x1f);
        assert_eq!(compressed[1], 0x8b);

        let decoded = decode_body(&compressed).unwrap();
        assert_eq!(decoded, URLSET);
    }

    #[test]
    fn test_truncated_gzip_fails() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"payload").unwrap();
        let mut compressed = encoder.finish().unwrap();
        compressed.truncate(6);

        assert!(decode_body(&compressed).is_err());
    }
}
