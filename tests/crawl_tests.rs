//! End-to-end crawl tests
//!
//! These tests use wiremock to stand up mock HTTP servers and drive the
//! full crawl cycle: seeding, wave draining, persistence and finalization.

use seoscope::config::{Config, CrawlOptions};
use seoscope::crawler::{ChannelSink, Coordinator, CrawlEvent};
use seoscope::storage::{CrawlStore, SqliteStore};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration sized for fast local tests
fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.request_timeout_ms = 5_000;
    config.crawler.user_agent = "SeoscopeTest/1.0".to_string();
    config.workers.max_threads = 2;
    config.workers.async_batch_size = 4;
    config.workers.concurrency_limit = 4;
    config.workers.async_timeout_ms = 10_000;
    config.rate_limit.enabled = false;
    config.sitemap.timeout_ms = 5_000;
    config
}

fn options() -> CrawlOptions {
    CrawlOptions {
        url_limit: Some(20),
        depth_limit: Some(3),
        sitemap_enabled: Some(false),
        ..Default::default()
    }
}

fn coordinator(config: Config, store: Arc<SqliteStore>) -> (Coordinator, std::sync::mpsc::Receiver<CrawlEvent>) {
    let (sink, events) = ChannelSink::new();
    let coordinator = Coordinator::new(config, store, Arc::new(sink)).unwrap();
    (coordinator, events)
}

fn page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(page(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_follows_links_and_persists_pages() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home page of site</title></head>
           <body><p>welcome welcome welcome to the homepage of this site</p>
           <a href="/about.html">About</a>
           <a href="/contact.html">Contact</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/about.html",
        r#"<html><head><title>About us in detail</title></head>
           <body><p>about the team and the mission statement</p></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/contact.html",
        r#"<html><head><title>Contact information</title></head>
           <body><p>reach the office by mail or phone anytime</p></body></html>"#,
    )
    .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, events) = coordinator(test_config(), store.clone());

    let report = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options())
        .await
        .unwrap();

    assert_eq!(report.pages_processed, 3);
    assert!(!report.average_scores.is_empty());

    let pages = store.find_pages(&report.crawling_id).unwrap();
    assert_eq!(pages.len(), 3);
    assert!(pages.iter().all(|p| !p.is_broken));
    assert!(pages.iter().any(|p| p.page_url_relative == "/about.html"));

    // Progress events then a completion event
    let received: Vec<CrawlEvent> = events.try_iter().collect();
    assert!(received
        .iter()
        .any(|e| matches!(e, CrawlEvent::Progress { .. })));
    assert!(matches!(
        received.last(),
        Some(CrawlEvent::Completed { .. })
    ));
}

#[tokio::test]
async fn test_url_limit_bounds_dispatched_tasks() {
    let server = MockServer::start().await;
    let links: String = (0..8)
        .map(|i| format!(r#"<a href="/page-{}.html">p{}</a>"#, i, i))
        .collect();
    mount_page(
        &server,
        "/",
        &format!("<html><body>{}</body></html>", links),
    )
    .await;
    for i in 0..8 {
        mount_page(
            &server,
            &format!("/page-{}.html", i),
            "<html><body><p>content</p></body></html>",
        )
        .await;
    }

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, _events) = coordinator(test_config(), store.clone());

    let mut options = options();
    options.url_limit = Some(3);
    let report = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options)
        .await
        .unwrap();

    assert!(report.pages_processed <= 3);
    let pages = store.find_pages(&report.crawling_id).unwrap();
    assert!(pages.len() <= 3);
}

#[tokio::test]
async fn test_robots_disallowed_candidates_are_never_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /private\nAllow: /"),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
           <a href="/private/secret.html">secret</a>
           <a href="/public/ok.html">ok</a>
           </body></html>"#,
    )
    .await;
    mount_page(&server, "/public/ok.html", "<html><body>fine</body></html>").await;
    Mock::given(method("GET"))
        .and(path("/private/secret.html"))
        .respond_with(page("<html><body>must not be fetched</body></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, _events) = coordinator(test_config(), store.clone());

    let report = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options())
        .await
        .unwrap();

    let pages = store.find_pages(&report.crawling_id).unwrap();
    assert!(pages
        .iter()
        .all(|p| p.page_url_relative != "/private/secret.html"));
    assert!(pages
        .iter()
        .any(|p| p.page_url_relative == "/public/ok.html"));
}

#[tokio::test]
async fn test_broken_pages_become_records_not_errors() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/missing.html">gone</a></body></html>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, _events) = coordinator(test_config(), store.clone());

    let report = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options())
        .await
        .unwrap();

    let pages = store.find_pages(&report.crawling_id).unwrap();
    let broken = pages
        .iter()
        .find(|p| p.page_url_relative == "/missing.html")
        .expect("broken page recorded");
    assert!(broken.is_broken);
    assert_eq!(broken.status_code, Some(404));
}

#[tokio::test]
async fn test_specific_url_list_skips_discovery() {
    let server = MockServer::start().await;
    mount_page(&server, "/a.html", "<html><body>a</body></html>").await;
    mount_page(&server, "/b.html", "<html><body>b</body></html>").await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, _events) = coordinator(test_config(), store.clone());

    let mut options = options();
    options.specific_url_list = vec![
        format!("{}/a.html", server.uri()),
        format!("{}/b.html", server.uri()),
    ];
    let report = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options)
        .await
        .unwrap();

    assert_eq!(report.pages_processed, 2);
    let pages = store.find_pages(&report.crawling_id).unwrap();
    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn test_duplicate_pages_share_fingerprint() {
    let body = r#"<html><body><p>identical long body with plenty of repeated
        words to fingerprint reliably across both copies of the page and
        some more filler text for good measure</p></body></html>"#;

    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/copy-a.html">a</a><a href="/copy-b.html">b</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/copy-a.html", body).await;
    mount_page(&server, "/copy-b.html", body).await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, _events) = coordinator(test_config(), store.clone());

    let report = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options())
        .await
        .unwrap();

    let pages = store.find_pages(&report.crawling_id).unwrap();
    let hash_a = pages
        .iter()
        .find(|p| p.page_url_relative == "/copy-a.html")
        .and_then(|p| p.content_hash)
        .unwrap();
    let hash_b = pages
        .iter()
        .find(|p| p.page_url_relative == "/copy-b.html")
        .and_then(|p| p.content_hash)
        .unwrap();
    assert_eq!(hash_a, hash_b);
}

#[tokio::test]
async fn test_canonical_inconsistency_reported() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/a.html">a</a><a href="/b.html">b</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/a.html",
        r#"<html><head><link rel="canonical" href="/x"></head><body>a</body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/b.html",
        r#"<html><head><link rel="canonical" href="/x"></head><body>b</body></html>"#,
    )
    .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, _events) = coordinator(test_config(), store.clone());

    let report = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options())
        .await
        .unwrap();

    assert!(!report.canonical_consistency.is_consistent);
    let group = &report.canonical_consistency.inconsistencies[0];
    assert_eq!(group.canonical_url, "/x");
    assert!(group.conflicting_urls.contains(&"/a.html".to_string()));
    assert!(group.conflicting_urls.contains(&"/b.html".to_string()));
}

#[tokio::test]
async fn test_session_accumulates_keywords() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><p>crawler crawler crawler frontier frontier politeness</p></body></html>"#,
    )
    .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, _events) = coordinator(test_config(), store.clone());

    let report = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options())
        .await
        .unwrap();

    let session = store.get_session(&report.crawling_id).unwrap().unwrap();
    assert!(session
        .extracted_keywords
        .contains(&"crawler".to_string()));
}

#[tokio::test]
async fn test_recrawl_reuses_session() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<html><body>hello</body></html>").await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, _events) = coordinator(test_config(), store.clone());

    let first = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options())
        .await
        .unwrap();
    let second = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options())
        .await
        .unwrap();

    assert_eq!(first.crawling_id, second.crawling_id);
}

#[tokio::test]
async fn test_zero_url_limit_fails_before_any_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, _events) = coordinator(test_config(), store);

    let mut options = options();
    options.url_limit = Some(0);
    let result = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options)
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_exclusion_rules_scope_the_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/keep.html">k</a><a href="/drop.html">d</a></body></html>"#,
    )
    .await;
    mount_page(&server, "/keep.html", "<html><body>kept</body></html>").await;
    Mock::given(method("GET"))
        .and(path("/drop.html"))
        .respond_with(page("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, _events) = coordinator(test_config(), store.clone());
    coordinator.filter().add_exclusion_rule("drop", false).unwrap();

    let report = coordinator
        .crawl_website(&format!("{}/", server.uri()), &options())
        .await
        .unwrap();

    let pages = store.find_pages(&report.crawling_id).unwrap();
    assert!(pages.iter().any(|p| p.page_url_relative == "/keep.html"));
    assert!(pages.iter().all(|p| p.page_url_relative != "/drop.html"));
}

#[tokio::test]
async fn test_directory_tree_crawl() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
    std::fs::create_dir(dir.path().join("docs")).unwrap();
    std::fs::write(dir.path().join("docs").join("guide.html"), "<html></html>").unwrap();

    let store = Arc::new(SqliteStore::in_memory().unwrap());
    let (coordinator, _events) = coordinator(test_config(), store.clone());

    let mut options = options();
    options.use_directory_tree_crawling = true;
    options.directory_tree_root_path = Some(dir.path().to_string_lossy().into_owned());

    let report = coordinator
        .crawl_website("https://example.com/", &options)
        .await
        .unwrap();

    assert_eq!(report.pages_processed, 0);
    assert!(store.get_session(&report.crawling_id).unwrap().is_some());
}
