//! Integration tests for the crawler
//!
//! These tests use wiremock to create a mock news site and run the full
//! pipeline end-to-end: descriptor on disk, feed discovery, article
//! extraction and file output.

use chrono::{Duration, Local};
use newsreap::config::{load_config, CrawlConfig};
use newsreap::crawler::{build_http_client, discover_article_urls, HttpLauncher};
use newsreap::output::{prepare_environment, RunSummary};
use newsreap::pipeline::{Pipeline, SUMMARY_FILE_NAME};
use newsreap::{ArticleDate, ArticleRecord, ConfigError};
use std::io::Write;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a JSON descriptor for `seeds` and loads it through the config layer
fn create_test_config(seeds: &[String], total_articles: usize) -> CrawlConfig {
    let descriptor = serde_json::json!({
        "seed_urls": seeds,
        "headers": { "user-agent": "newsreap-tests" },
        "total_articles": total_articles,
        "encoding": "utf-8",
        "timeout": 5,
        "should_verify_certificate": true,
        "headless_mode": true,
        "pagination": { "min_pause_secs": 0, "max_pause_secs": 0 },
        "retry": { "max_attempts": 0 }
    });

    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(descriptor.to_string().as_bytes()).unwrap();
    file.flush().unwrap();

    load_config(file.path()).expect("Failed to load test config")
}

fn feed_page(hrefs: &[&str]) -> String {
    let previews: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<div class="article-middle__media"><a href="{}"><img src="/cover.jpg"></a></div>"#,
                href
            )
        })
        .collect();
    format!(
        r#"<html><body><div class="col">{}</div><button class="i-btn-loadmore">More</button></body></html>"#,
        previews
    )
}

async fn mount_page(server: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn run_pipeline(config: CrawlConfig) -> (Vec<ArticleRecord>, RunSummary) {
    let client = build_http_client(&config).unwrap();
    let launcher = HttpLauncher::new(client.clone(), config.encoding.clone());
    let mut records: Vec<ArticleRecord> = Vec::new();

    let summary = Pipeline::new(Arc::new(config), client, launcher, CancellationToken::new())
        .run(&mut records)
        .await
        .expect("Pipeline failed");

    (records, summary)
}

#[tokio::test]
async fn test_end_to_end_single_article() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/", 200, feed_page(&["/main/first/"])).await;
    mount_page(
        &server,
        "/main/first/",
        200,
        r#"<html><body>
            <h1>T</h1>
            <span class="article-date">5 hours ago</span>
            <div class="article-body"><p>B</p></div>
        </body></html>"#
            .to_string(),
    )
    .await;

    let config = create_test_config(&[format!("{}/", base_url)], 1);

    let before = Local::now().naive_local() - Duration::hours(5) - Duration::seconds(1);
    let (records, summary) = run_pipeline(config).await;
    let after = Local::now().naive_local() - Duration::hours(5) + Duration::seconds(1);

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.id, 1);
    assert_eq!(record.url, format!("{}/main/first/", base_url));
    assert_eq!(record.title, "T");
    assert_eq!(record.text, "B");

    match record.date {
        ArticleDate::Known(date) => {
            assert!(date >= before && date <= after, "date {} not ~5h ago", date);
        }
        ArticleDate::Unknown => panic!("date was not normalized"),
    }

    assert_eq!(summary.urls_discovered, 1);
    assert_eq!(summary.stored_ids, vec![1]);
    assert!(summary.failures.is_empty());
}

#[tokio::test]
async fn test_cap_takes_first_links_in_feed_order() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/", 200, feed_page(&["/a/", "/b/", "/c/"])).await;
    let config = create_test_config(&[format!("{}/", base_url)], 2);

    let client = build_http_client(&config).unwrap();
    let launcher = HttpLauncher::new(client.clone(), "utf-8");
    let discovery =
        discover_article_urls(Arc::new(config), client, launcher, CancellationToken::new())
            .await
            .unwrap();

    assert_eq!(
        discovery.urls.into_vec(),
        vec![format!("{}/a/", base_url), format!("{}/b/", base_url)]
    );
}

#[tokio::test]
async fn test_all_seeds_failing_yields_no_articles() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/", 200, feed_page(&["/a/", "/b/"])).await;
    mount_page(&server, "/news/", 500, String::new()).await;
    mount_page(&server, "/tech/", 404, String::new()).await;

    let config = create_test_config(
        &[format!("{}/news/", base_url), format!("{}/tech/", base_url)],
        5,
    );
    let (records, summary) = run_pipeline(config).await;

    assert!(records.is_empty());
    assert_eq!(summary.urls_discovered, 0);
    assert_eq!(summary.seeds_skipped, 2);
}

#[tokio::test]
async fn test_failed_article_does_not_stop_the_batch() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/", 200, feed_page(&["/gone/", "/ok/"])).await;
    mount_page(&server, "/gone/", 404, String::new()).await;
    mount_page(
        &server,
        "/ok/",
        200,
        r#"<html><body><h1>Fine</h1><div class="article-body"><p>Text</p></div></body></html>"#
            .to_string(),
    )
    .await;

    let config = create_test_config(&[format!("{}/", base_url)], 2);
    let (records, summary) = run_pipeline(config).await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 2);
    assert_eq!(records[0].title, "Fine");

    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].id, 1);
    assert_eq!(summary.failures[0].url, format!("{}/gone/", base_url));
}

#[tokio::test]
async fn test_run_to_directory_replaces_previous_output() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(&server, "/", 200, feed_page(&["/story/"])).await;
    mount_page(
        &server,
        "/story/",
        200,
        r#"<html><body><h1>Story</h1><span class="article-author">Anna</span>
            <div class="article-body"><p>One.</p><p>Two.</p></div></body></html>"#
            .to_string(),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("articles");
    prepare_environment(&output).unwrap();
    std::fs::write(output.join("9_raw.txt"), "stale").unwrap();

    let config = create_test_config(&[format!("{}/", base_url)], 1);
    let client = build_http_client(&config).unwrap();
    let launcher = HttpLauncher::new(client.clone(), "utf-8");

    Pipeline::new(Arc::new(config), client, launcher, CancellationToken::new())
        .run_to_directory(&output)
        .await
        .unwrap();

    assert!(!output.join("9_raw.txt").exists());
    assert_eq!(
        std::fs::read_to_string(output.join("1_raw.txt")).unwrap(),
        "One.\nTwo."
    );

    let meta: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output.join("1_meta.json")).unwrap())
            .unwrap();
    assert_eq!(meta["title"], "Story");
    assert_eq!(meta["author"], "Anna");
    assert_eq!(meta["date"], "unknown");
    assert!(output.join(SUMMARY_FILE_NAME).is_file());
}

#[test]
fn test_invalid_descriptor_is_rejected_before_any_request() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(
        br#"{"seed_urls": ["ftp://x.com"], "total_articles": 1, "headers": {},
            "encoding": "utf-8", "timeout": 5, "should_verify_certificate": true,
            "headless_mode": true}"#,
    )
    .unwrap();
    file.flush().unwrap();

    let error = load_config(file.path()).unwrap_err();
    assert!(matches!(error, ConfigError::InvalidSeedUrl(_)));
}
