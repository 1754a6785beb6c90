//! Integration tests for Locale Spider
//!
//! These tests use wiremock to stand in for the audited site and tempfile
//! for the index and report directories.

mod crawl_tests;
mod health_tests;
mod sitemap_tests;
mod storage_tests;

use locale_spider::config::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves `body` as an HTML page at `route`
pub async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

/// A fast configuration rooted at the mock server
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::for_start_url(format!("{}/", base_url));
    config.crawler.concurrency = 2;
    config.crawler.page_delay = 0;
    config.crawler.navigation_timeout = 5_000;
    config.crawler.navigation_retries = 0;
    config.crawler.retry_delay = 0;
    config.health.batch_delay = 0;
    config.health.head_timeout = 2_000;
    config.health.get_timeout = 2_000;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}
