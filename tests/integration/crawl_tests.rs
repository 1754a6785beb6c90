//! End-to-end index builds against a mock site

use crate::{mount_page, test_config};
use locale_spider::crawler::{HttpRenderEngine, JobHandle};
use locale_spider::index::{search_index, FindingType, IndexBuilder, SearchMode, SearchQuery};
use locale_spider::{JobState, Locale};
use std::sync::Arc;
use wiremock::MockServer;

async fn mock_site() -> MockServer {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
            <a href="/about">About us</a>
            <a href="/de/">Deutsch</a>
            <a href="/files/brochure.pdf">Brochure</a>
            <a href="https://external.example/">Partner</a>
            <a href="mailto:info@example.com">Mail</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/about",
        r#"<html><head><title>About</title></head><body><a href="/">Home</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/de/",
        r#"<html><head><title>Startseite</title></head><body>
            <a href="/de/kontakt">Kontakt</a>
            <a href="/contact">Kontaktformular</a>
            <a href="/">English</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/de/kontakt",
        r#"<html><head><title>Kontakt</title></head><body><a href="/de/">Start</a></body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/contact",
        r#"<html><head><title>Contact</title></head><body></body></html>"#,
    )
    .await;

    server
}

fn engine() -> Arc<HttpRenderEngine> {
    Arc::new(HttpRenderEngine::with_client(reqwest::Client::new()))
}

#[tokio::test]
async fn test_full_site_build() {
    let server = mock_site().await;
    let config = test_config(&server.uri());

    let outcome = IndexBuilder::new(config, engine())
        .build()
        .await
        .expect("build should succeed");

    let index = &outcome.index;
    assert_eq!(outcome.summary.state, JobState::Completed);
    assert_eq!(index.metadata.total_pages, 5, "pages: {:?}", index.pages.keys());
    assert!(outcome.errors.is_empty());
    assert!(index.pages.keys().all(|k| !k.ends_with(".pdf")));

    let kontakt = index
        .pages
        .iter()
        .find(|(url, _)| url.ends_with("/de/kontakt"))
        .map(|(_, page)| page)
        .expect("German contact page indexed");
    assert_eq!(kontakt.title, "Kontakt");
    assert_eq!(kontakt.locale, Locale::Code("de".to_string()));

    let home = index
        .pages
        .get(&format!("{}/", server.uri()))
        .expect("home page indexed");
    assert_eq!(home.title, "Home");
    assert!(home.links.iter().any(|l| l.is_external && l.locale == Locale::External));
    assert!(home.links.iter().all(|l| !l.href.starts_with("mailto:")));
}

#[tokio::test]
async fn test_locale_scoped_build() {
    let server = mock_site().await;
    let mut config = test_config(&server.uri());
    config.crawler.start_url = format!("{}/de/", server.uri());
    config.crawler.locale_filter = Some("de".to_string());

    let outcome = IndexBuilder::new(config, engine()).build().await.unwrap();

    let urls: Vec<&String> = outcome.index.pages.keys().collect();
    assert_eq!(urls.len(), 2, "pages: {:?}", urls);
    assert!(urls.iter().all(|u| u.contains("/de")));
    assert_eq!(outcome.index.metadata.locale_filter.as_deref(), Some("de"));
}

#[tokio::test]
async fn test_cross_locale_search_over_built_index() {
    let server = mock_site().await;
    let outcome = IndexBuilder::new(test_config(&server.uri()), engine())
        .build()
        .await
        .unwrap();

    let query = SearchQuery::new(SearchMode::CrossLocale);
    let results = search_index(&outcome.index, &query);

    assert_eq!(results.total_pages_searched, 5);
    assert!(results
        .findings
        .iter()
        .all(|f| f.finding_type == FindingType::CrossLocale));
    assert!(results
        .findings
        .iter()
        .any(|f| f.anchor_text == "Kontaktformular" && f.linked_to.ends_with("/contact")));
    // Language switcher links are not findings
    assert!(!results.findings.iter().any(|f| f.anchor_text == "Deutsch"));
    assert!(!results.findings.iter().any(|f| f.anchor_text == "English"));
}

#[tokio::test]
async fn test_incremental_merge_keeps_other_pages() {
    let server = mock_site().await;
    let config = test_config(&server.uri());
    let initial = IndexBuilder::new(config.clone(), engine()).build().await.unwrap();

    let about = format!("{}/about", server.uri());
    let merged = IndexBuilder::new(config, engine())
        .merge_incremental(&initial.index, &[about])
        .await
        .unwrap();

    assert_eq!(merged.summary.total_pages, 5);
    assert!(merged.index.metadata.updated_at.is_some());
    assert_eq!(merged.index.metadata.created_at, initial.index.metadata.created_at);
}

#[tokio::test]
async fn test_stopped_handle_skips_crawl() {
    let server = mock_site().await;
    let handle = JobHandle::new();
    handle.stop();

    let outcome = IndexBuilder::new(test_config(&server.uri()), engine())
        .with_handle(handle)
        .build()
        .await
        .unwrap();

    assert_eq!(outcome.index.metadata.total_pages, 0);
}
