//! Link health checks against a mock site

use crate::test_config;
use chrono::Utc;
use locale_spider::crawler::NoopObserver;
use locale_spider::health::{run_health_check, HealthCheckOptions, LinkChecker, LinkStatus};
use locale_spider::index::{Index, LinkRecord, PageRecord};
use locale_spider::{Locale, UrlNormalizer};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mock_targets() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/de/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    // Trailing-slash redirect back to the same page
    Mock::given(method("HEAD"))
        .and(path("/team"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("Location", format!("{}/team/", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    // Campaign link redirecting to its clean form
    Mock::given(method("HEAD"))
        .and(path("/promo"))
        .and(query_param("utm_source", "x"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/promo"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/no-head"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/no-head"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    server
}

fn checker(base_url: &str) -> LinkChecker {
    let config = test_config(base_url);
    LinkChecker::new(&config.user_agent, &config.health, UrlNormalizer::default()).unwrap()
}

fn link(href: String, text: &str, locale: Locale, source: Locale) -> LinkRecord {
    LinkRecord {
        href,
        anchor_text: text.to_string(),
        is_external: false,
        locale,
        source_locale: source,
        is_visible: true,
        http_status: None,
    }
}

#[tokio::test]
async fn test_check_status_variants() {
    let server = mock_targets().await;
    let checker = checker(&server.uri());
    let url = |p: &str| format!("{}{}", server.uri(), p);

    assert_eq!(checker.check_status(&url("/ok")).await, LinkStatus::Http(200));
    assert_eq!(checker.check_status(&url("/gone")).await, LinkStatus::Http(404));
    assert_eq!(checker.check_status(&url("/team")).await, LinkStatus::Http(200));
    assert_eq!(checker.check_status(&url("/old")).await, LinkStatus::Http(301));
    assert_eq!(
        checker.check_status(&url("/promo?utm_source=x")).await,
        LinkStatus::Http(200)
    );
    assert_eq!(checker.check_status(&url("/no-head")).await, LinkStatus::Http(200));
}

#[tokio::test]
async fn test_check_status_unreachable() {
    // Nothing listens on port 9 of localhost
    let checker = checker("http://127.0.0.1:9");
    assert_eq!(
        checker.check_status("http://127.0.0.1:9/x").await,
        LinkStatus::Unreachable
    );
}

#[tokio::test]
async fn test_run_health_check_aggregates() {
    let server = mock_targets().await;
    let url = |p: &str| format!("{}{}", server.uri(), p);
    let de = || Locale::Code("de".to_string());

    let mut index = Index::new("127.0.0.1", url("/"), None, Utc::now());
    index.insert_page(
        url("/"),
        PageRecord {
            title: "Home".to_string(),
            locale: Locale::Default,
            indexed_at: Utc::now(),
            links: vec![
                link(url("/ok"), "Fine", Locale::Default, Locale::Default),
                link(url("/gone"), "", Locale::Default, Locale::Default),
                link(url("/old"), "Old", Locale::Default, Locale::Default),
                link(url("/de/ok"), "Deutsch", de(), Locale::Default),
            ],
        },
    );
    index.insert_page(
        url("/about"),
        PageRecord {
            title: "About".to_string(),
            locale: Locale::Default,
            indexed_at: Utc::now(),
            links: vec![
                link(url("/gone"), "Gone", Locale::Default, Locale::Default),
                link(url("/no-head"), "Form", Locale::Default, Locale::Default),
            ],
        },
    );
    index.insert_page(
        url("/de/ok"),
        PageRecord {
            title: "Start".to_string(),
            locale: de(),
            indexed_at: Utc::now(),
            links: vec![link(url("/ok"), "Mehr", Locale::Default, de())],
        },
    );

    let checker = checker(&server.uri());
    let options = HealthCheckOptions::default();
    let report = run_health_check(&mut index, &checker, &options, &NoopObserver).await;

    assert_eq!(report.total_unique_links, 5);
    assert_eq!(report.checked_count, 5);

    assert_eq!(report.broken.len(), 1);
    let broken = &report.broken[0];
    assert_eq!(broken.status, 404);
    assert_eq!(broken.occurrences, 2);
    assert_eq!(broken.anchor_text, "Gone");

    assert_eq!(report.redirects.len(), 1);
    assert_eq!(report.redirects[0].status, 301);

    assert_eq!(report.healthy, 3);

    // The German page links back to a default-locale page; the "Deutsch"
    // switcher link on the home page is not reported
    assert_eq!(report.cross_locale.len(), 1);
    assert_eq!(report.cross_locale[0].source_locale, "de");
    assert_eq!(report.cross_locale[0].target_locale, "default");

    assert_eq!(index.health_report, report);
    let home = &index.pages[&url("/")];
    assert_eq!(home.links[1].http_status, Some(404));
}

#[tokio::test]
async fn test_max_links_caps_checks() {
    let server = mock_targets().await;
    let url = |p: &str| format!("{}{}", server.uri(), p);

    let mut index = Index::new("127.0.0.1", url("/"), None, Utc::now());
    index.insert_page(
        url("/"),
        PageRecord {
            title: String::new(),
            locale: Locale::Default,
            indexed_at: Utc::now(),
            links: vec![
                link(url("/ok"), "a", Locale::Default, Locale::Default),
                link(url("/no-head"), "b", Locale::Default, Locale::Default),
            ],
        },
    );

    let options = HealthCheckOptions {
        max_links: 1,
        ..HealthCheckOptions::default()
    };
    let report = run_health_check(&mut index, &checker(&server.uri()), &options, &NoopObserver).await;

    assert_eq!(report.total_unique_links, 2);
    assert_eq!(report.checked_count, 1);
    assert_eq!(index.pages[&url("/")].links[1].http_status, None);
}
