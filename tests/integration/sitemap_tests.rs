//! Sitemap reconciliation against a mock site

use chrono::Utc;
use locale_spider::index::{Index, PageRecord};
use locale_spider::sitemap::SitemapReconciler;
use locale_spider::{Locale, LocaleClassifier, SpiderError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_xml(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/xml"))
        .mount(server)
        .await;
}

fn index_with(base: &str, paths: &[&str], locale_filter: Option<&str>) -> Index {
    let mut index = Index::new("127.0.0.1", format!("{}/", base), locale_filter.map(str::to_string), Utc::now());
    for p in paths {
        index.insert_page(
            format!("{}{}", base, p),
            PageRecord {
                title: String::new(),
                locale: Locale::Default,
                indexed_at: Utc::now(),
                links: Vec::new(),
            },
        );
    }
    index.recount();
    index
}

fn reconciler(sitemap_url: String) -> SitemapReconciler {
    SitemapReconciler::new(
        reqwest::Client::new(),
        LocaleClassifier::new(["de", "fr"], false, false),
    )
    .with_sitemap_url(sitemap_url)
}

#[tokio::test]
async fn test_sitemap_index_is_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_xml(
        &server,
        "/sitemap.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{base}/sitemap-pages.xml</loc></sitemap>
  <sitemap><loc>{base}/sitemap-de.xml</loc></sitemap>
  <sitemap><loc>{base}/sitemap-missing.xml</loc></sitemap>
</sitemapindex>"#
        ),
    )
    .await;
    mount_xml(
        &server,
        "/sitemap-pages.xml",
        format!(
            r#"<urlset>
  <url><loc>{base}/</loc></url>
  <url><loc>{base}/About/</loc></url>
  <url><loc>{base}/pricing</loc></url>
</urlset>"#
        ),
    )
    .await;
    mount_xml(
        &server,
        "/sitemap-de.xml",
        format!(r#"<urlset><url><loc>{base}/de/</loc></url></urlset>"#),
    )
    .await;

    let index = index_with(&base, &["/", "/about", "/blog"], Some("default"));
    let report = reconciler(format!("{}/sitemap.xml", base))
        .reconcile(&index)
        .await
        .expect("sitemap should reconcile");

    assert_eq!(report.sitemap_total_count, 4);
    assert_eq!(report.sitemap_count, 3);
    assert_eq!(report.locale_filter, "default");
    assert_eq!(report.indexed_count, 3);
    assert_eq!(report.in_both, 2);
    assert_eq!(report.missing_from_index, vec![format!("{}/pricing", base)]);
    assert_eq!(report.extra_in_index, vec![format!("{}/blog", base)]);
}

#[tokio::test]
async fn test_missing_sitemap_is_an_error() {
    let server = MockServer::start().await;
    let index = index_with(&server.uri(), &["/"], None);

    let result = reconciler(format!("{}/sitemap.xml", server.uri()))
        .reconcile(&index)
        .await;

    assert!(matches!(result, Err(SpiderError::Sitemap(_))));
}

#[tokio::test]
async fn test_empty_sitemap_is_an_error() {
    let server = MockServer::start().await;
    mount_xml(&server, "/sitemap.xml", "<urlset></urlset>".to_string()).await;
    let index = index_with(&server.uri(), &["/"], None);

    let err = reconciler(format!("{}/sitemap.xml", server.uri()))
        .reconcile(&index)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("empty"));
}
