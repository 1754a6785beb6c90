//! Page extraction on top of a rendering session
//!
//! Turns a URL into a [`PageRecord`]-ready page: navigation with bounded
//! retries, then title, locale and classified outbound links.

use crate::config::Config;
use crate::crawler::render::{DomSnapshot, RenderError, RenderSession};
use crate::crawler::retry::{run_with_retry, RetryPolicy};
use crate::index::{LinkRecord, PageRecord};
use crate::locale::{Locale, LocaleClassifier};
use crate::url::{classify_host, UrlNormalizer};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// A successfully extracted page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Normalized URL the page was requested under
    pub url: Url,
    pub title: String,
    pub locale: Locale,
    pub links: Vec<LinkRecord>,
}

impl ExtractedPage {
    /// Converts into the stored page record
    pub fn into_record(self, indexed_at: DateTime<Utc>) -> (String, PageRecord) {
        (
            self.url.to_string(),
            PageRecord {
                title: self.title,
                locale: self.locale,
                indexed_at,
                links: self.links,
            },
        )
    }

    /// Internal link targets in document order
    pub fn internal_links(&self) -> impl Iterator<Item = &LinkRecord> {
        self.links.iter().filter(|l| !l.is_external)
    }
}

/// Navigates and classifies pages
#[derive(Debug, Clone)]
pub struct PageExtractor {
    normalizer: UrlNormalizer,
    classifier: LocaleClassifier,
    retry: RetryPolicy,
    navigation_timeout: Duration,
}

impl PageExtractor {
    pub fn new(
        normalizer: UrlNormalizer,
        classifier: LocaleClassifier,
        retry: RetryPolicy,
        navigation_timeout: Duration,
    ) -> Self {
        Self {
            normalizer,
            classifier,
            retry,
            navigation_timeout,
        }
    }

    /// Builds an extractor from the crawler, locale and filter sections
    pub fn from_config(config: &Config) -> Self {
        let mut classifier = LocaleClassifier::from_config(&config.locales);
        if let Some(code) = config.crawler.locale_filter.as_deref() {
            classifier = classifier.with_code(code);
        }

        Self::new(
            UrlNormalizer::new(config.filters.tracking_params.iter().cloned()),
            classifier,
            RetryPolicy::fixed(
                config.crawler.navigation_retries,
                Duration::from_millis(config.crawler.retry_delay),
            ),
            Duration::from_millis(config.crawler.navigation_timeout),
        )
    }

    pub fn classifier(&self) -> &LocaleClassifier {
        &self.classifier
    }

    pub fn normalizer(&self) -> &UrlNormalizer {
        &self.normalizer
    }

    /// Navigates to `url` and extracts the page
    ///
    /// Timeouts and transient network errors are retried per the retry
    /// policy; anything else fails the URL immediately. A closed session
    /// yields [`RenderError::SessionClosed`].
    pub async fn extract(
        &self,
        session: &Arc<dyn RenderSession>,
        url: &Url,
    ) -> Result<ExtractedPage, RenderError> {
        let timeout = self.navigation_timeout;
        let snapshot = run_with_retry(&self.retry, RenderError::is_retryable, || {
            let session = Arc::clone(session);
            let url = url.clone();
            async move {
                session.navigate(&url, timeout).await?;
                session.extract().await
            }
        })
        .await?;

        debug!("Extracted {} anchors from {}", snapshot.anchors.len(), url);
        Ok(self.build_page(url, snapshot))
    }

    /// Classifies a snapshot's anchors relative to the page they were found on
    pub fn build_page(&self, page_url: &Url, snapshot: DomSnapshot) -> ExtractedPage {
        let page_locale = self.classifier.classify(page_url);

        let links = snapshot
            .anchors
            .into_iter()
            .filter_map(|anchor| {
                let target = self
                    .normalizer
                    .normalize(&anchor.href, Some(&snapshot.url))
                    .ok()?;
                Some(LinkRecord {
                    is_external: classify_host(&target, page_url).is_external(),
                    locale: self.classifier.classify_link(&target, page_url),
                    source_locale: page_locale.clone(),
                    href: target.to_string(),
                    anchor_text: anchor.text,
                    is_visible: anchor.visible,
                    http_status: None,
                })
            })
            .collect();

        ExtractedPage {
            url: page_url.clone(),
            title: snapshot.title,
            locale: page_locale,
            links,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::render::RawAnchor;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn extractor(retries: u32) -> PageExtractor {
        PageExtractor::new(
            UrlNormalizer::default(),
            LocaleClassifier::new(["de", "fr"], true, false),
            RetryPolicy::fixed(retries, Duration::from_millis(1)),
            Duration::from_secs(1),
        )
    }

    fn anchor(href: &str, text: &str) -> RawAnchor {
        RawAnchor {
            href: href.to_string(),
            text: text.to_string(),
            visible: true,
        }
    }

    fn snapshot(url: &str, anchors: Vec<RawAnchor>) -> DomSnapshot {
        DomSnapshot {
            url: Url::parse(url).unwrap(),
            title: "Title".to_string(),
            anchors,
        }
    }

    /// Fails `failures` times with the given error, then serves a fixed page
    struct FlakySession {
        failures: u32,
        error: RenderError,
        calls: AtomicU32,
    }

    #[async_trait]
    impl RenderSession for FlakySession {
        async fn navigate(&self, _url: &Url, _timeout: Duration) -> Result<(), RenderError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(self.error.clone())
            } else {
                Ok(())
            }
        }

        async fn extract(&self) -> Result<DomSnapshot, RenderError> {
            Ok(snapshot(
                "https://example.com/de",
                vec![anchor("/de/kontakt", "Kontakt")],
            ))
        }

        async fn close(&self) -> Result<(), RenderError> {
            Ok(())
        }
    }

    #[test]
    fn test_config_classifier_knows_the_locale_filter() {
        let mut config = Config::for_start_url("https://example.com/");
        config.locales.heuristic_fallback = false;
        config.crawler.locale_filter = Some("/xq/".into());

        let classifier = PageExtractor::from_config(&config).classifier().clone();
        let url = Url::parse("https://example.com/xq/preise").unwrap();
        assert_eq!(classifier.extract_locale(&url).as_deref(), Some("xq"));

        config.crawler.locale_filter = None;
        let classifier = PageExtractor::from_config(&config).classifier().clone();
        assert_eq!(classifier.extract_locale(&url), None);
    }

    #[test]
    fn test_build_page_classifies_links() {
        let page_url = Url::parse("https://example.com/de").unwrap();
        let page = extractor(0).build_page(
            &page_url,
            snapshot(
                "https://example.com/de",
                vec![
                    anchor("/de/kontakt/?utm_source=nav", "Kontakt"),
                    anchor("/contact", "Contact"),
                    anchor("https://other.com/de/", "Other"),
                    anchor("mailto:x@example.com", "Mail"),
                ],
            ),
        );

        assert_eq!(page.locale, Locale::Code("de".into()));
        assert_eq!(page.links.len(), 3);
        assert_eq!(page.links[0].href, "https://example.com/de/kontakt");
        assert_eq!(page.links[0].locale, Locale::Code("de".into()));
        assert_eq!(page.links[1].locale, Locale::Default);
        assert!(page.links[2].is_external);
        assert_eq!(page.links[2].locale, Locale::External);
        assert!(page.links.iter().all(|l| l.source_locale == Locale::Code("de".into())));
        assert_eq!(page.internal_links().count(), 2);
    }

    #[tokio::test]
    async fn test_extract_retries_timeouts() {
        let session: Arc<dyn RenderSession> = Arc::new(FlakySession {
            failures: 1,
            error: RenderError::Timeout {
                url: "https://example.com/de".into(),
                after_ms: 1000,
            },
            calls: AtomicU32::new(0),
        });
        let url = Url::parse("https://example.com/de").unwrap();

        let page = extractor(1).extract(&session, &url).await.unwrap();
        assert_eq!(page.links.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_gives_up_on_terminal_error() {
        let flaky = Arc::new(FlakySession {
            failures: 5,
            error: RenderError::Navigation {
                url: "https://example.com/de".into(),
                message: "not html".into(),
            },
            calls: AtomicU32::new(0),
        });
        let session: Arc<dyn RenderSession> = flaky.clone();
        let url = Url::parse("https://example.com/de").unwrap();

        let err = extractor(3).extract(&session, &url).await.unwrap_err();
        assert!(matches!(err, RenderError::Navigation { .. }));
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
    }
}
