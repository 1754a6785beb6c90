//! Index construction: full builds and incremental merges

use crate::config::Config;
use crate::crawler::observer::{emit_log, CrawlObserver, CrawlSummary, ErrorEntry, LogLevel};
use crate::crawler::{
    CrawlOptions, CrawlOutcome, Frontier, JobHandle, NoopObserver, PageExtractor, RenderEngine,
    WorkerPool,
};
use crate::health::{build_report, recorded_statuses, HealthCheckOptions, LinkChecker};
use crate::index::{Finding, Index, SearchQuery};
use crate::locale::LocaleScope;
use crate::url::{extract_domain, DomainScope, UrlFilter, UrlNormalizer};
use crate::JobError;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Internal links checked per page when sampling health during indexing
pub const LINKS_SAMPLED_PER_PAGE: usize = 20;

/// A built or merged index plus what the crawl reported along the way
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub index: Index,
    pub summary: CrawlSummary,
    pub errors: Vec<ErrorEntry>,
    pub findings: Vec<Finding>,
}

/// Builds indexes by driving a worker pool over a rendering engine
pub struct IndexBuilder {
    config: Config,
    engine: Arc<dyn RenderEngine>,
    observer: Arc<dyn CrawlObserver>,
    handle: JobHandle,
    query: Option<SearchQuery>,
}

impl IndexBuilder {
    pub fn new(config: Config, engine: Arc<dyn RenderEngine>) -> Self {
        Self {
            config,
            engine,
            observer: Arc::new(NoopObserver),
            handle: JobHandle::new(),
            query: None,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn CrawlObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_handle(mut self, handle: JobHandle) -> Self {
        self.handle = handle;
        self
    }

    /// Reports findings for this query while crawling
    #[must_use]
    pub fn with_live_search(mut self, query: SearchQuery) -> Self {
        self.query = Some(query);
        self
    }

    /// Handle for pausing, resuming or stopping the job
    pub fn handle(&self) -> JobHandle {
        self.handle.clone()
    }

    /// Crawls the configured site from its start URL into a fresh index
    ///
    /// A stopped or partially failed crawl still yields an index of every
    /// page gathered so far.
    pub async fn build(&self) -> Result<BuildOutcome, JobError> {
        let start = self.start_url(&self.config.crawler.start_url)?;
        let domain = self.domain_of(&start)?;
        let locale_filter = self.config.crawler.locale_filter.clone();

        let scope_label = match locale_filter.as_deref() {
            None => "(full site)".to_string(),
            Some("default") => "(default locale only)".to_string(),
            Some(code) => format!("(/{}/ only)", code),
        };
        emit_log(
            self.observer.as_ref(),
            LogLevel::Info,
            &format!("Building index for {} {}", domain, scope_label),
        );

        let mut frontier = self.frontier(&start, locale_filter.as_deref())?;
        frontier.seed(start.as_str());

        let created_at = Utc::now();
        let outcome = self.crawl(frontier, true).await?;

        let mut index = Index::new(&domain, start.as_str(), locale_filter, created_at);
        Ok(self.complete(&mut index, outcome, false))
    }

    /// Re-extracts only the given URLs and splices them into a copy of `existing`
    ///
    /// Links found on the re-extracted pages are not followed; pages that
    /// were not listed are kept untouched.
    pub async fn merge_incremental(
        &self,
        existing: &Index,
        urls: &[String],
    ) -> Result<BuildOutcome, JobError> {
        let start = self.start_url(&existing.metadata.start_url)?;
        let mut frontier = self.frontier(&start, existing.metadata.locale_filter.as_deref())?;

        for url in urls {
            if frontier.seed(url).is_queued() {
                continue;
            }
            emit_log(
                self.observer.as_ref(),
                LogLevel::Warning,
                &format!("Skipping unusable or duplicate URL: {}", url),
            );
        }
        emit_log(
            self.observer.as_ref(),
            LogLevel::Info,
            &format!("Incremental indexing: {} specific URLs", frontier.len()),
        );

        let outcome = self.crawl(frontier, false).await?;

        let mut index = existing.clone();
        Ok(self.complete(&mut index, outcome, true))
    }

    fn start_url(&self, raw: &str) -> Result<Url, JobError> {
        let normalizer = UrlNormalizer::new(self.config.filters.tracking_params.iter().cloned());
        normalizer.normalize_absolute(raw).map_err(|e| {
            let err = JobError::InvalidStartUrl {
                url: raw.to_string(),
                reason: e.to_string(),
            };
            self.report_fatal(raw, &err);
            err
        })
    }

    fn domain_of(&self, start: &Url) -> Result<String, JobError> {
        extract_domain(start).ok_or_else(|| {
            let err = JobError::InvalidStartUrl {
                url: start.to_string(),
                reason: "empty domain".to_string(),
            };
            self.report_fatal(start.as_str(), &err);
            err
        })
    }

    fn frontier(&self, start: &Url, locale_filter: Option<&str>) -> Result<Frontier, JobError> {
        let scope = DomainScope::new(start, self.config.crawler.domain_scope.as_deref())
            .map_err(|e| JobError::Config(e.to_string()))?;
        let filters = &self.config.filters;
        let extractor = PageExtractor::from_config(&self.config);

        Ok(Frontier::new(
            scope,
            extractor.normalizer().clone(),
            UrlFilter::new(
                &filters.excluded_paths,
                &filters.excluded_extensions,
                &filters.asset_extensions,
            ),
            extractor.classifier().clone(),
            LocaleScope::from_filter(locale_filter),
        ))
    }

    async fn crawl(&self, frontier: Frontier, follow_links: bool) -> Result<CrawlOutcome, JobError> {
        let mut options = CrawlOptions::from_config(&self.config.crawler);
        options.follow_links = follow_links;
        if !follow_links {
            options.max_pages = 0;
        }

        let mut pool = WorkerPool::new(
            Arc::clone(&self.engine),
            PageExtractor::from_config(&self.config),
            options,
        )
        .with_observer(Arc::clone(&self.observer))
        .with_handle(self.handle.clone());

        if let Some(query) = &self.query {
            pool = pool.with_live_search(query.clone());
        }

        if self.config.health.check_during_index {
            let checker = LinkChecker::new(
                &self.config.user_agent,
                &self.config.health,
                PageExtractor::from_config(&self.config).normalizer().clone(),
            )
            .map_err(|e| JobError::EngineInit(e.to_string()))?;
            pool = pool.with_link_sampling(Arc::new(checker), LINKS_SAMPLED_PER_PAGE);
        }

        pool.run(frontier).await.map_err(|e| {
            self.observer.on_error(&ErrorEntry {
                url: self.config.crawler.start_url.clone(),
                message: e.to_string(),
            });
            e
        })
    }

    /// Folds crawl results into the index, rebuilds its health report and
    /// notifies the observer
    fn complete(&self, index: &mut Index, outcome: CrawlOutcome, incremental: bool) -> BuildOutcome {
        for (url, page) in outcome.pages {
            index.insert_page(url, page);
        }
        if incremental {
            index.metadata.updated_at = Some(Utc::now());
        }
        index.recount();
        index.health_report = build_report(
            index,
            &recorded_statuses(index),
            &HealthCheckOptions::from_config(&self.config),
        );

        let summary = CrawlSummary {
            domain: index.metadata.domain.clone(),
            state: outcome.state,
            total_pages: index.metadata.total_pages,
            total_links: index.metadata.total_links,
            errors: outcome.errors.len(),
            findings: outcome.findings.len(),
            duration_ms: outcome.duration.as_millis() as u64,
        };
        info!(
            "Index for {} has {} pages and {} links",
            summary.domain, summary.total_pages, summary.total_links
        );
        self.observer.on_complete(&summary);

        BuildOutcome {
            index: index.clone(),
            summary,
            errors: outcome.errors,
            findings: outcome.findings,
        }
    }

    fn report_fatal(&self, url: &str, err: &JobError) {
        emit_log(self.observer.as_ref(), LogLevel::Error, &format!("Fatal error: {}", err));
        self.observer.on_error(&ErrorEntry {
            url: url.to_string(),
            message: err.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::{DomSnapshot, RawAnchor, RenderError, RenderSession};
    use crate::locale::Locale;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Serves pages from a path -> (title, links) table
    struct TableEngine {
        pages: HashMap<String, (String, Vec<String>)>,
    }

    struct TableSession {
        pages: HashMap<String, (String, Vec<String>)>,
        current: Mutex<Option<Url>>,
    }

    #[async_trait]
    impl RenderEngine for TableEngine {
        async fn open_session(&self) -> Result<Arc<dyn RenderSession>, RenderError> {
            Ok(Arc::new(TableSession {
                pages: self.pages.clone(),
                current: Mutex::new(None),
            }))
        }
    }

    #[async_trait]
    impl RenderSession for TableSession {
        async fn navigate(&self, url: &Url, _timeout: Duration) -> Result<(), RenderError> {
            if !self.pages.contains_key(url.path()) {
                return Err(RenderError::Navigation {
                    url: url.to_string(),
                    message: "not found".into(),
                });
            }
            *self.current.lock().unwrap() = Some(url.clone());
            Ok(())
        }

        async fn extract(&self) -> Result<DomSnapshot, RenderError> {
            let url = self.current.lock().unwrap().clone().ok_or(RenderError::SessionClosed)?;
            let (title, links) = &self.pages[url.path()];
            Ok(DomSnapshot {
                anchors: links
                    .iter()
                    .map(|l| RawAnchor {
                        href: url.join(l).unwrap().to_string(),
                        text: l.clone(),
                        visible: true,
                    })
                    .collect(),
                title: title.clone(),
                url,
            })
        }

        async fn close(&self) -> Result<(), RenderError> {
            Ok(())
        }
    }

    fn engine(pages: &[(&str, &str, &[&str])]) -> Arc<dyn RenderEngine> {
        Arc::new(TableEngine {
            pages: pages
                .iter()
                .map(|(path, title, links)| {
                    (
                        path.to_string(),
                        (title.to_string(), links.iter().map(|l| l.to_string()).collect()),
                    )
                })
                .collect(),
        })
    }

    fn config() -> Config {
        let mut config = Config::for_start_url("https://example.com/");
        config.crawler.page_delay = 0;
        config.crawler.concurrency = 2;
        config
    }

    #[tokio::test]
    async fn test_build_full_index() {
        let engine = engine(&[
            ("/", "Home", &["/about", "/de", "https://other.com/"]),
            ("/about", "About", &["/"]),
            ("/de", "Start", &["/de/kontakt"]),
            ("/de/kontakt", "Kontakt", &[]),
        ]);
        let outcome = IndexBuilder::new(config(), engine).build().await.unwrap();
        let index = outcome.index;

        assert_eq!(index.metadata.domain, "example.com");
        assert_eq!(index.metadata.total_pages, 4);
        assert_eq!(index.metadata.total_links, 5);
        assert_eq!(index.pages["https://example.com/de"].locale, Locale::Code("de".into()));
        assert_eq!(outcome.summary.total_pages, 4);
        assert!(outcome.errors.is_empty());
    }

    #[tokio::test]
    async fn test_build_attaches_health_report() {
        let engine = engine(&[
            ("/", "Home", &["/about", "/de/kontakt"]),
            ("/about", "About", &[]),
            ("/de/kontakt", "Kontakt", &["/about"]),
        ]);
        let index = IndexBuilder::new(config(), engine).build().await.unwrap().index;
        let report = &index.health_report;

        let mut crossings: Vec<(&str, &str)> = report
            .cross_locale
            .iter()
            .map(|c| (c.source_locale.as_str(), c.target_locale.as_str()))
            .collect();
        crossings.sort();
        assert_eq!(crossings, vec![("de", "default"), ("default", "de")]);
        assert_eq!(report.total_unique_links, 2);
        // no statuses were sampled
        assert_eq!(report.checked_count, 0);
        assert!(report.broken.is_empty());
    }

    #[tokio::test]
    async fn test_locale_scoped_build() {
        let engine = engine(&[
            ("/de", "Start", &["/de/kontakt", "/about"]),
            ("/de/kontakt", "Kontakt", &[]),
            ("/about", "About", &[]),
        ]);
        let mut config = config();
        config.crawler.start_url = "https://example.com/de".into();
        config.crawler.locale_filter = Some("de".into());

        let outcome = IndexBuilder::new(config, engine).build().await.unwrap();
        let pages: Vec<_> = outcome.index.pages.keys().cloned().collect();
        assert_eq!(
            pages,
            vec!["https://example.com/de", "https://example.com/de/kontakt"]
        );
        assert_eq!(outcome.index.metadata.locale_filter.as_deref(), Some("de"));
    }

    #[tokio::test]
    async fn test_merge_incremental_keeps_untouched_pages() {
        let first = engine(&[("/", "Home", &["/a"]), ("/a", "A", &[])]);
        let built = IndexBuilder::new(config(), first).build().await.unwrap().index;

        let second = engine(&[
            ("/", "Home", &["/a"]),
            ("/a", "A v2", &["/b", "/c"]),
            ("/b", "B", &[]),
        ]);
        let merged = IndexBuilder::new(config(), second)
            .merge_incremental(&built, &["https://example.com/a".to_string()])
            .await
            .unwrap()
            .index;

        assert_eq!(merged.metadata.total_pages, 2);
        assert_eq!(merged.pages["https://example.com/a"].title, "A v2");
        assert_eq!(merged.pages["https://example.com/a"].links.len(), 2);
        assert!(merged.pages.contains_key("https://example.com/"));
        assert!(!merged.pages.contains_key("https://example.com/b"));
        assert!(merged.metadata.updated_at.is_some());
        assert_eq!(merged.metadata.created_at, built.metadata.created_at);
    }

    #[tokio::test]
    async fn test_invalid_start_url_is_fatal() {
        let mut config = config();
        config.crawler.start_url = "not a url".into();
        let err = IndexBuilder::new(config, engine(&[])).build().await.unwrap_err();
        assert!(matches!(err, JobError::InvalidStartUrl { .. }));
    }
}
