//! Health-check pass over a built index

use crate::config::Config;
use crate::crawler::observer::{emit_log, CrawlObserver, LogLevel};
use crate::health::checker::{HealthVerdict, LinkChecker, LinkStatus};
use crate::health::report::{CrossLocaleIssue, HealthReport, LinkIssue};
use crate::index::Index;
use crate::locale::{is_cross_locale, is_locale_switcher_text, LocaleScope};
use crate::url::UrlFilter;
use std::collections::HashMap;
use tracing::info;
use url::Url;

const NO_TEXT: &str = "[No Text]";

/// Settings for one health-check run
#[derive(Debug, Clone)]
pub struct HealthCheckOptions {
    /// Maximum unique targets whose status is resolved
    pub max_links: usize,
    pub default_has_prefix: bool,
    pub exclude_locale_switcher: bool,
    pub timeout_is_healthy: bool,
    /// Asset extensions never reported as cross-locale
    pub assets: UrlFilter,
}

impl Default for HealthCheckOptions {
    fn default() -> Self {
        Self {
            max_links: 200,
            default_has_prefix: false,
            exclude_locale_switcher: true,
            timeout_is_healthy: true,
            assets: UrlFilter::default(),
        }
    }
}

impl HealthCheckOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_links: config.health.max_links,
            default_has_prefix: config.locales.default_has_prefix,
            exclude_locale_switcher: config.locales.exclude_locale_switcher,
            timeout_is_healthy: config.health.timeout_is_healthy,
            assets: UrlFilter::new(
                &config.filters.excluded_paths,
                &config.filters.excluded_extensions,
                &config.filters.asset_extensions,
            ),
        }
    }
}

/// Every page linking to one target
struct Target {
    href: String,
    sources: Vec<String>,
    text: String,
}

/// Internal link targets and cross-locale issues of the pages in scope
struct LinkCensus {
    targets: Vec<Target>,
    cross_locale: Vec<CrossLocaleIssue>,
    pages_scanned: usize,
}

impl LinkCensus {
    fn collect(index: &Index, options: &HealthCheckOptions) -> Self {
        let scope = LocaleScope::from_filter(index.metadata.locale_filter.as_deref());

        let mut targets: Vec<Target> = Vec::new();
        let mut target_pos: HashMap<String, usize> = HashMap::new();
        let mut cross_locale: Vec<CrossLocaleIssue> = Vec::new();
        let mut cross_pos: HashMap<(String, String, String), usize> = HashMap::new();
        let mut pages_scanned = 0;

        for (page_url, page) in &index.pages {
            let source = page.locale.code();
            if !scope.accepts(source) {
                continue;
            }
            pages_scanned += 1;

            for link in page.links.iter().filter(|l| !l.is_external) {
                let target = link.locale.code();
                let is_asset = Url::parse(&link.href).map_or(false, |u| options.assets.is_asset(&u));
                let is_switcher =
                    options.exclude_locale_switcher && is_locale_switcher_text(&link.anchor_text);

                if !is_asset
                    && !is_switcher
                    && is_cross_locale(source, target, options.default_has_prefix)
                {
                    let key = (
                        page.locale.label().to_string(),
                        link.locale.label().to_string(),
                        link.href.clone(),
                    );
                    match cross_pos.get(&key) {
                        Some(&pos) => cross_locale[pos].occurrences += 1,
                        None => {
                            cross_pos.insert(key, cross_locale.len());
                            cross_locale.push(CrossLocaleIssue {
                                source_url: page_url.clone(),
                                source_locale: page.locale.label().to_string(),
                                target_url: link.href.clone(),
                                target_locale: link.locale.label().to_string(),
                                anchor_text: non_empty(&link.anchor_text),
                                occurrences: 1,
                            });
                        }
                    }
                }

                let pos = *target_pos.entry(link.href.clone()).or_insert_with(|| {
                    targets.push(Target {
                        href: link.href.clone(),
                        sources: Vec::new(),
                        text: String::new(),
                    });
                    targets.len() - 1
                });
                let entry = &mut targets[pos];
                entry.sources.push(page_url.clone());
                if entry.text.is_empty() && !link.anchor_text.trim().is_empty() {
                    entry.text = link.anchor_text.clone();
                }
            }
        }

        Self {
            targets,
            cross_locale,
            pages_scanned,
        }
    }

    /// Targets whose status is resolved, in first-seen order
    fn to_check(&self, max_links: usize) -> Vec<String> {
        self.targets
            .iter()
            .take(max_links)
            .map(|t| t.href.clone())
            .collect()
    }

    fn into_report(
        self,
        statuses: &HashMap<String, LinkStatus>,
        options: &HealthCheckOptions,
    ) -> HealthReport {
        let mut report = HealthReport {
            total_unique_links: self.targets.len(),
            cross_locale: self.cross_locale,
            ..HealthReport::default()
        };

        for target in self.targets.iter().take(options.max_links) {
            let Some(status) = statuses.get(&target.href) else {
                continue;
            };
            report.checked_count += 1;
            let issue = || LinkIssue {
                source_url: target.sources.first().cloned().unwrap_or_default(),
                target_url: target.href.clone(),
                anchor_text: non_empty(&target.text),
                status: status.code(),
                occurrences: target.sources.len(),
            };
            match status.verdict(options.timeout_is_healthy) {
                HealthVerdict::Healthy => report.healthy += 1,
                HealthVerdict::Redirect => report.redirects.push(issue()),
                HealthVerdict::Broken => report.broken.push(issue()),
                HealthVerdict::Inconclusive => report.inconclusive += 1,
            }
        }
        report
    }
}

/// Statuses already stored on the index's link records
///
/// Link sampling during a crawl and earlier health checks leave these behind.
pub fn recorded_statuses(index: &Index) -> HashMap<String, LinkStatus> {
    index
        .pages
        .values()
        .flat_map(|page| page.links.iter())
        .filter_map(|link| Some((link.href.clone(), LinkStatus::from_code(link.http_status?))))
        .collect()
}

/// Builds a health report from statuses that are already known
///
/// Cross-locale issues are always complete. Targets without an entry in
/// `statuses` count toward `total_unique_links` but are not classified.
pub fn build_report(
    index: &Index,
    statuses: &HashMap<String, LinkStatus>,
    options: &HealthCheckOptions,
) -> HealthReport {
    LinkCensus::collect(index, options).into_report(statuses, options)
}

/// Resolves link health for an index and stores the report on it
///
/// Only pages inside the index's locale scope are scanned. Each unique
/// internal target is checked once (up to `max_links`), its status is
/// written back to every matching link record, and the rebuilt report
/// replaces the index's previous one.
pub async fn run_health_check(
    index: &mut Index,
    checker: &LinkChecker,
    options: &HealthCheckOptions,
    observer: &dyn CrawlObserver,
) -> HealthReport {
    let census = LinkCensus::collect(index, options);
    let to_check = census.to_check(options.max_links);

    emit_log(
        observer,
        LogLevel::Info,
        &format!(
            "Health check: {} pages scanned, checking {} of {} unique links",
            census.pages_scanned,
            to_check.len(),
            census.targets.len()
        ),
    );

    let statuses = checker
        .check_batch(&to_check, |checked, total| {
            observer.on_health_progress(checked, total)
        })
        .await;

    let report = census.into_report(&statuses, options);

    for page in index.pages.values_mut() {
        for link in page.links.iter_mut() {
            if let Some(status) = statuses.get(&link.href) {
                link.http_status = Some(status.code());
            }
        }
    }

    info!(
        "Health check complete: {} broken, {} redirects, {} cross-locale, {} healthy",
        report.broken.len(),
        report.redirects.len(),
        report.cross_locale.len(),
        report.healthy
    );

    index.health_report = report.clone();
    report
}

fn non_empty(text: &str) -> String {
    if text.trim().is_empty() {
        NO_TEXT.to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{LinkRecord, PageRecord};
    use crate::locale::Locale;
    use chrono::Utc;

    fn link(href: &str, text: &str, locale: Locale, status: Option<u16>) -> LinkRecord {
        LinkRecord {
            href: href.to_string(),
            anchor_text: text.to_string(),
            is_external: false,
            locale,
            source_locale: Locale::Default,
            is_visible: true,
            http_status: status,
        }
    }

    fn index() -> Index {
        let mut index = Index::new("example.com", "https://example.com/", None, Utc::now());
        index.insert_page(
            "https://example.com/",
            PageRecord {
                title: "Home".into(),
                locale: Locale::Default,
                indexed_at: Utc::now(),
                links: vec![
                    link("https://example.com/de/preise", "Preise", Locale::Code("de".into()), None),
                    link("https://example.com/de/", "Deutsch", Locale::Code("de".into()), Some(200)),
                    link("https://example.com/old", "", Locale::Default, Some(404)),
                    link("https://example.com/slow", "Slow", Locale::Default, Some(408)),
                ],
            },
        );
        index.recount();
        index
    }

    #[test]
    fn test_report_from_recorded_statuses() {
        let index = index();
        let statuses = recorded_statuses(&index);
        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses["https://example.com/slow"], LinkStatus::TimedOut);

        let report = build_report(&index, &statuses, &HealthCheckOptions::default());

        // the "Deutsch" switcher link is not an issue
        assert_eq!(report.cross_locale.len(), 1);
        assert_eq!(report.cross_locale[0].target_url, "https://example.com/de/preise");
        assert_eq!(report.cross_locale[0].target_locale, "de");
        assert_eq!(report.total_unique_links, 4);
        assert_eq!(report.checked_count, 3);
        assert_eq!(report.healthy, 2);
        assert_eq!(report.broken.len(), 1);
        assert_eq!(report.broken[0].anchor_text, NO_TEXT);
    }

    #[test]
    fn test_report_without_statuses_keeps_cross_locale() {
        let report = build_report(&index(), &HashMap::new(), &HealthCheckOptions::default());
        assert_eq!(report.cross_locale.len(), 1);
        assert_eq!(report.checked_count, 0);
        assert_eq!(report.healthy + report.broken.len() + report.redirects.len(), 0);
    }
}
