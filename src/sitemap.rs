//! Sitemap reconciliation
//!
//! Compares the URLs a site declares in `sitemap.xml` with the pages that
//! made it into an index. Parsing is deliberately shallow: `<loc>` entries
//! are pulled out with regular expressions, and a sitemap index is expanded
//! one level deep.

use crate::index::Index;
use crate::locale::{LocaleClassifier, LocaleScope};
use crate::SpiderError;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Sub-sitemaps fetched from a sitemap index
pub const MAX_SUB_SITEMAPS: usize = 10;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

fn loc_regex() -> Option<&'static Regex> {
    static LOC: OnceLock<Option<Regex>> = OnceLock::new();
    LOC.get_or_init(|| Regex::new(r"(?i)<loc>\s*([^<]+?)\s*</loc>").ok())
        .as_ref()
}

fn sub_sitemap_regex() -> Option<&'static Regex> {
    static SUB: OnceLock<Option<Regex>> = OnceLock::new();
    SUB.get_or_init(|| Regex::new(r"(?is)<sitemap>.*?<loc>\s*([^<]+?)\s*</loc>.*?</sitemap>").ok())
        .as_ref()
}

/// Result of comparing a sitemap with an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapReport {
    pub sitemap_url: String,
    /// Sitemap URLs inside the index's locale scope
    pub sitemap_count: usize,
    /// All page URLs the sitemap declares
    pub sitemap_total_count: usize,
    /// `"all"`, `"default"`, or a locale code
    pub locale_filter: String,
    pub indexed_count: usize,
    pub in_both: usize,
    pub missing_from_index: Vec<String>,
    pub extra_in_index: Vec<String>,
}

/// Key used to match sitemap and index URLs
///
/// Origin plus the lower-cased path without its trailing slash, plus the
/// query string. Unparsable input is lower-cased as is.
pub fn comparison_key(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(url) => {
            let path = url.path().trim_end_matches('/').to_lowercase();
            let query = url.query().map(|q| format!("?{}", q)).unwrap_or_default();
            format!("{}{}{}", url.origin().ascii_serialization(), path, query)
        }
        Err(_) => raw.trim().trim_end_matches('/').to_lowercase(),
    }
}

/// Page `<loc>` entries of one sitemap document and the sub-sitemaps it lists
pub fn parse_sitemap(xml: &str) -> (Vec<String>, Vec<String>) {
    let (Some(loc), Some(sub)) = (loc_regex(), sub_sitemap_regex()) else {
        return (Vec::new(), Vec::new());
    };

    let subs: Vec<String> = sub
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| decode_entities(m.as_str()))
        .collect();
    let sub_set: HashSet<&str> = subs.iter().map(String::as_str).collect();

    let pages = loc
        .captures_iter(xml)
        .filter_map(|c| c.get(1))
        .map(|m| decode_entities(m.as_str()))
        .filter(|entry| !sub_set.contains(entry.as_str()))
        .collect();

    (pages, subs)
}

fn decode_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Pure comparison of declared sitemap URLs against an index
pub fn compare(
    index: &Index,
    sitemap_url: &str,
    sitemap_urls: &[String],
    classifier: &LocaleClassifier,
) -> SitemapReport {
    let scope = LocaleScope::from_filter(index.metadata.locale_filter.as_deref());

    let in_scope: Vec<&String> = sitemap_urls
        .iter()
        .filter(|raw| {
            let code = Url::parse(raw).ok().and_then(|u| classifier.extract_locale(&u));
            scope.accepts(code.as_deref())
        })
        .collect();

    let mut sitemap_keys = HashSet::new();
    let sitemap_unique: Vec<(String, &String)> = in_scope
        .iter()
        .map(|raw| (comparison_key(raw), *raw))
        .filter(|(key, _)| sitemap_keys.insert(key.clone()))
        .collect();

    let index_keys: HashSet<String> = index.pages.keys().map(|u| comparison_key(u)).collect();

    let (both, missing): (Vec<_>, Vec<_>) = sitemap_unique
        .into_iter()
        .partition(|(key, _)| index_keys.contains(key));

    let extra_in_index = index
        .pages
        .keys()
        .filter(|u| !sitemap_keys.contains(&comparison_key(u)))
        .cloned()
        .collect();

    SitemapReport {
        sitemap_url: sitemap_url.to_string(),
        sitemap_count: in_scope.len(),
        sitemap_total_count: sitemap_urls.len(),
        locale_filter: scope.as_filter().unwrap_or("all").to_string(),
        indexed_count: index.pages.len(),
        in_both: both.len(),
        missing_from_index: missing.into_iter().map(|(_, raw)| raw.clone()).collect(),
        extra_in_index,
    }
}

/// Fetches a site's sitemap and compares it with an index
#[derive(Debug, Clone)]
pub struct SitemapReconciler {
    client: Client,
    classifier: LocaleClassifier,
    sitemap_url: Option<String>,
}

impl SitemapReconciler {
    pub fn new(client: Client, classifier: LocaleClassifier) -> Self {
        Self {
            client,
            classifier,
            sitemap_url: None,
        }
    }

    /// Uses this sitemap instead of `https://<domain>/sitemap.xml`
    #[must_use]
    pub fn with_sitemap_url(mut self, url: impl Into<String>) -> Self {
        self.sitemap_url = Some(url.into());
        self
    }

    pub fn sitemap_url_for(&self, domain: &str) -> String {
        self.sitemap_url
            .clone()
            .unwrap_or_else(|| format!("https://{}/sitemap.xml", domain))
    }

    async fn fetch(&self, url: &str) -> Result<String, SpiderError> {
        let response = self
            .client
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|source| SpiderError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SpiderError::Sitemap(format!(
                "Sitemap {} returned {}",
                url,
                status.as_u16()
            )));
        }
        response.text().await.map_err(|source| SpiderError::Http {
            url: url.to_string(),
            source,
        })
    }

    /// All page URLs declared by the sitemap and up to ten sub-sitemaps
    ///
    /// A failing sub-sitemap is skipped; a failing root sitemap is an error.
    pub async fn fetch_urls(&self, sitemap_url: &str) -> Result<Vec<String>, SpiderError> {
        let xml = self.fetch(sitemap_url).await?;
        let (mut urls, subs) = parse_sitemap(&xml);

        if subs.len() > MAX_SUB_SITEMAPS {
            warn!(
                "Sitemap index lists {} sitemaps, reading the first {}",
                subs.len(),
                MAX_SUB_SITEMAPS
            );
        }
        for sub in subs.iter().take(MAX_SUB_SITEMAPS) {
            match self.fetch(sub).await {
                Ok(sub_xml) => {
                    let (pages, _) = parse_sitemap(&sub_xml);
                    debug!("{} lists {} URLs", sub, pages.len());
                    urls.extend(pages);
                }
                Err(e) => warn!("Skipping sub-sitemap {}: {}", sub, e),
            }
        }

        Ok(urls)
    }

    /// Fetches the sitemap for the index's domain and compares
    ///
    /// # Errors
    ///
    /// An unreachable sitemap, or one with no URLs, is a `Sitemap` error.
    pub async fn reconcile(&self, index: &Index) -> Result<SitemapReport, SpiderError> {
        let sitemap_url = self.sitemap_url_for(&index.metadata.domain);
        let urls = self.fetch_urls(&sitemap_url).await.map_err(|e| match e {
            SpiderError::Sitemap(_) => e,
            other => SpiderError::Sitemap(format!(
                "Could not fetch sitemap from {}: {}",
                sitemap_url, other
            )),
        })?;

        if urls.is_empty() {
            return Err(SpiderError::Sitemap(
                "Sitemap is empty or could not be parsed".to_string(),
            ));
        }

        let report = compare(index, &sitemap_url, &urls, &self.classifier);
        info!(
            "Sitemap: {} in both, {} missing from index, {} only in index",
            report.in_both,
            report.missing_from_index.len(),
            report.extra_in_index.len()
        );
        Ok(report)
    }
}
