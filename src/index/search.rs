//! Instant search over a built index
//!
//! A query is evaluated by one linear scan over every page and link. The
//! same evaluator runs against single pages during a live crawl, so live and
//! offline findings agree.

use crate::index::{Index, LinkRecord, PageRecord};
use crate::locale::{is_locale_switcher_text, Locale, LocaleScope};
use crate::url::UrlFilter;
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

const NO_TEXT: &str = "[No Text]";

/// Which rules a query applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[default]
    Pattern,
    CrossLocale,
    /// Pattern OR cross-locale
    Both,
}

impl SearchMode {
    fn wants_pattern(self) -> bool {
        matches!(self, Self::Pattern | Self::Both)
    }

    fn wants_cross_locale(self) -> bool {
        matches!(self, Self::CrossLocale | Self::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::CrossLocale => "crosslocale",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a link was reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingType {
    PatternMatch,
    CrossLocale,
}

/// One reported link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub source_page: String,
    pub source_title: String,
    pub source_locale: Locale,
    pub anchor_text: String,
    pub linked_to: String,
    pub target_locale: Locale,
    pub is_external: bool,
    pub is_visible: bool,
    pub finding_type: FindingType,
}

/// A single search term
#[derive(Debug, Clone)]
enum Pattern {
    Substring(String),
    Regex(Regex),
}

impl Pattern {
    /// `/expr/` is a case-insensitive regex; an invalid one degrades to a substring
    fn parse(raw: &str) -> Self {
        let term = raw.trim();
        if term.len() > 2 && term.starts_with('/') && term.ends_with('/') {
            // Case is folded by the regex engine; escapes like `\D` keep their meaning
            if let Ok(re) = RegexBuilder::new(&term[1..term.len() - 1])
                .case_insensitive(true)
                .build()
            {
                return Self::Regex(re);
            }
        }
        Self::Substring(term.to_lowercase())
    }

    fn matches(&self, href: &str) -> bool {
        match self {
            Self::Substring(term) => href.to_lowercase().contains(term.as_str()),
            Self::Regex(re) => re.is_match(href),
        }
    }
}

/// A search request
///
/// # Examples
///
/// ```
/// use locale_spider::index::{SearchMode, SearchQuery};
///
/// let query = SearchQuery::new(SearchMode::Both)
///     .with_patterns("contact, /\\/about$/")
///     .with_other_locales(["de", "fr"]);
/// assert_eq!(query.pattern(), Some("contact, /\\/about$/"));
/// ```
#[derive(Debug, Clone)]
pub struct SearchQuery {
    mode: SearchMode,
    raw_pattern: Option<String>,
    patterns: Vec<Pattern>,
    source_scope: LocaleScope,
    other_locales: Vec<String>,
    exclude_locale_switcher: bool,
    assets: UrlFilter,
}

impl SearchQuery {
    pub fn new(mode: SearchMode) -> Self {
        Self {
            mode,
            raw_pattern: None,
            patterns: Vec::new(),
            source_scope: LocaleScope::All,
            other_locales: Vec::new(),
            exclude_locale_switcher: true,
            assets: UrlFilter::default(),
        }
    }

    /// Comma-separated list of terms, matched as OR
    pub fn with_patterns(mut self, pattern: &str) -> Self {
        self.patterns = pattern
            .split(',')
            .filter(|p| !p.trim().is_empty())
            .map(Pattern::parse)
            .collect();
        self.raw_pattern = Some(pattern.to_string()).filter(|p| !p.trim().is_empty());
        self
    }

    /// Restricts the scan to pages of one locale (`"default"` for unprefixed)
    pub fn with_source_locale(mut self, source: Option<&str>) -> Self {
        self.source_scope = LocaleScope::from_filter(source);
        self
    }

    /// Codes a default-locale page must not link to; empty means any code
    pub fn with_other_locales<I, S>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.other_locales = codes
            .into_iter()
            .map(|c| c.as_ref().trim().replace('/', "").to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        self
    }

    pub fn exclude_locale_switcher(mut self, exclude: bool) -> Self {
        self.exclude_locale_switcher = exclude;
        self
    }

    /// Asset extensions that never count as cross-locale targets
    pub fn with_asset_filter(mut self, assets: UrlFilter) -> Self {
        self.assets = assets;
        self
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn pattern(&self) -> Option<&str> {
        self.raw_pattern.as_deref()
    }

    fn matches_pattern(&self, link: &LinkRecord) -> bool {
        self.mode.wants_pattern() && self.patterns.iter().any(|p| p.matches(&link.href))
    }

    fn is_cross_locale(&self, page: &PageRecord, link: &LinkRecord) -> bool {
        if !self.mode.wants_cross_locale() || link.is_external || link.locale.is_external() {
            return false;
        }
        if self.exclude_locale_switcher && is_locale_switcher_text(&link.anchor_text) {
            return false;
        }
        if Url::parse(&link.href).map_or(false, |u| self.assets.is_asset(&u)) {
            return false;
        }

        match page.locale.code() {
            None => match link.locale.code() {
                Some(code) => {
                    self.other_locales.is_empty() || self.other_locales.iter().any(|o| o == code)
                }
                None => false,
            },
            Some(source) => link.locale.code() != Some(source),
        }
    }

    /// Findings on one page, in link order
    pub fn evaluate_page(&self, page_url: &str, page: &PageRecord) -> Vec<Finding> {
        if !self.source_scope.accepts(page.locale.code()) {
            return Vec::new();
        }

        page.links
            .iter()
            .filter_map(|link| {
                let finding_type = if self.is_cross_locale(page, link) {
                    FindingType::CrossLocale
                } else if self.matches_pattern(link) {
                    FindingType::PatternMatch
                } else {
                    return None;
                };
                Some(Finding {
                    source_page: page_url.to_string(),
                    source_title: page.title.clone(),
                    source_locale: page.locale.clone(),
                    anchor_text: if link.anchor_text.is_empty() {
                        NO_TEXT.to_string()
                    } else {
                        link.anchor_text.clone()
                    },
                    linked_to: link.href.clone(),
                    target_locale: link.locale.clone(),
                    is_external: link.is_external,
                    is_visible: link.is_visible,
                    finding_type,
                })
            })
            .collect()
    }
}

/// Search output with the context needed to present it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub domain: String,
    pub pattern: Option<String>,
    pub mode: SearchMode,
    pub total_pages_searched: usize,
    pub indexed_at: DateTime<Utc>,
    pub findings: Vec<Finding>,
}

/// Scans every page of the index; findings come out grouped by source page
pub fn search(index: &Index, query: &SearchQuery) -> Vec<Finding> {
    index
        .pages
        .iter()
        .flat_map(|(url, page)| query.evaluate_page(url, page))
        .collect()
}

/// Runs [`search`] and wraps the findings with index metadata
pub fn search_index(index: &Index, query: &SearchQuery) -> SearchResults {
    SearchResults {
        domain: index.metadata.domain.clone(),
        pattern: query.pattern().map(str::to_string),
        mode: query.mode(),
        total_pages_searched: index.pages.len(),
        indexed_at: index.metadata.updated_at.unwrap_or(index.metadata.created_at),
        findings: search(index, query),
    }
}
