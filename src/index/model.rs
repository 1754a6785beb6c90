use crate::health::HealthReport;
use crate::locale::Locale;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn visible_by_default() -> bool {
    true
}

/// One outbound anchor of an indexed page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredLink")]
pub struct LinkRecord {
    /// Normalized absolute target URL
    pub href: String,
    pub anchor_text: String,
    pub is_external: bool,
    /// Target locale, resolved once at extraction time (`null` when external)
    pub locale: Locale,
    /// Locale of the page the link was found on
    pub source_locale: Locale,
    pub is_visible: bool,
    /// Filled in by the health checker; absent if never checked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

/// Link record as read from disk, including older field names
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLink {
    href: String,
    #[serde(alias = "text", default)]
    anchor_text: String,
    is_external: bool,
    locale: Locale,
    source_locale: Locale,
    #[serde(default = "visible_by_default")]
    is_visible: bool,
    #[serde(alias = "status", default)]
    http_status: Option<u16>,
}

impl From<StoredLink> for LinkRecord {
    fn from(stored: StoredLink) -> Self {
        // Older indexes wrote `null` for unprefixed internal locales
        let internal = |locale: Locale| match locale {
            Locale::External => Locale::Default,
            other => other,
        };
        let locale = if stored.is_external {
            stored.locale
        } else {
            internal(stored.locale)
        };

        Self {
            href: stored.href,
            anchor_text: stored.anchor_text,
            is_external: stored.is_external,
            locale,
            source_locale: internal(stored.source_locale),
            is_visible: stored.is_visible,
            http_status: stored.http_status,
        }
    }
}

/// One indexed page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    #[serde(default)]
    pub title: String,
    pub locale: Locale,
    pub indexed_at: DateTime<Utc>,
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

/// Index-level facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexMetadata {
    pub domain: String,
    pub start_url: String,
    /// `None` for a full-site index, `"default"`, or a locale code
    #[serde(default)]
    pub locale_filter: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Set when an incremental merge touched the index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub total_links: usize,
}

/// A searchable snapshot of a site's link graph
///
/// Pages are keyed by normalized URL. Once built the index is only read,
/// so it can be shared between concurrent searches without locking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub metadata: IndexMetadata,
    #[serde(default)]
    pub pages: BTreeMap<String, PageRecord>,
    #[serde(default)]
    pub health_report: HealthReport,
}

impl Index {
    /// An empty index for one domain and locale scope
    pub fn new(
        domain: impl Into<String>,
        start_url: impl Into<String>,
        locale_filter: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            metadata: IndexMetadata {
                domain: domain.into(),
                start_url: start_url.into(),
                locale_filter,
                created_at,
                updated_at: None,
                total_pages: 0,
                total_links: 0,
            },
            pages: BTreeMap::new(),
            health_report: HealthReport::default(),
        }
    }

    /// Inserts or replaces a page record
    pub fn insert_page(&mut self, url: impl Into<String>, page: PageRecord) {
        self.pages.insert(url.into(), page);
    }

    /// Recomputes `total_pages` and `total_links` from the page map
    pub fn recount(&mut self) {
        self.metadata.total_pages = self.pages.len();
        self.metadata.total_links = self.pages.values().map(|p| p.links.len()).sum();
    }

    /// All (page URL, page, link) triples in key order
    pub fn links(&self) -> impl Iterator<Item = (&str, &PageRecord, &LinkRecord)> {
        self.pages
            .iter()
            .flat_map(|(url, page)| page.links.iter().map(move |link| (url.as_str(), page, link)))
    }
}
