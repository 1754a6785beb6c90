use serde::Deserialize;

/// Main configuration structure for Locale Spider
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub locales: LocalesConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// A configuration with every default in place for the given start URL
    pub fn for_start_url(start_url: impl Into<String>) -> Self {
        Self {
            crawler: CrawlerConfig::new(start_url),
            locales: LocalesConfig::default(),
            filters: FiltersConfig::default(),
            health: HealthConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Crawl job configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Root URL of the site to index
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Page budget for one job (0 = unbounded)
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Number of concurrent workers
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// Delay each worker waits after a page (milliseconds)
    #[serde(rename = "page-delay", default = "default_page_delay")]
    pub page_delay: u64,

    /// Navigation timeout per attempt (milliseconds)
    #[serde(rename = "navigation-timeout", default = "default_navigation_timeout")]
    pub navigation_timeout: u64,

    /// Extra navigation attempts after the first one fails transiently
    #[serde(rename = "navigation-retries", default = "default_navigation_retries")]
    pub navigation_retries: u32,

    /// Back-off between navigation attempts (milliseconds)
    #[serde(rename = "retry-delay", default = "default_retry_delay")]
    pub retry_delay: u64,

    /// Restrict the crawl to one locale code, or "default" for unprefixed pages
    #[serde(rename = "locale-filter", default)]
    pub locale_filter: Option<String>,

    /// Host pattern (e.g. "*.example.com"); the start URL's host when absent
    #[serde(rename = "domain-scope", default)]
    pub domain_scope: Option<String>,
}

impl CrawlerConfig {
    /// Crawler settings with defaults for everything but the start URL
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            max_pages: default_max_pages(),
            concurrency: default_concurrency(),
            page_delay: default_page_delay(),
            navigation_timeout: default_navigation_timeout(),
            navigation_retries: default_navigation_retries(),
            retry_delay: default_retry_delay(),
            locale_filter: None,
            domain_scope: None,
        }
    }
}

/// Locale detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LocalesConfig {
    /// Locale codes recognised as the first path segment
    #[serde(default = "default_known_locales")]
    pub known: Vec<String>,

    /// Locale codes that count as "other" for cross-locale search
    #[serde(default = "default_other_locales")]
    pub other: Vec<String>,

    /// Whether the default locale also carries a path prefix (e.g. /en/)
    #[serde(rename = "default-has-prefix", default)]
    pub default_has_prefix: bool,

    /// Accept unknown `xx` / `xx-yyyy` first segments as locale codes
    #[serde(rename = "heuristic-fallback", default = "default_true")]
    pub heuristic_fallback: bool,

    /// Drop links whose anchor text looks like a language switcher
    #[serde(rename = "exclude-locale-switcher", default = "default_true")]
    pub exclude_locale_switcher: bool,
}

impl Default for LocalesConfig {
    fn default() -> Self {
        Self {
            known: default_known_locales(),
            other: default_other_locales(),
            default_has_prefix: false,
            heuristic_fallback: true,
            exclude_locale_switcher: true,
        }
    }
}

/// Exclusion tables
#[derive(Debug, Clone, Deserialize)]
pub struct FiltersConfig {
    #[serde(rename = "excluded-paths", default = "default_excluded_paths")]
    pub excluded_paths: Vec<String>,

    #[serde(rename = "excluded-extensions", default = "default_excluded_extensions")]
    pub excluded_extensions: Vec<String>,

    #[serde(rename = "asset-extensions", default = "default_asset_extensions")]
    pub asset_extensions: Vec<String>,

    /// Query keys stripped during normalization (utm_* is always stripped)
    #[serde(rename = "tracking-params", default = "default_tracking_params")]
    pub tracking_params: Vec<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            excluded_paths: default_excluded_paths(),
            excluded_extensions: default_excluded_extensions(),
            asset_extensions: default_asset_extensions(),
            tracking_params: default_tracking_params(),
        }
    }
}

/// Link health checking configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    /// HEAD request timeout (milliseconds)
    #[serde(rename = "head-timeout", default = "default_head_timeout")]
    pub head_timeout: u64,

    /// GET fallback timeout (milliseconds)
    #[serde(rename = "get-timeout", default = "default_get_timeout")]
    pub get_timeout: u64,

    /// Number of URLs checked concurrently per batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between batches (milliseconds)
    #[serde(rename = "batch-delay", default = "default_batch_delay")]
    pub batch_delay: u64,

    /// Maximum unique targets checked per health-check run
    #[serde(rename = "max-links", default = "default_max_links")]
    pub max_links: usize,

    /// Sample internal links of every page while indexing
    #[serde(rename = "check-during-index", default)]
    pub check_during_index: bool,

    /// Count timeouts as healthy rather than broken
    #[serde(rename = "timeout-is-healthy", default = "default_true")]
    pub timeout_is_healthy: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            head_timeout: default_head_timeout(),
            get_timeout: default_get_timeout(),
            batch_size: default_batch_size(),
            batch_delay: default_batch_delay(),
            max_links: default_max_links(),
            check_during_index: false,
            timeout_is_healthy: true,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default)]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `{name}/{version}` followed by `(+{url}; {email})` when contact
    /// details are configured.
    pub fn header_value(&self) -> String {
        let contact: Vec<String> = [
            self.contact_url.as_ref().map(|u| format!("+{}", u)),
            self.contact_email.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();

        if contact.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} ({})",
                self.crawler_name,
                self.crawler_version,
                contact.join("; ")
            )
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding one JSON index per (domain, locale scope)
    #[serde(rename = "index-dir", default = "default_index_dir")]
    pub index_dir: String,

    /// Directory holding saved health reports
    #[serde(rename = "report-dir", default = "default_report_dir")]
    pub report_dir: String,

    /// Path to the markdown health summary
    #[serde(rename = "summary-path", default = "default_summary_path")]
    pub summary_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            report_dir: default_report_dir(),
            summary_path: default_summary_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_pages() -> u32 {
    1000
}

fn default_concurrency() -> u32 {
    3
}

fn default_page_delay() -> u64 {
    200
}

fn default_navigation_timeout() -> u64 {
    45_000
}

fn default_navigation_retries() -> u32 {
    1
}

fn default_retry_delay() -> u64 {
    2000
}

fn default_known_locales() -> Vec<String> {
    crate::locale::DEFAULT_KNOWN_LOCALES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_other_locales() -> Vec<String> {
    ["de", "fr", "es"].iter().map(|s| s.to_string()).collect()
}

fn default_excluded_paths() -> Vec<String> {
    to_strings(crate::url::DEFAULT_EXCLUDED_PATHS)
}

fn default_excluded_extensions() -> Vec<String> {
    to_strings(crate::url::DEFAULT_EXCLUDED_EXTENSIONS)
}

fn default_asset_extensions() -> Vec<String> {
    to_strings(crate::url::DEFAULT_ASSET_EXTENSIONS)
}

fn default_tracking_params() -> Vec<String> {
    to_strings(crate::url::DEFAULT_TRACKING_PARAMS)
}

fn default_head_timeout() -> u64 {
    8000
}

fn default_get_timeout() -> u64 {
    10_000
}

fn default_batch_size() -> usize {
    10
}

fn default_batch_delay() -> u64 {
    100
}

fn default_max_links() -> usize {
    200
}

fn default_crawler_name() -> String {
    "LocaleSpider".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_index_dir() -> String {
    "./indexes".to_string()
}

fn default_report_dir() -> String {
    "./reports".to_string()
}

fn default_summary_path() -> String {
    "./health_report.md".to_string()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
