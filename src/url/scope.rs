use crate::UrlError;
use url::Url;

/// The set of hosts a crawl job is allowed to visit
///
/// By default a job is pinned to the exact host of its start URL. A
/// wildcard pattern such as `*.example.com` widens the scope to the bare
/// domain and every subdomain beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    root_host: String,
    pattern: Option<String>,
}

impl DomainScope {
    /// Builds the scope for a start URL, optionally widened by a host pattern
    pub fn new(start_url: &Url, pattern: Option<&str>) -> Result<Self, UrlError> {
        let root_host = extract_domain(start_url).ok_or(UrlError::MissingDomain)?;
        Ok(Self {
            root_host,
            pattern: pattern
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty()),
        })
    }

    /// The host of the start URL
    pub fn root_host(&self) -> &str {
        &self.root_host
    }

    /// Returns true if the URL's host is inside this scope
    pub fn contains(&self, url: &Url) -> bool {
        match extract_domain(url) {
            Some(host) => self.contains_host(&host),
            None => false,
        }
    }

    /// Returns true if the (lowercase) host is inside this scope
    pub fn contains_host(&self, host: &str) -> bool {
        match &self.pattern {
            Some(pattern) => matches_wildcard(pattern, host),
            None => host == self.root_host,
        }
    }
}

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use locale_spider::url::extract_domain;
///
/// let url = Url::parse("https://Shop.Example.com:8443/de/").unwrap();
/// assert_eq!(extract_domain(&url), Some("shop.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .filter(|h| !h.is_empty())
        .map(|h| h.to_lowercase())
}

/// Matches a host against `example.com` (exact) or `*.example.com` (the bare
/// domain plus any subdomain)
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}
