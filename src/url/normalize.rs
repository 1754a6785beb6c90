use crate::UrlError;
use url::Url;

/// Tracking query parameters removed during normalization (any `utm_*` key is
/// removed as well)
pub const DEFAULT_TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "session", "token"];

/// Canonicalizes discovered links into the identity key used by the frontier,
/// the index and the health checker
///
/// # Normalization Steps
///
/// 1. Resolve the href against the base URL (if any); reject if malformed
/// 2. Require a web scheme (http or https)
/// 3. Remove fragment (everything after #)
/// 4. Remove tracking query parameters, keeping the others in order
/// 5. Remove empty query string (trailing ?)
/// 6. Remove trailing slashes, except for the bare origin root
///
/// Normalizing an already normalized URL returns it unchanged.
#[derive(Debug, Clone)]
pub struct UrlNormalizer {
    tracking_params: Vec<String>,
}

impl Default for UrlNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKING_PARAMS.iter().map(|p| p.to_string()))
    }
}

impl UrlNormalizer {
    /// Creates a normalizer that strips the given query keys in addition to `utm_*`
    pub fn new<I, S>(tracking_params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tracking_params: tracking_params
                .into_iter()
                .map(|p| p.into().to_lowercase())
                .collect(),
        }
    }

    /// Normalizes an href, resolving it against `base` when it is relative
    ///
    /// # Examples
    ///
    /// ```
    /// use locale_spider::url::UrlNormalizer;
    /// use url::Url;
    ///
    /// let base = Url::parse("https://example.com/de/about").unwrap();
    /// let normalizer = UrlNormalizer::default();
    /// let url = normalizer.normalize("../contact/?utm_source=x#team", Some(&base)).unwrap();
    /// assert_eq!(url.as_str(), "https://example.com/contact");
    /// ```
    pub fn normalize(&self, href: &str, base: Option<&Url>) -> Result<Url, UrlError> {
        let href = href.trim();
        if href.is_empty() {
            return Err(UrlError::Parse("empty href".to_string()));
        }

        let mut url = match base {
            Some(base) => base.join(href),
            None => Url::parse(href),
        }
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(UrlError::InvalidScheme(url.scheme().to_string()));
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(UrlError::MissingDomain);
        }

        url.set_fragment(None);

        if let Some(query) = url.query() {
            let kept = self.filter_query(query);
            if kept.is_empty() {
                url.set_query(None);
            } else {
                url.set_query(Some(&kept));
            }
        }

        let trimmed = url.path().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            url.set_path("/");
        } else if trimmed.len() != url.path().len() {
            url.set_path(&trimmed);
        }

        Ok(url)
    }

    /// Normalizes an absolute URL string
    pub fn normalize_absolute(&self, url_str: &str) -> Result<Url, UrlError> {
        self.normalize(url_str, None)
    }

    /// Normalizes to the string key, or `None` when the input is unusable
    pub fn key(&self, href: &str, base: Option<&Url>) -> Option<String> {
        self.normalize(href, base).ok().map(String::from)
    }

    /// Returns true if the query key is a tracking parameter
    pub fn is_tracking_param(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        key.starts_with("utm_") || self.tracking_params.iter().any(|p| *p == key)
    }

    // Works on the raw query so that re-normalizing never re-encodes values.
    fn filter_query(&self, query: &str) -> String {
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter(|pair| {
                let key = pair.split('=').next().unwrap_or_default();
                !self.is_tracking_param(key)
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Normalizes an absolute URL with the default tracking parameter table
///
/// # Examples
///
/// ```
/// use locale_spider::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.com/page/?gclid=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    UrlNormalizer::default().normalize_absolute(url_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/de/products/shoes").unwrap()
    }

    #[test]
    fn test_resolve_relative_href() {
        let n = UrlNormalizer::default();
        let result = n.normalize("boots", Some(&base())).unwrap();
        assert_eq!(result.as_str(), "https://example.com/de/products/boots");
    }

    #[test]
    fn test_resolve_root_relative_href() {
        let n = UrlNormalizer::default();
        let result = n.normalize("/fr/", Some(&base())).unwrap();
        assert_eq!(result.as_str(), "https://example.com/fr");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize_url("https://example.com/").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize_url("https://example.com").unwrap();
        assert_eq!(result.as_str(), "https://example.com/");
    }

    #[test]
    fn test_remove_trailing_slashes() {
        let result = normalize_url("https://example.com/page//").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize_url("https://example.com/page#section").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_remove_tracking_params() {
        let result =
            normalize_url("https://example.com/page?utm_source=a&fbclid=b&gclid=c&session=d&token=e")
                .unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_keep_other_params_in_order() {
        let result = normalize_url("https://example.com/page?b=2&utm_medium=x&a=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?b=2&a=1");
    }

    #[test]
    fn test_tracking_params_are_case_insensitive() {
        let result = normalize_url("https://example.com/page?UTM_Campaign=x&FBCLID=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_custom_tracking_table() {
        let n = UrlNormalizer::new(["r"]);
        let result = n.normalize_absolute("https://example.com/page?r=0&gclid=1").unwrap();
        assert_eq!(result.as_str(), "https://example.com/page?gclid=1");
    }

    #[test]
    fn test_invalid_scheme() {
        let n = UrlNormalizer::default();
        let result = n.normalize("mailto:team@example.com", Some(&base()));
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize_url("not a url").is_err());
        assert!(UrlNormalizer::default().normalize("   ", Some(&base())).is_err());
    }

    #[test]
    fn test_key_swallows_errors() {
        let n = UrlNormalizer::default();
        assert_eq!(n.key("javascript:void(0)", Some(&base())), None);
        assert_eq!(
            n.key("/about/", Some(&base())),
            Some("https://example.com/about".to_string())
        );
    }

    #[test]
    fn test_normalization_is_a_fixpoint() {
        let n = UrlNormalizer::default();
        let inputs = [
            "../a//?x=1&utm_source=q#frag",
            "/",
            "/de/kontakt/",
            "https://example.com/search?q=a+b&token=1",
            "shoes/?&&a=1",
            "//example.com/x/",
        ];
        for href in inputs {
            let once = n.normalize(href, Some(&base())).unwrap();
            let twice = n.normalize(once.as_str(), Some(&base())).unwrap();
            assert_eq!(once, twice, "normalization not stable for {}", href);
        }
    }
}
