use crate::config::LocalesConfig;
use crate::locale::Locale;
use crate::url::{classify_host, UrlFilter};
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Heuristic locale prefix: a two-letter language with an optional region
const FALLBACK_PATTERN: &str = r"^/([a-z]{2}(-[a-z]{2,4})?)/";

/// Maps URL paths to locale verdicts
///
/// The first non-empty path segment is compared against the known-code table.
/// When it is not listed, an optional heuristic accepts anything shaped like
/// `xx` or `xx-yyyy`. Anything else is the default locale.
#[derive(Debug, Clone)]
pub struct LocaleClassifier {
    known: HashSet<String>,
    fallback: Option<Regex>,
    default_has_prefix: bool,
}

impl LocaleClassifier {
    /// Creates a classifier over the given code table
    ///
    /// # Arguments
    ///
    /// * `known` - Locale codes (slashes and case are ignored)
    /// * `heuristic_fallback` - Also accept unlisted `xx` / `xx-yyyy` segments
    /// * `default_has_prefix` - Whether the site's default locale is itself prefixed
    pub fn new<I, S>(known: I, heuristic_fallback: bool, default_has_prefix: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let known = known
            .into_iter()
            .map(|code| code.as_ref().trim().trim_matches('/').to_lowercase())
            .filter(|code| !code.is_empty())
            .collect();

        // The pattern is a constant, so compilation only fails on a programming error
        let fallback = if heuristic_fallback {
            Regex::new(FALLBACK_PATTERN).ok()
        } else {
            None
        };

        Self {
            known,
            fallback,
            default_has_prefix,
        }
    }

    /// Builds a classifier from the `[locales]` config section
    pub fn from_config(config: &LocalesConfig) -> Self {
        Self::new(
            config.known.iter().chain(config.other.iter()),
            config.heuristic_fallback,
            config.default_has_prefix,
        )
    }

    /// Adds a code to the known table (used when a job filters on an unlisted locale)
    pub fn with_code(mut self, code: &str) -> Self {
        let code = code.trim().trim_matches('/').to_lowercase();
        if !code.is_empty() && code != "default" {
            self.known.insert(code);
        }
        self
    }

    pub fn default_has_prefix(&self) -> bool {
        self.default_has_prefix
    }

    /// Returns the locale code of a URL, or `None` for the default locale
    ///
    /// This never fails: every URL yields either a code or the default.
    pub fn extract_locale(&self, url: &Url) -> Option<String> {
        let path = url.path().to_lowercase();

        let first = path.split('/').find(|segment| !segment.is_empty())?;
        if self.known.contains(first) {
            return Some(first.to_string());
        }

        // Normalized URLs lose their trailing slash, so `/xx` must still match
        let fallback = self.fallback.as_ref()?;
        let probe = if path.ends_with('/') {
            path.clone()
        } else {
            format!("{}/", path)
        };
        fallback
            .captures(&probe)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    /// Classifies a page URL as a locale code or the default locale
    pub fn classify(&self, url: &Url) -> Locale {
        match self.extract_locale(url) {
            Some(code) => Locale::Code(code),
            None => Locale::Default,
        }
    }

    /// Classifies a link target seen on `source`; other hosts are external
    pub fn classify_link(&self, target: &Url, source: &Url) -> Locale {
        if classify_host(target, source).is_external() {
            Locale::External
        } else {
            self.classify(target)
        }
    }

    /// Decides whether a link from `source` to `target` crosses a locale boundary
    ///
    /// External links and asset URLs never count.
    pub fn is_cross_locale_link(&self, source: &Url, target: &Url, filter: &UrlFilter) -> bool {
        if classify_host(target, source).is_external() || filter.is_asset(target) {
            return false;
        }

        is_cross_locale(
            self.extract_locale(source).as_deref(),
            self.extract_locale(target).as_deref(),
            self.default_has_prefix,
        )
    }
}

/// Two-branch cross-locale policy over already extracted codes
///
/// `None` stands for the default locale.
///
/// # Examples
///
/// ```
/// use locale_spider::locale::is_cross_locale;
///
/// assert!(is_cross_locale(None, Some("de"), false));
/// assert!(!is_cross_locale(Some("de"), Some("de"), false));
/// assert!(is_cross_locale(Some("de"), None, false));
/// ```
pub fn is_cross_locale(source: Option<&str>, target: Option<&str>, default_has_prefix: bool) -> bool {
    match (source, target) {
        (Some(s), Some(t)) => s != t,
        // A tagged page linking to an unprefixed one lost its prefix
        (Some(_), None) => true,
        (None, Some(_)) => !default_has_prefix,
        (None, None) => false,
    }
}

/// Which pages a locale-scoped crawl or index covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleScope {
    /// Every page
    All,
    /// Only pages without a locale prefix
    Default,
    /// Only pages under one locale code
    Code(String),
}

impl LocaleScope {
    /// Parses a locale filter value: absent means all, `"default"` means unprefixed
    pub fn from_filter(filter: Option<&str>) -> Self {
        match filter.map(|f| f.trim().trim_matches('/').to_lowercase()) {
            None => Self::All,
            Some(f) if f.is_empty() || f == "all" => Self::All,
            Some(f) if f == "default" => Self::Default,
            Some(code) => Self::Code(code),
        }
    }

    /// The filter value as persisted in index metadata
    pub fn as_filter(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Default => Some("default"),
            Self::Code(code) => Some(code),
        }
    }

    /// Returns true if a page with the given extracted code is inside the scope
    pub fn accepts(&self, code: Option<&str>) -> bool {
        match self {
            Self::All => true,
            Self::Default => code.is_none(),
            Self::Code(wanted) => code == Some(wanted.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn classifier() -> LocaleClassifier {
        LocaleClassifier::new(["de", "fr", "pt-br"], true, false)
    }

    #[test]
    fn test_known_prefix() {
        let c = classifier();
        assert_eq!(c.extract_locale(&url("https://example.com/de/about")), Some("de".into()));
        assert_eq!(c.extract_locale(&url("https://example.com/PT-BR")), Some("pt-br".into()));
    }

    #[test]
    fn test_heuristic_fallback() {
        let c = classifier();
        assert_eq!(c.extract_locale(&url("https://example.com/it/prodotti")), Some("it".into()));
        assert_eq!(c.extract_locale(&url("https://example.com/zh-hant")), Some("zh-hant".into()));
        assert_eq!(c.extract_locale(&url("https://example.com/about/team")), None);
        assert_eq!(c.extract_locale(&url("https://example.com/deu/x")), None);
    }

    #[test]
    fn test_heuristic_can_be_disabled() {
        let c = LocaleClassifier::new(["de"], false, false);
        assert_eq!(c.extract_locale(&url("https://example.com/it/prodotti")), None);
        assert_eq!(c.extract_locale(&url("https://example.com/de")), Some("de".into()));
    }

    #[test]
    fn test_extract_locale_is_total() {
        let c = classifier();
        for u in ["https://example.com/", "https://example.com", "https://example.com/%E2%9C%93/x"] {
            assert_eq!(c.classify(&url(u)), Locale::Default);
        }
    }

    #[test]
    fn test_with_code_extends_table() {
        let c = LocaleClassifier::new(["de"], false, false).with_code("sv");
        assert_eq!(c.extract_locale(&url("https://example.com/sv/om")), Some("sv".into()));
    }

    #[test]
    fn test_classify_link_external() {
        let c = classifier();
        let source = url("https://example.com/de/");
        assert_eq!(c.classify_link(&url("https://other.org/de/"), &source), Locale::External);
        assert_eq!(
            c.classify_link(&url("https://example.com/fr/"), &source),
            Locale::Code("fr".into())
        );
    }

    #[test]
    fn test_cross_locale_policy_without_prefix() {
        assert!(is_cross_locale(None, Some("de"), false));
        assert!(!is_cross_locale(Some("de"), Some("de"), false));
        assert!(is_cross_locale(Some("de"), Some("fr"), false));
        assert!(is_cross_locale(Some("de"), None, false));
        assert!(!is_cross_locale(None, None, false));
    }

    #[test]
    fn test_cross_locale_policy_with_prefix() {
        assert!(is_cross_locale(Some("en"), Some("de"), true));
        assert!(is_cross_locale(Some("en"), None, true));
        assert!(!is_cross_locale(None, None, true));
        assert!(!is_cross_locale(None, Some("en"), true));
    }

    #[test]
    fn test_cross_locale_link_excludes_external_and_assets() {
        let c = classifier();
        let filter = UrlFilter::default();
        let source = url("https://example.com/about");
        assert!(c.is_cross_locale_link(&source, &url("https://example.com/de/about"), &filter));
        assert!(!c.is_cross_locale_link(&source, &url("https://other.com/de/about"), &filter));
        assert!(!c.is_cross_locale_link(&source, &url("https://example.com/de/logo.png"), &filter));
    }

    #[test]
    fn test_locale_scope() {
        assert_eq!(LocaleScope::from_filter(None), LocaleScope::All);
        assert_eq!(LocaleScope::from_filter(Some("default")), LocaleScope::Default);
        let de = LocaleScope::from_filter(Some("/DE/"));
        assert_eq!(de, LocaleScope::Code("de".into()));
        assert!(de.accepts(Some("de")));
        assert!(!de.accepts(None));
        assert!(LocaleScope::Default.accepts(None));
        assert!(!LocaleScope::Default.accepts(Some("fr")));
        assert_eq!(de.as_filter(), Some("de"));
    }
}
