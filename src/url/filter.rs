//! Declarative exclusion tables for paths and file extensions
//!
//! These are plain lookups over the URL path; they never touch the network.

use url::Url;

/// Path segments that are never crawled
pub const DEFAULT_EXCLUDED_PATHS: &[&str] = &[
    "wp-admin", "wp-login", "admin", "login", "logout", "feed", "rss", "cart", "checkout",
    "account",
];

/// Extensions that are never enqueued for crawling
pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "svg", "webp", "zip", "exe", "dmg", "mp4", "mp3", "wav",
    "avi", "mov", "ico", "woff", "woff2", "ttf", "eot",
];

/// Extensions that mark a link target as an asset rather than a page
pub const DEFAULT_ASSET_EXTENSIONS: &[&str] = &[
    "css", "js", "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "woff", "woff2", "ttf", "eot",
    "pdf", "zip", "mp4", "mp3",
];

/// Path and extension exclusion tables
#[derive(Debug, Clone)]
pub struct UrlFilter {
    excluded_paths: Vec<String>,
    excluded_extensions: Vec<String>,
    asset_extensions: Vec<String>,
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXCLUDED_PATHS.iter().copied(),
            DEFAULT_EXCLUDED_EXTENSIONS.iter().copied(),
            DEFAULT_ASSET_EXTENSIONS.iter().copied(),
        )
    }
}

impl UrlFilter {
    /// Creates a filter from explicit tables (entries are lowercased, leading dots ignored)
    pub fn new<P, E, A>(excluded_paths: P, excluded_extensions: E, asset_extensions: A) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
        A: IntoIterator,
        A::Item: AsRef<str>,
    {
        fn clean<I>(items: I) -> Vec<String>
        where
            I: IntoIterator,
            I::Item: AsRef<str>,
        {
            items
                .into_iter()
                .map(|s| s.as_ref().trim().trim_matches('/').trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        }

        Self {
            excluded_paths: clean(excluded_paths),
            excluded_extensions: clean(excluded_extensions),
            asset_extensions: clean(asset_extensions),
        }
    }

    /// Returns true if any path segment is on the excluded list
    pub fn is_excluded_path(&self, url: &Url) -> bool {
        url.path()
            .split('/')
            .filter(|s| !s.is_empty())
            .any(|segment| {
                let segment = segment.to_lowercase();
                self.excluded_paths.iter().any(|p| *p == segment)
            })
    }

    /// Returns true if the path ends in a non-crawlable file extension
    pub fn has_excluded_extension(&self, url: &Url) -> bool {
        extension_of(url).map_or(false, |ext| self.excluded_extensions.contains(&ext))
    }

    /// Returns true if the URL points at a static asset
    pub fn is_asset(&self, url: &Url) -> bool {
        extension_of(url).map_or(false, |ext| self.asset_extensions.contains(&ext))
    }
}

fn extension_of(url: &Url) -> Option<String> {
    let last = url.path().rsplit('/').next()?;
    let (_, ext) = last.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}
