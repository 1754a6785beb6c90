//! URL handling module for Locale Spider
//!
//! This module provides URL normalization, domain scoping, exclusion tables
//! and link classification.

mod filter;
mod normalize;
mod scope;

pub use filter::{
    UrlFilter, DEFAULT_ASSET_EXTENSIONS, DEFAULT_EXCLUDED_EXTENSIONS, DEFAULT_EXCLUDED_PATHS,
};
pub use normalize::{normalize_url, UrlNormalizer, DEFAULT_TRACKING_PARAMS};
pub use scope::{extract_domain, matches_wildcard, DomainScope};

use ::url::Url;

/// Where a link target lives relative to the crawled site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostClassification {
    /// Same host as the page it was found on
    Internal,
    /// Any other host
    External,
}

impl HostClassification {
    /// Returns true for links that leave the site
    pub fn is_external(&self) -> bool {
        matches!(self, Self::External)
    }
}

/// Classifies a link target against the page it was found on
///
/// Only the host is compared, so `http://` and `https://` variants of the
/// same site are both internal.
///
/// # Arguments
///
/// * `target` - The normalized link target
/// * `source` - The page the link was found on
///
/// # Returns
///
/// `Internal` when both URLs share a host, `External` otherwise
pub fn classify_host(target: &Url, source: &Url) -> HostClassification {
    match (extract_domain(target), extract_domain(source)) {
        (Some(t), Some(s)) if t == s => HostClassification::Internal,
        _ => HostClassification::External,
    }
}
