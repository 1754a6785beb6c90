//! Locale Spider: a link index and locale auditor for multilingual sites
//!
//! This crate crawls one site into a searchable link index, flags links that
//! cross a locale boundary, verifies link health, and reconciles the result
//! against the site's sitemap.

pub mod config;
pub mod crawler;
pub mod health;
pub mod index;
pub mod locale;
pub mod output;
pub mod sitemap;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Locale Spider operations
#[derive(Debug, Error)]
pub enum SpiderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Render error: {0}")]
    Render(#[from] crawler::RenderError),

    #[error("Job error: {0}")]
    Job(#[from] JobError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Sitemap error: {0}")]
    Sitemap(String),

    #[error("No index found for {domain}")]
    IndexNotFound { domain: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Failures that abort a whole crawl job
///
/// Everything below the job boundary (a page that will not load, a link that
/// will not resolve) is recovered inside the worker pool and never surfaces
/// here.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Invalid start URL '{url}': {reason}")]
    InvalidStartUrl { url: String, reason: String },

    #[error("Invalid job configuration: {0}")]
    Config(String),

    #[error("Rendering engine failed to start: {0}")]
    EngineInit(String),
}

/// Result type alias for Locale Spider operations
pub type Result<T> = std::result::Result<T, SpiderError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use index::{Index, LinkRecord, PageRecord};
pub use locale::{Locale, LocaleClassifier};
pub use state::JobState;
pub use crate::url::{normalize_url, UrlNormalizer};
