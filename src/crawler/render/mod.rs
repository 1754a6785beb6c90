//! Rendering capability consumed by the page extractor
//!
//! The crawler only needs three things from a renderer: navigate to a URL,
//! read the anchors of the resulting document, and (optionally) skip heavy
//! sub-resources. Anything that can do that, from a headless browser to a
//! plain HTTP client, plugs in through these traits.

mod http;

pub use http::{build_http_client, parse_document, HttpRenderEngine, HttpSession};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Sub-resource categories a session may skip loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Image,
    Stylesheet,
    Font,
    Media,
}

impl ResourceKind {
    /// The set skipped by default to speed up navigation
    pub const HEAVY: [ResourceKind; 4] = [Self::Image, Self::Stylesheet, Self::Font, Self::Media];
}

/// One anchor as seen in the rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAnchor {
    /// Absolute href, resolved against the document URL
    pub href: String,
    /// Visible text (or accessible-name fallback), possibly empty
    pub text: String,
    /// Whether the anchor would be rendered
    pub visible: bool,
}

/// What a session returns after a successful navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomSnapshot {
    /// Final document URL, after any redirects
    pub url: Url,
    pub title: String,
    pub anchors: Vec<RawAnchor>,
}

/// Rendering failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Navigation to {url} timed out after {after_ms}ms")]
    Timeout { url: String, after_ms: u64 },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Rendering session is closed")]
    SessionClosed,

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Rendering engine failed to launch: {0}")]
    Launch(String),
}

impl RenderError {
    /// Timeouts and transient network failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Network { .. })
    }
}

/// One rendering context (a browser tab, or an HTTP client handle)
///
/// Methods take `&self` so a session can be shared with retry closures;
/// implementations keep their mutable state behind interior mutability.
#[async_trait]
pub trait RenderSession: Send + Sync {
    /// Skips loading the given sub-resource kinds; a no-op where meaningless
    async fn block_resources(&self, _kinds: &[ResourceKind]) -> Result<(), RenderError> {
        Ok(())
    }

    /// Loads a URL, replacing the current document
    async fn navigate(&self, url: &Url, timeout: Duration) -> Result<(), RenderError>;

    /// Reads title and anchors from the current document
    async fn extract(&self) -> Result<DomSnapshot, RenderError>;

    /// Releases the session; every later call returns `SessionClosed`
    async fn close(&self) -> Result<(), RenderError>;
}

/// A factory for sessions, owned by one crawl job
#[async_trait]
pub trait RenderEngine: Send + Sync {
    /// Brings the engine up; a failure here aborts the job
    async fn start(&self) -> Result<(), RenderError> {
        Ok(())
    }

    async fn open_session(&self) -> Result<Arc<dyn RenderSession>, RenderError>;

    /// Releases engine-wide resources
    async fn shutdown(&self) -> Result<(), RenderError> {
        Ok(())
    }
}
