//! JavaScript-free rendering engine built on reqwest and scraper
//!
//! Good enough for server-rendered sites: it fetches the document, follows
//! redirects, and reads anchors straight out of the HTML. Sites that build
//! their navigation client-side need a browser-backed engine instead.

use super::{DomSnapshot, RawAnchor, RenderEngine, RenderError, RenderSession};
use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use scraper::{ElementRef, Html, Selector};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use url::Url;

/// Anchor text is cut to this many characters
const MAX_ANCHOR_TEXT: usize = 150;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `follow_redirects` - Follow up to 10 redirects, or surface them to the caller
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use locale_spider::config::UserAgentConfig;
/// use locale_spider::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), true).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    follow_redirects: bool,
) -> Result<Client, reqwest::Error> {
    let policy = if follow_redirects {
        Policy::limited(10)
    } else {
        Policy::none()
    };

    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(policy)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rendering engine that hands out HTTP-backed sessions
#[derive(Debug, Clone)]
pub struct HttpRenderEngine {
    client: Client,
}

impl HttpRenderEngine {
    pub fn new(config: &UserAgentConfig) -> Result<Self, RenderError> {
        let client =
            build_http_client(config, true).map_err(|e| RenderError::Launch(e.to_string()))?;
        Ok(Self { client })
    }

    /// Uses an existing client (it should follow redirects)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RenderEngine for HttpRenderEngine {
    async fn open_session(&self) -> Result<Arc<dyn RenderSession>, RenderError> {
        Ok(Arc::new(HttpSession::new(self.client.clone())))
    }
}

/// One HTTP "tab": holds the last document it navigated to
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    current: Mutex<Option<DomSnapshot>>,
    closed: AtomicBool,
}

impl HttpSession {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            current: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    fn ensure_open(&self) -> Result<(), RenderError> {
        if self.closed.load(Ordering::Acquire) {
            Err(RenderError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RenderSession for HttpSession {
    async fn navigate(&self, url: &Url, timeout: Duration) -> Result<(), RenderError> {
        self.ensure_open()?;
        *self.current.lock().await = None;

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(RenderError::Navigation {
                url: url.to_string(),
                message: format!("non-HTML content ({})", content_type),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        let snapshot = parse_document(&body, &final_url);
        *self.current.lock().await = Some(snapshot);
        Ok(())
    }

    async fn extract(&self) -> Result<DomSnapshot, RenderError> {
        self.ensure_open()?;
        self.current
            .lock()
            .await
            .clone()
            .ok_or_else(|| RenderError::Extraction("no document loaded".to_string()))
    }

    async fn close(&self) -> Result<(), RenderError> {
        self.closed.store(true, Ordering::Release);
        *self.current.lock().await = None;
        Ok(())
    }
}

/// Maps a reqwest failure onto the retryable / terminal split
fn classify_error(url: &Url, timeout: Duration, e: reqwest::Error) -> RenderError {
    if e.is_timeout() {
        RenderError::Timeout {
            url: url.to_string(),
            after_ms: timeout.as_millis() as u64,
        }
    } else if e.is_connect() || e.is_request() || e.is_body() {
        RenderError::Network {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        RenderError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

/// Parses an HTML document into a snapshot of its title and anchors
///
/// # Link Extraction Rules
///
/// **Include:** every `<a href="...">`, resolved against `base_url`
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that does not resolve to http(s)
///
/// Anchor text falls back to `aria-label`, `title`, an inner `img[alt]`, then
/// an inner `svg title`.
pub fn parse_document(html: &str, base_url: &Url) -> DomSnapshot {
    let document = Html::parse_document(html);

    DomSnapshot {
        url: base_url.clone(),
        title: extract_title(&document).unwrap_or_default(),
        anchors: extract_anchors(&document, base_url),
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = selector("head > title").or_else(|| selector("title"))?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

fn extract_anchors(document: &Html, base_url: &Url) -> Vec<RawAnchor> {
    let Some(a_selector) = selector("a[href]") else {
        return Vec::new();
    };
    let img_selector = selector("img[alt]");
    let svg_title_selector = selector("svg title");

    document
        .select(&a_selector)
        .filter_map(|element| {
            let href = resolve_link(element.value().attr("href")?, base_url)?;
            let text = anchor_text(&element, img_selector.as_ref(), svg_title_selector.as_ref());
            Some(RawAnchor {
                href,
                text: text.chars().take(MAX_ANCHOR_TEXT).collect(),
                visible: is_visible(&element),
            })
        })
        .collect()
}

fn anchor_text(element: &ElementRef, img: Option<&Selector>, svg_title: Option<&Selector>) -> String {
    let inner = collapse_whitespace(&element.text().collect::<String>());
    if !inner.is_empty() {
        return inner;
    }

    for attr in ["aria-label", "title"] {
        if let Some(value) = element.value().attr(attr).map(str::trim) {
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }

    let alt = img.and_then(|sel| {
        element
            .select(sel)
            .filter_map(|img| img.value().attr("alt"))
            .map(str::trim)
            .find(|alt| !alt.is_empty())
    });
    if let Some(alt) = alt {
        return alt.to_string();
    }

    svg_title
        .and_then(|sel| element.select(sel).next())
        .map(|t| collapse_whitespace(&t.text().collect::<String>()))
        .unwrap_or_default()
}

/// An anchor is hidden if it or any ancestor is hidden
fn is_visible(element: &ElementRef) -> bool {
    !is_hidden(element) && !element.ancestors().filter_map(ElementRef::wrap).any(|e| is_hidden(&e))
}

fn is_hidden(element: &ElementRef) -> bool {
    let value = element.value();
    if value.attr("hidden").is_some() {
        return true;
    }
    if value
        .attr("aria-hidden")
        .map_or(false, |v| v.trim().eq_ignore_ascii_case("true"))
    {
        return true;
    }
    value.attr("style").map_or(false, |style| {
        let style: String = style
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        style.contains("display:none") || style.contains("visibility:hidden")
    })
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only hrefs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
