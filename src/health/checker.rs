//! Live HTTP status resolution for link targets

use crate::config::{HealthConfig, UserAgentConfig};
use crate::crawler::build_http_client;
use crate::crawler::retry::{run_with_retry, RetryPolicy};
use crate::index::LinkRecord;
use crate::url::UrlNormalizer;
use futures::future::join_all;
use reqwest::{header, Client, StatusCode};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Status code persisted for a request that timed out
pub const TIMEOUT_STATUS: u16 = 408;
/// Status code persisted for a target that could not be reached at all
pub const UNREACHABLE_STATUS: u16 = 0;

/// Resolved liveness of one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    /// The server answered with this status
    Http(u16),
    /// Neither HEAD nor GET answered in time
    TimedOut,
    /// DNS, connection or TLS failure
    Unreachable,
}

impl LinkStatus {
    /// Numeric form stored on link records
    pub fn code(&self) -> u16 {
        match self {
            Self::Http(code) => *code,
            Self::TimedOut => TIMEOUT_STATUS,
            Self::Unreachable => UNREACHABLE_STATUS,
        }
    }

    /// Reads back a code stored on a link record
    pub fn from_code(code: u16) -> Self {
        match code {
            TIMEOUT_STATUS => Self::TimedOut,
            UNREACHABLE_STATUS => Self::Unreachable,
            code => Self::Http(code),
        }
    }

    /// How the status counts in a health report
    ///
    /// # Examples
    ///
    /// ```
    /// use locale_spider::health::{HealthVerdict, LinkStatus};
    ///
    /// assert_eq!(LinkStatus::Http(410).verdict(true), HealthVerdict::Broken);
    /// assert_eq!(LinkStatus::Http(301).verdict(true), HealthVerdict::Redirect);
    /// assert_eq!(LinkStatus::TimedOut.verdict(true), HealthVerdict::Healthy);
    /// ```
    pub fn verdict(&self, timeout_is_healthy: bool) -> HealthVerdict {
        match self {
            Self::Http(code) => match code {
                200..=299 => HealthVerdict::Healthy,
                300..=399 => HealthVerdict::Redirect,
                404 | 410 => HealthVerdict::Broken,
                c if *c >= 500 => HealthVerdict::Broken,
                _ => HealthVerdict::Inconclusive,
            },
            Self::TimedOut if timeout_is_healthy => HealthVerdict::Healthy,
            Self::TimedOut => HealthVerdict::Inconclusive,
            Self::Unreachable => HealthVerdict::Broken,
        }
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(code) => write!(f, "{}", code),
            Self::TimedOut => f.write_str("timeout"),
            Self::Unreachable => f.write_str("unreachable"),
        }
    }
}

/// Report bucket for a resolved status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthVerdict {
    Healthy,
    Redirect,
    Broken,
    /// Proves nothing either way (401, 429, ...)
    Inconclusive,
}

/// Why a single probe produced no status
#[derive(Debug, Clone, PartialEq, Eq)]
enum ProbeFailure {
    TimedOut,
    Unreachable(String),
}

impl ProbeFailure {
    fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::TimedOut
        } else {
            Self::Unreachable(e.to_string())
        }
    }

    fn is_transient(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

impl fmt::Display for ProbeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut => f.write_str("timed out"),
            Self::Unreachable(msg) => write!(f, "unreachable: {}", msg),
        }
    }
}

/// HEAD-then-GET status checker
///
/// HEAD is sent without following redirects so that a redirect back to the
/// same page (for example one that only drops a tracking parameter) can be
/// recognized and reported as 200. Servers that reject HEAD (400, 403, 405)
/// or fail it outright get a GET that follows redirects.
#[derive(Debug, Clone)]
pub struct LinkChecker {
    head_client: Client,
    get_client: Client,
    normalizer: UrlNormalizer,
    head_timeout: Duration,
    get_timeout: Duration,
    batch_size: usize,
    batch_delay: Duration,
    retry: RetryPolicy,
}

impl LinkChecker {
    /// Creates a checker from the `[health]` and `[user-agent]` sections
    pub fn new(
        user_agent: &UserAgentConfig,
        config: &HealthConfig,
        normalizer: UrlNormalizer,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            head_client: build_http_client(user_agent, false)?,
            get_client: build_http_client(user_agent, true)?,
            normalizer,
            head_timeout: Duration::from_millis(config.head_timeout),
            get_timeout: Duration::from_millis(config.get_timeout),
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay),
            retry: RetryPolicy::none(),
        })
    }

    /// Retries the GET fallback on connection failures
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Resolves the live status of one URL; never fails
    pub async fn check_status(&self, url: &str) -> LinkStatus {
        match self.head(url).await {
            Ok(Some(status)) => return status,
            Ok(None) => trace!("HEAD not usable for {}, falling back to GET", url),
            Err(e) => trace!("HEAD failed for {}: {}", url, e),
        }

        let result = run_with_retry(&self.retry, ProbeFailure::is_transient, || self.get(url)).await;
        match result {
            Ok(status) => status,
            Err(ProbeFailure::TimedOut) => LinkStatus::TimedOut,
            Err(ProbeFailure::Unreachable(msg)) => {
                debug!("{} is unreachable: {}", url, msg);
                LinkStatus::Unreachable
            }
        }
    }

    /// `Ok(None)` means the server rejected HEAD
    async fn head(&self, url: &str) -> Result<Option<LinkStatus>, ProbeFailure> {
        let response = self
            .head_client
            .head(url)
            .timeout(self.head_timeout)
            .send()
            .await
            .map_err(|e| ProbeFailure::from_reqwest(&e))?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN | StatusCode::METHOD_NOT_ALLOWED
        ) {
            return Ok(None);
        }

        if matches!(
            status,
            StatusCode::MOVED_PERMANENTLY
                | StatusCode::FOUND
                | StatusCode::TEMPORARY_REDIRECT
                | StatusCode::PERMANENT_REDIRECT
        ) {
            let location = response
                .headers()
                .get(header::LOCATION)
                .and_then(|v| v.to_str().ok());
            if let Some(location) = location {
                if self.is_self_redirect(url, location) {
                    return Ok(Some(LinkStatus::Http(200)));
                }
            }
        }

        Ok(Some(LinkStatus::Http(status.as_u16())))
    }

    async fn get(&self, url: &str) -> Result<LinkStatus, ProbeFailure> {
        let response = self
            .get_client
            .get(url)
            .timeout(self.get_timeout)
            .header(
                header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| ProbeFailure::from_reqwest(&e))?;
        Ok(LinkStatus::Http(response.status().as_u16()))
    }

    /// True when `location`, resolved against `url`, normalizes back to `url`
    fn is_self_redirect(&self, url: &str, location: &str) -> bool {
        let Ok(base) = Url::parse(url) else {
            return false;
        };
        match (
            self.normalizer.key(location, Some(&base)),
            self.normalizer.key(url, None),
        ) {
            (Some(target), Some(original)) => target == original,
            _ => false,
        }
    }

    /// Checks URLs in fixed-size concurrent batches with a pause between them
    ///
    /// `on_batch(checked, total)` is called after every batch.
    pub async fn check_batch<F>(&self, urls: &[String], mut on_batch: F) -> HashMap<String, LinkStatus>
    where
        F: FnMut(usize, usize),
    {
        let total = urls.len();
        let mut results = HashMap::with_capacity(total);
        let mut checked = 0;

        for (i, batch) in urls.chunks(self.batch_size).enumerate() {
            let statuses = join_all(batch.iter().map(|url| async move {
                (url.clone(), self.check_status(url).await)
            }))
            .await;

            checked += batch.len();
            results.extend(statuses);
            on_batch(checked, total);

            if (i + 1) * self.batch_size < total && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        results
    }

    /// Checks the first `limit` distinct internal targets of a page and
    /// records their status on every matching link
    pub async fn sample_links(&self, links: &mut [LinkRecord], limit: usize) {
        let mut seen = HashSet::new();
        let targets: Vec<String> = links
            .iter()
            .filter(|l| !l.is_external)
            .filter(|l| seen.insert(l.href.clone()))
            .take(limit)
            .map(|l| l.href.clone())
            .collect();
        if targets.is_empty() {
            return;
        }

        let statuses = self.check_batch(&targets, |_, _| {}).await;
        for link in links.iter_mut() {
            if let Some(status) = statuses.get(&link.href) {
                link.http_status = Some(status.code());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> LinkChecker {
        LinkChecker::new(
            &UserAgentConfig::default(),
            &HealthConfig::default(),
            UrlNormalizer::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_verdicts() {
        assert_eq!(LinkStatus::Http(200).verdict(true), HealthVerdict::Healthy);
        assert_eq!(LinkStatus::Http(308).verdict(true), HealthVerdict::Redirect);
        assert_eq!(LinkStatus::Http(404).verdict(true), HealthVerdict::Broken);
        assert_eq!(LinkStatus::Http(503).verdict(true), HealthVerdict::Broken);
        assert_eq!(LinkStatus::Http(401).verdict(true), HealthVerdict::Inconclusive);
        assert_eq!(LinkStatus::Http(429).verdict(true), HealthVerdict::Inconclusive);
        assert_eq!(LinkStatus::TimedOut.verdict(false), HealthVerdict::Inconclusive);
        assert_eq!(LinkStatus::Unreachable.verdict(true), HealthVerdict::Broken);
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(LinkStatus::Http(301).code(), 301);
        assert_eq!(LinkStatus::TimedOut.code(), TIMEOUT_STATUS);
        assert_eq!(LinkStatus::Unreachable.code(), UNREACHABLE_STATUS);
    }

    #[test]
    fn test_self_redirect_detection() {
        let c = checker();
        assert!(c.is_self_redirect(
            "https://example.com/page?utm_source=news",
            "/page"
        ));
        assert!(c.is_self_redirect("https://example.com/page", "https://example.com/page/"));
        assert!(!c.is_self_redirect("https://example.com/old", "/new"));
        assert!(!c.is_self_redirect("https://example.com/", "https://www.example.com/"));
    }
}
