//! Notifications emitted by a crawl job
//!
//! The core never assumes a transport: a CLI can print these, a server can
//! relay them over a socket, and tests can record them.

use crate::index::Finding;
use crate::state::JobState;
use serde::Serialize;
use tracing::{error, info, warn};

/// Severity of a user-facing log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Snapshot sent after each page is picked up
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current_url: String,
    pub pages_done: usize,
    pub queue_size: usize,
    pub findings_count: usize,
    pub links_found: usize,
    /// `None` when the page budget is unbounded
    pub max_pages: Option<usize>,
}

/// A page that could not be indexed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub url: String,
    pub message: String,
}

/// Final numbers of a crawl job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSummary {
    pub domain: String,
    pub state: JobState,
    pub total_pages: usize,
    pub total_links: usize,
    pub errors: usize,
    pub findings: usize,
    pub duration_ms: u64,
}

/// Receives job notifications; every method defaults to doing nothing
pub trait CrawlObserver: Send + Sync {
    fn on_progress(&self, _progress: &Progress) {}

    fn on_log(&self, _message: &str, _level: LogLevel) {}

    fn on_finding(&self, _finding: &Finding) {}

    fn on_complete(&self, _summary: &CrawlSummary) {}

    fn on_error(&self, _entry: &ErrorEntry) {}

    /// Called after each health-check batch
    fn on_health_progress(&self, _checked: usize, _total: usize) {}
}

/// Observer for callers that don't need notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CrawlObserver for NoopObserver {}

/// Writes a line to the tracing log and forwards it to the observer
pub(crate) fn emit_log(observer: &dyn CrawlObserver, level: LogLevel, message: &str) {
    match level {
        LogLevel::Info | LogLevel::Success => info!("{}", message),
        LogLevel::Warning => warn!("{}", message),
        LogLevel::Error => error!("{}", message),
    }
    observer.on_log(message, level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<(String, LogLevel)>>,
    }

    impl CrawlObserver for Recorder {
        fn on_log(&self, message: &str, level: LogLevel) {
            self.lines.lock().unwrap().push((message.to_string(), level));
        }
    }

    #[test]
    fn test_emit_log_forwards_to_observer() {
        let recorder = Recorder::default();
        emit_log(&recorder, LogLevel::Warning, "Retrying https://example.com/");
        let lines = recorder.lines.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].1, LogLevel::Warning);
    }

    #[test]
    fn test_noop_observer_accepts_everything() {
        let observer = NoopObserver;
        observer.on_log("x", LogLevel::Info);
        observer.on_error(&ErrorEntry {
            url: "https://example.com/".into(),
            message: "boom".into(),
        });
        observer.on_health_progress(1, 2);
    }
}
