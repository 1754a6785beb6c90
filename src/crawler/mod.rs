//! Crawl engine
//!
//! This module contains the concurrent crawl machinery:
//! - Rendering capability (engine and session traits, HTTP-backed default)
//! - Page extraction with bounded navigation retries
//! - The frontier (queue plus queued and visited sets)
//! - The worker pool and its job control handle
//! - Observer notifications for progress, logs and findings

pub mod control;
pub mod extractor;
pub mod frontier;
pub mod observer;
pub mod pool;
pub mod render;
pub mod retry;

pub use control::{JobHandle, JobSlot};
pub use extractor::{ExtractedPage, PageExtractor};
pub use frontier::{EnqueueOutcome, Frontier};
pub use observer::{CrawlObserver, CrawlSummary, ErrorEntry, LogLevel, NoopObserver, Progress};
pub use pool::{CrawlOptions, CrawlOutcome, WorkerPool};
pub use render::{
    build_http_client, parse_document, DomSnapshot, HttpRenderEngine, HttpSession, RawAnchor,
    RenderEngine, RenderError, RenderSession, ResourceKind,
};
pub use retry::{run_with_retry, RetryPolicy};
