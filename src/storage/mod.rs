//! Storage module for persisting indexes and health reports
//!
//! This module handles everything the crawler writes to disk:
//! - One JSON file per (domain, locale scope) index
//! - One JSON file per saved health report
//! - Listings with the metadata needed to pick an index or report

mod json;
mod traits;

pub use json::{index_filename, JsonIndexStore, JsonReportStore};
pub use traits::{IndexStore, ReportStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One line of an index listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub filename: String,
    pub domain: String,
    pub locale_filter: Option<String>,
    pub total_pages: usize,
    pub total_links: usize,
    pub created_at: DateTime<Utc>,
    /// Size of the index file in bytes
    pub file_size: u64,
}
