//! Storage traits and error types
//!
//! The core needs only to persist and retrieve indexes and saved health
//! reports by name; these traits keep the storage medium swappable.

use crate::health::{IssueStatus, ReportSummary, SavedReport};
use crate::index::Index;
use crate::storage::IndexEntry;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence for site indexes, one per (domain, locale scope)
pub trait IndexStore {
    /// Writes the index, replacing any previous one for the same key; returns its location
    fn save_index(&self, index: &Index) -> StorageResult<String>;

    /// Loads the index for a domain and optional locale scope
    ///
    /// Returns `Ok(None)` when no such index exists.
    fn load_index(&self, domain: &str, locale_filter: Option<&str>) -> StorageResult<Option<Index>>;

    /// Lists stored indexes; unreadable files are skipped
    fn list_indexes(&self) -> StorageResult<Vec<IndexEntry>>;

    /// Removes an index; returns false if it did not exist
    fn delete_index(&self, domain: &str, locale_filter: Option<&str>) -> StorageResult<bool>;
}

/// Persistence for saved health reports
pub trait ReportStore {
    fn save_report(&self, report: &SavedReport) -> StorageResult<()>;

    fn load_report(&self, id: &str) -> StorageResult<Option<SavedReport>>;

    /// Report summaries, newest first
    fn list_reports(&self) -> StorageResult<Vec<ReportSummary>>;

    fn delete_report(&self, id: &str) -> StorageResult<bool>;

    /// Changes the triage state or notes of one issue and persists the report
    ///
    /// # Errors
    ///
    /// `NotFound` if the report or the issue does not exist.
    fn update_issue(
        &self,
        report_id: &str,
        issue_id: &str,
        status: Option<IssueStatus>,
        notes: Option<String>,
    ) -> StorageResult<SavedReport> {
        let mut report = self
            .load_report(report_id)?
            .ok_or_else(|| StorageError::NotFound(format!("report {}", report_id)))?;
        if !report.update_issue(issue_id, status, notes) {
            return Err(StorageError::NotFound(format!("issue {}", issue_id)));
        }
        self.save_report(&report)?;
        Ok(report)
    }
}
