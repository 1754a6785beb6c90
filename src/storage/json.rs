//! JSON file storage
//!
//! Indexes live in `<index-dir>/<domain_with_underscores>[_<locale>].json`,
//! reports in `<report-dir>/<report id>.json`. Files are written to a
//! temporary sibling first and renamed into place.

use crate::health::{ReportSummary, SavedReport};
use crate::index::{Index, IndexMetadata};
use crate::storage::traits::{IndexStore, ReportStore, StorageError, StorageResult};
use crate::storage::IndexEntry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the index for a domain and optional locale scope
///
/// # Examples
///
/// ```
/// use locale_spider::storage::index_filename;
///
/// assert_eq!(index_filename("www.example.com", None), "www_example_com.json");
/// assert_eq!(index_filename("example.com", Some("de")), "example_com_de.json");
/// ```
pub fn index_filename(domain: &str, locale_filter: Option<&str>) -> String {
    let base = domain.trim().to_lowercase().replace('.', "_");
    match locale_filter.map(str::trim).filter(|l| !l.is_empty()) {
        Some(locale) => format!("{}_{}.json", base, locale.to_lowercase()),
        None => format!("{}.json", base),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn remove(path: &Path) -> StorageResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// `.json` files of a directory; a missing directory is empty
fn json_files(dir: &Path) -> StorageResult<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().map_or(false, |ext| ext == "json") {
            files.push(path);
        }
    }
    Ok(files)
}

/// Index files on the local filesystem
#[derive(Debug, Clone)]
pub struct JsonIndexStore {
    dir: PathBuf,
}

impl JsonIndexStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, domain: &str, locale_filter: Option<&str>) -> PathBuf {
        self.dir.join(index_filename(domain, locale_filter))
    }
}

/// Reads only the metadata of an index file
#[derive(Deserialize)]
struct MetadataOnly {
    metadata: IndexMetadata,
}

impl IndexStore for JsonIndexStore {
    fn save_index(&self, index: &Index) -> StorageResult<String> {
        let path = self.path_for(&index.metadata.domain, index.metadata.locale_filter.as_deref());
        write_json(&path, index)?;
        debug!("Saved index to {}", path.display());
        Ok(path.display().to_string())
    }

    fn load_index(&self, domain: &str, locale_filter: Option<&str>) -> StorageResult<Option<Index>> {
        read_json(&self.path_for(domain, locale_filter))
    }

    fn list_indexes(&self) -> StorageResult<Vec<IndexEntry>> {
        let mut entries = Vec::new();
        for path in json_files(&self.dir)? {
            let meta = match read_json::<MetadataOnly>(&path) {
                Ok(Some(m)) => m.metadata,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Skipping unreadable index {}: {}", path.display(), e);
                    continue;
                }
            };
            entries.push(IndexEntry {
                filename: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                domain: meta.domain,
                locale_filter: meta.locale_filter,
                total_pages: meta.total_pages,
                total_links: meta.total_links,
                created_at: meta.created_at,
                file_size: fs::metadata(&path)?.len(),
            });
        }
        entries.sort_by(|a, b| a.filename.cmp(&b.filename));
        Ok(entries)
    }

    fn delete_index(&self, domain: &str, locale_filter: Option<&str>) -> StorageResult<bool> {
        remove(&self.path_for(domain, locale_filter))
    }
}

/// Saved health reports on the local filesystem
#[derive(Debug, Clone)]
pub struct JsonReportStore {
    dir: PathBuf,
}

impl JsonReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> StorageResult<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(StorageError::NotFound(format!("report {}", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

impl ReportStore for JsonReportStore {
    fn save_report(&self, report: &SavedReport) -> StorageResult<()> {
        write_json(&self.path_for(&report.id)?, report)
    }

    fn load_report(&self, id: &str) -> StorageResult<Option<SavedReport>> {
        read_json(&self.path_for(id)?)
    }

    fn list_reports(&self) -> StorageResult<Vec<ReportSummary>> {
        let mut reports: Vec<ReportSummary> = json_files(&self.dir)?
            .iter()
            .filter_map(|path| match read_json::<SavedReport>(path) {
                Ok(report) => report.map(|r| r.summary()),
                Err(e) => {
                    warn!("Skipping unreadable report {}: {}", path.display(), e);
                    None
                }
            })
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    fn delete_report(&self, id: &str) -> StorageResult<bool> {
        remove(&self.path_for(id)?)
    }
}
