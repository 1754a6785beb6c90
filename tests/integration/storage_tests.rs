//! JSON index and report stores on a temporary directory

use chrono::Utc;
use locale_spider::health::{HealthReport, IssueStatus, LinkIssue, SavedReport};
use locale_spider::index::{Index, PageRecord};
use locale_spider::storage::{IndexStore, JsonIndexStore, JsonReportStore, ReportStore, StorageError};
use locale_spider::Locale;
use tempfile::TempDir;

fn sample_index(locale_filter: Option<&str>) -> Index {
    let mut index = Index::new(
        "www.example.com",
        "https://www.example.com/",
        locale_filter.map(str::to_string),
        Utc::now(),
    );
    index.insert_page(
        "https://www.example.com/",
        PageRecord {
            title: "Home".to_string(),
            locale: Locale::Default,
            indexed_at: Utc::now(),
            links: Vec::new(),
        },
    );
    index.recount();
    index
}

#[test]
fn test_index_store_lifecycle() {
    let dir = TempDir::new().unwrap();
    let store = JsonIndexStore::new(dir.path());

    let full = sample_index(None);
    let german = sample_index(Some("de"));
    let full_path = store.save_index(&full).unwrap();
    store.save_index(&german).unwrap();
    assert!(full_path.ends_with("www_example_com.json"));

    let loaded = store.load_index("www.example.com", None).unwrap().unwrap();
    assert_eq!(loaded, full);
    assert!(store.load_index("www.example.com", Some("fr")).unwrap().is_none());

    let mut entries = store.list_indexes().unwrap();
    entries.sort_by(|a, b| a.filename.cmp(&b.filename));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].locale_filter.as_deref(), Some("de"));
    assert_eq!(entries[0].total_pages, 1);
    assert!(entries[0].file_size > 0);

    assert!(store.delete_index("www.example.com", Some("de")).unwrap());
    assert!(!store.delete_index("www.example.com", Some("de")).unwrap());
    assert_eq!(store.list_indexes().unwrap().len(), 1);
}

#[test]
fn test_report_store_triage() {
    let dir = TempDir::new().unwrap();
    let store = JsonReportStore::new(dir.path());

    let report = HealthReport {
        broken: vec![LinkIssue {
            source_url: "https://example.com/".to_string(),
            target_url: "https://example.com/gone".to_string(),
            anchor_text: "Gone".to_string(),
            status: 404,
            occurrences: 1,
        }],
        healthy: 3,
        checked_count: 4,
        total_unique_links: 4,
        ..HealthReport::default()
    };
    let saved = SavedReport::new("example.com", None, report, Utc::now());
    store.save_report(&saved).unwrap();

    let issue_id = saved.report.broken[0].id.clone();
    let updated = store
        .update_issue(
            &saved.id,
            &issue_id,
            Some(IssueStatus::Fixed),
            Some("redirect added".to_string()),
        )
        .unwrap();
    assert_eq!(updated.issue_stats.fixed, 1);
    assert_eq!(updated.issue_stats.pending, 0);

    let reloaded = store.load_report(&saved.id).unwrap().unwrap();
    assert_eq!(reloaded.report.broken[0].notes, "redirect added");

    let listed = store.list_reports().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].broken, 1);

    let missing = store.update_issue(&saved.id, "nope", Some(IssueStatus::Fixed), None);
    assert!(matches!(missing, Err(StorageError::NotFound(_))));

    assert!(store.delete_report(&saved.id).unwrap());
    assert!(store.load_report(&saved.id).unwrap().is_none());
}
