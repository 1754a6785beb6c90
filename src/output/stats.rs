//! Console summaries
//!
//! Plain `println!` rendering of crawl, search, health and sitemap results
//! for the command line.

use crate::crawler::{CrawlSummary, ErrorEntry};
use crate::health::HealthReport;
use crate::index::{FindingType, SearchResults};
use crate::sitemap::SitemapReport;
use crate::storage::IndexEntry;
use std::collections::BTreeMap;

/// Lines shown per list before truncating
const MAX_LISTED: usize = 20;

fn percentage(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

fn print_truncated<T: AsRef<str>>(items: &[T]) {
    for item in items.iter().take(MAX_LISTED) {
        println!("  - {}", item.as_ref());
    }
    if items.len() > MAX_LISTED {
        println!("  ... and {} more", items.len() - MAX_LISTED);
    }
}

/// Prints the end-of-job summary of an index build
pub fn print_crawl_summary(summary: &CrawlSummary, errors: &[ErrorEntry]) {
    println!("=== Index Summary: {} ===\n", summary.domain);
    println!("  Final state: {}", summary.state);
    println!("  Pages indexed: {}", summary.total_pages);
    println!("  Links recorded: {}", summary.total_links);
    println!("  Live findings: {}", summary.findings);
    println!("  Duration: {:.1}s", summary.duration_ms as f64 / 1000.0);
    println!();

    if !errors.is_empty() {
        println!("Failed Pages ({}):", errors.len());
        let lines: Vec<String> = errors
            .iter()
            .map(|e| format!("{}: {}", e.url, e.message))
            .collect();
        print_truncated(&lines);
        println!();
    }
}

/// Prints search findings grouped by source page
pub fn print_search_results(results: &SearchResults) {
    println!("=== Search Results: {} ===\n", results.domain);
    if let Some(pattern) = &results.pattern {
        println!("  Pattern: {}", pattern);
    }
    println!("  Mode: {}", results.mode);
    println!("  Pages searched: {}", results.total_pages_searched);
    println!("  Findings: {}", results.findings.len());
    println!();

    let mut by_page: BTreeMap<&str, Vec<_>> = BTreeMap::new();
    for finding in &results.findings {
        by_page.entry(finding.source_page.as_str()).or_default().push(finding);
    }

    for (page, findings) in by_page {
        println!("{}", page);
        for f in findings {
            match f.finding_type {
                FindingType::CrossLocale => println!(
                    "  [{} -> {}] \"{}\" -> {}",
                    f.source_locale, f.target_locale, f.anchor_text, f.linked_to
                ),
                FindingType::PatternMatch => {
                    println!("  \"{}\" -> {}", f.anchor_text, f.linked_to)
                }
            }
        }
    }
}

/// Prints the outcome of a health check
pub fn print_health_report(report: &HealthReport) {
    println!("=== Link Health ===\n");
    println!("  Unique internal links: {}", report.total_unique_links);
    println!(
        "  Checked: {} ({:.1}%)",
        report.checked_count,
        percentage(report.checked_count, report.total_unique_links)
    );
    println!("  Healthy: {}", report.healthy);
    println!("  Inconclusive: {}", report.inconclusive);
    println!("  Broken: {}", report.broken.len());
    println!("  Redirects: {}", report.redirects.len());
    println!("  Cross-locale: {}", report.cross_locale.len());
    println!();

    if !report.broken.is_empty() {
        println!("Broken Links:");
        let lines: Vec<String> = report
            .broken
            .iter()
            .map(|i| format!("[{}] {} (on {})", i.status, i.target_url, i.source_url))
            .collect();
        print_truncated(&lines);
        println!();
    }
}

/// Prints a sitemap reconciliation
pub fn print_sitemap_report(report: &SitemapReport) {
    println!("=== Sitemap Comparison ===\n");
    println!("  Sitemap: {}", report.sitemap_url);
    println!("  Locale scope: {}", report.locale_filter);
    println!(
        "  Sitemap URLs: {} in scope ({} total)",
        report.sitemap_count, report.sitemap_total_count
    );
    println!("  Indexed pages: {}", report.indexed_count);
    println!(
        "  In both: {} ({:.1}% of sitemap)",
        report.in_both,
        percentage(report.in_both, report.sitemap_count)
    );
    println!();

    if !report.missing_from_index.is_empty() {
        println!("Missing From Index ({}):", report.missing_from_index.len());
        print_truncated(&report.missing_from_index);
        println!();
    }
    if !report.extra_in_index.is_empty() {
        println!("Not In Sitemap ({}):", report.extra_in_index.len());
        print_truncated(&report.extra_in_index);
        println!();
    }
}

/// Prints the saved indexes
pub fn print_index_list(entries: &[IndexEntry]) {
    if entries.is_empty() {
        println!("No saved indexes.");
        return;
    }
    println!("=== Saved Indexes ({}) ===\n", entries.len());
    for entry in entries {
        println!(
            "  {} [{}] {} pages, {} links, {} KB, created {}",
            entry.domain,
            entry.locale_filter.as_deref().unwrap_or("full"),
            entry.total_pages,
            entry.total_links,
            entry.file_size / 1024,
            entry.created_at.format("%Y-%m-%d %H:%M")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(4, 4), 100.0);
    }
}
