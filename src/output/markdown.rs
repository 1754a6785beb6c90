//! Markdown report generation
//!
//! This module renders saved health reports and search results as markdown
//! suitable for pasting into a ticket or committing next to a site.

use crate::health::{LinkIssue, SavedReport, Tracked};
use crate::index::{FindingType, SearchResults};
use crate::output::OutputResult;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Rows shown per issue table before truncating
const MAX_ROWS: usize = 100;

/// Writes the markdown rendering of a saved report to `output_path`
///
/// # Arguments
///
/// * `report` - The saved health report
/// * `output_path` - Path where the markdown file should be written
pub fn write_health_markdown(report: &SavedReport, output_path: &Path) -> OutputResult<()> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, format_health_markdown(report))?;
    Ok(())
}

/// Escapes characters that would break a table cell
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn link_table(md: &mut String, title: &str, issues: &[Tracked<LinkIssue>]) {
    if issues.is_empty() {
        return;
    }
    md.push_str(&format!("## {} ({})\n\n", title, issues.len()));
    md.push_str("| Status | Target | Found on | Anchor | Pages | Triage |\n");
    md.push_str("|--------|--------|----------|--------|-------|--------|\n");
    for t in issues.iter().take(MAX_ROWS) {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            t.issue.status,
            cell(&t.issue.target_url),
            cell(&t.issue.source_url),
            cell(&t.issue.anchor_text),
            t.issue.occurrences,
            t.issue_status.as_str()
        ));
    }
    if issues.len() > MAX_ROWS {
        md.push_str(&format!("\n... and {} more\n", issues.len() - MAX_ROWS));
    }
    md.push('\n');
}

/// Formats a saved health report as markdown
pub fn format_health_markdown(report: &SavedReport) -> String {
    let r = &report.report;
    let mut md = String::new();

    md.push_str(&format!("# Link Health Report: {}\n\n", report.site));
    md.push_str(&format!("- **Report ID**: {}\n", report.id));
    md.push_str(&format!("- **Locale scope**: {}\n", report.locale));
    md.push_str(&format!("- **Created**: {}\n\n", report.created_at.to_rfc3339()));

    md.push_str("## Overview\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Unique internal links | {} |\n", r.total_unique_links));
    md.push_str(&format!("| Checked | {} |\n", r.checked_count));
    md.push_str(&format!("| Healthy | {} |\n", r.healthy));
    md.push_str(&format!("| Inconclusive | {} |\n", r.inconclusive));
    md.push_str(&format!("| Broken | {} |\n", r.broken.len()));
    md.push_str(&format!("| Redirects | {} |\n", r.redirects.len()));
    md.push_str(&format!("| Cross-locale | {} |\n\n", r.cross_locale.len()));

    md.push_str(&format!(
        "Triage: {} pending, {} in progress, {} fixed\n\n",
        report.issue_stats.pending, report.issue_stats.in_progress, report.issue_stats.fixed
    ));

    link_table(&mut md, "Broken Links", &r.broken);
    link_table(&mut md, "Redirects", &r.redirects);

    if !r.cross_locale.is_empty() {
        md.push_str(&format!("## Cross-Locale Links ({})\n\n", r.cross_locale.len()));
        md.push_str("| From | To | Target | Found on | Anchor | Pages | Triage |\n");
        md.push_str("|------|----|--------|----------|--------|-------|--------|\n");
        for t in r.cross_locale.iter().take(MAX_ROWS) {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                t.issue.source_locale,
                t.issue.target_locale,
                cell(&t.issue.target_url),
                cell(&t.issue.source_url),
                cell(&t.issue.anchor_text),
                t.issue.occurrences,
                t.issue_status.as_str()
            ));
        }
        if r.cross_locale.len() > MAX_ROWS {
            md.push_str(&format!("\n... and {} more\n", r.cross_locale.len() - MAX_ROWS));
        }
        md.push('\n');
    }

    if r.broken.is_empty() && r.redirects.is_empty() && r.cross_locale.is_empty() {
        md.push_str("No issues found.\n");
    }

    md
}

/// Formats search results as markdown, grouped by source page
pub fn format_search_markdown(results: &SearchResults) -> String {
    let mut md = String::new();
    md.push_str(&format!("# Search Results: {}\n\n", results.domain));
    if let Some(pattern) = &results.pattern {
        md.push_str(&format!("- **Pattern**: `{}`\n", pattern));
    }
    md.push_str(&format!("- **Mode**: {}\n", results.mode));
    md.push_str(&format!("- **Pages searched**: {}\n", results.total_pages_searched));
    md.push_str(&format!("- **Findings**: {}\n\n", results.findings.len()));

    let mut by_page: BTreeMap<&str, Vec<_>> = BTreeMap::new();
    for finding in &results.findings {
        by_page.entry(finding.source_page.as_str()).or_default().push(finding);
    }

    for (page, findings) in by_page {
        md.push_str(&format!("## {}\n\n", page));
        for f in findings {
            let kind = match f.finding_type {
                FindingType::CrossLocale => {
                    format!("cross-locale {} -> {}", f.source_locale, f.target_locale)
                }
                FindingType::PatternMatch => "match".to_string(),
            };
            md.push_str(&format!("- [{}] \"{}\" -> {}\n", kind, cell(&f.anchor_text), f.linked_to));
        }
        md.push('\n');
    }

    md
}
