//! Health report data model
//!
//! `HealthReport` is rebuilt from scratch by every health-check run.
//! `SavedReport` is the persisted copy with per-issue triage state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn one() -> usize {
    1
}

/// A broken or redirecting link target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkIssue {
    /// First page the target was found on
    pub source_url: String,
    pub target_url: String,
    #[serde(alias = "linkText", default)]
    pub anchor_text: String,
    /// HTTP status (0 = unreachable, 408 = timed out)
    pub status: u16,
    /// Number of pages linking to the target
    #[serde(default = "one")]
    pub occurrences: usize,
}

/// A link that leaves its page's locale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossLocaleIssue {
    pub source_url: String,
    pub source_locale: String,
    pub target_url: String,
    pub target_locale: String,
    #[serde(alias = "linkText", default)]
    pub anchor_text: String,
    #[serde(default = "one")]
    pub occurrences: usize,
}

/// Aggregate link-health verdicts for one index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    #[serde(default)]
    pub broken: Vec<LinkIssue>,
    #[serde(default)]
    pub redirects: Vec<LinkIssue>,
    #[serde(default)]
    pub cross_locale: Vec<CrossLocaleIssue>,
    /// Count of targets judged healthy
    #[serde(default)]
    pub healthy: usize,
    /// Count of targets whose status proves nothing (e.g. 401, 429)
    #[serde(default)]
    pub inconclusive: usize,
    #[serde(default)]
    pub checked_count: usize,
    #[serde(default)]
    pub total_unique_links: usize,
}

impl HealthReport {
    /// Number of issues needing attention
    pub fn issue_count(&self) -> usize {
        self.broken.len() + self.redirects.len() + self.cross_locale.len()
    }
}

/// Triage state of a reported issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueStatus {
    Pending,
    InProgress,
    Fixed,
}

impl IssueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "inProgress",
            Self::Fixed => "fixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "inProgress" | "in-progress" | "in_progress" => Some(Self::InProgress),
            "fixed" => Some(Self::Fixed),
            _ => None,
        }
    }
}

/// An issue with a stable id and triage fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracked<T> {
    pub id: String,
    pub issue_status: IssueStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(flatten)]
    pub issue: T,
}

/// Issue counts per triage state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStats {
    pub pending: usize,
    pub in_progress: usize,
    pub fixed: usize,
}

impl IssueStats {
    fn slot(&mut self, status: IssueStatus) -> &mut usize {
        match status {
            IssueStatus::Pending => &mut self.pending,
            IssueStatus::InProgress => &mut self.in_progress,
            IssueStatus::Fixed => &mut self.fixed,
        }
    }

    fn transfer(&mut self, from: IssueStatus, to: IssueStatus) {
        if from == to {
            return;
        }
        let old = self.slot(from);
        *old = old.saturating_sub(1);
        *self.slot(to) += 1;
    }
}

/// The health report as persisted, with triage state per issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedReport {
    pub broken: Vec<Tracked<LinkIssue>>,
    pub redirects: Vec<Tracked<LinkIssue>>,
    pub cross_locale: Vec<Tracked<CrossLocaleIssue>>,
    pub healthy: usize,
    #[serde(default)]
    pub inconclusive: usize,
    pub checked_count: usize,
    pub total_unique_links: usize,
}

/// A saved health report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedReport {
    /// `{site}_{unix millis}`
    pub id: String,
    pub site: String,
    /// Locale scope of the index, or "full"
    pub locale: String,
    pub created_at: DateTime<Utc>,
    pub report: TrackedReport,
    pub issue_stats: IssueStats,
}

/// One line of a report listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: String,
    pub site: String,
    pub locale: String,
    pub created_at: DateTime<Utc>,
    pub broken: usize,
    pub redirects: usize,
    pub cross_locale: usize,
    pub healthy: usize,
    pub issue_stats: IssueStats,
}

impl SavedReport {
    /// Wraps a fresh health report; every issue starts out pending
    ///
    /// Issue ids are `{unix millis}_{position}`, numbered per category.
    pub fn new(site: &str, locale: Option<&str>, report: HealthReport, now: DateTime<Utc>) -> Self {
        let stamp = now.timestamp_millis();
        let site = site_name(site);

        fn track<T>(stamp: i64, issues: Vec<T>, offset: usize) -> Vec<Tracked<T>> {
            issues
                .into_iter()
                .enumerate()
                .map(|(idx, issue)| Tracked {
                    id: format!("{}_{}", stamp, offset + idx),
                    issue_status: IssueStatus::Pending,
                    notes: String::new(),
                    issue,
                })
                .collect()
        }

        // Offsets keep ids unique across the three categories
        let broken_len = report.broken.len();
        let redirects_len = report.redirects.len();
        let pending = report.issue_count();

        Self {
            id: format!("{}_{}", site, stamp),
            site,
            locale: locale.unwrap_or("full").to_string(),
            created_at: now,
            report: TrackedReport {
                broken: track(stamp, report.broken, 0),
                redirects: track(stamp, report.redirects, broken_len),
                cross_locale: track(stamp, report.cross_locale, broken_len + redirects_len),
                healthy: report.healthy,
                inconclusive: report.inconclusive,
                checked_count: report.checked_count,
                total_unique_links: report.total_unique_links,
            },
            issue_stats: IssueStats {
                pending,
                in_progress: 0,
                fixed: 0,
            },
        }
    }

    /// Updates the triage status and/or notes of one issue
    ///
    /// Returns false if no issue carries that id.
    pub fn update_issue(
        &mut self,
        issue_id: &str,
        status: Option<IssueStatus>,
        notes: Option<String>,
    ) -> bool {
        let found = self
            .report
            .broken
            .iter_mut()
            .chain(self.report.redirects.iter_mut())
            .map(|t| (&t.id, &mut t.issue_status, &mut t.notes))
            .chain(
                self.report
                    .cross_locale
                    .iter_mut()
                    .map(|t| (&t.id, &mut t.issue_status, &mut t.notes)),
            )
            .find(|(id, _, _)| id.as_str() == issue_id);

        let Some((_, current, current_notes)) = found else {
            return false;
        };

        let old = *current;
        if let Some(status) = status {
            *current = status;
        }
        if let Some(notes) = notes {
            *current_notes = notes;
        }
        let new = *current;
        self.issue_stats.transfer(old, new);
        true
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            id: self.id.clone(),
            site: self.site.clone(),
            locale: self.locale.clone(),
            created_at: self.created_at,
            broken: self.report.broken.len(),
            redirects: self.report.redirects.len(),
            cross_locale: self.report.cross_locale.len(),
            healthy: self.report.healthy,
            issue_stats: self.issue_stats,
        }
    }
}

/// Filesystem-friendly site name: host without `www.`, dots as underscores
///
/// # Examples
///
/// ```
/// use locale_spider::health::site_name;
///
/// assert_eq!(site_name("https://www.example.co.uk/de/"), "example_co_uk");
/// assert_eq!(site_name("shop.example.com"), "shop_example_com");
/// ```
pub fn site_name(url_or_host: &str) -> String {
    let host = url::Url::parse(url_or_host)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url_or_host.trim().to_string());
    host.strip_prefix("www.")
        .unwrap_or(&host)
        .replace('.', "_")
}
