//! Link health: live status checks, report aggregation and triage

mod checker;
mod report;
mod run;

pub use checker::{HealthVerdict, LinkChecker, LinkStatus, TIMEOUT_STATUS, UNREACHABLE_STATUS};
pub use report::{
    site_name, CrossLocaleIssue, HealthReport, IssueStats, IssueStatus, LinkIssue, ReportSummary,
    SavedReport, Tracked, TrackedReport,
};
pub use run::{build_report, recorded_statuses, run_health_check, HealthCheckOptions};
