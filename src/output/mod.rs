//! Output module for summaries and reports
//!
//! This module handles:
//! - Markdown export of saved health reports and search results
//! - Console summaries of crawls, searches, health checks and sitemap runs

mod markdown;
pub mod stats;

pub use markdown::{format_health_markdown, format_search_markdown, write_health_markdown};
pub use stats::{
    print_crawl_summary, print_health_report, print_index_list, print_search_results,
    print_sitemap_report,
};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
