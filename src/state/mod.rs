//! State module for tracking crawl job progress
//!
//! # Components
//!
//! - `JobState`: The run state of a crawl job (idle, running, paused, stopping, completed, failed)

mod job_state;

pub use job_state::JobState;
