/// Run state definitions for crawl jobs
///
/// A job moves `Idle -> Running`, may bounce between `Running` and `Paused`,
/// and ends in `Completed` or `Failed`, possibly through `Stopping`.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current run state of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Created but not started
    Idle,

    /// Workers are pulling from the frontier
    Running,

    /// Workers block at their next loop boundary until resumed or stopped
    Paused,

    /// Stop was requested; in-flight pages are allowed to finish
    Stopping,

    /// Frontier drained, budget hit, or stop honoured
    Completed,

    /// The job could not start or the rendering engine failed
    Failed,
}

impl JobState {
    /// Returns true once the job can make no further progress
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true while workers should keep pulling pages
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Returns true if moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Idle, Running) | (Idle, Failed) => true,
            (Running, Paused) | (Paused, Running) => true,
            (Running | Paused, Stopping) => true,
            (Running | Paused | Stopping, Completed | Failed) => true,
            _ => false,
        }
    }

    /// Converts the state to its persisted string form
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Stopping => "stopping",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a state from its persisted string form
    ///
    /// Returns None if the string doesn't match any known state.
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "running" => Some(Self::Running),
            "paused" => Some(Self::Paused),
            "stopping" => Some(Self::Stopping),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobState; 6] = [
        JobState::Idle,
        JobState::Running,
        JobState::Paused,
        JobState::Stopping,
        JobState::Completed,
        JobState::Failed,
    ];

    #[test]
    fn test_is_terminal() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(!JobState::Stopping.is_terminal());
    }

    #[test]
    fn test_pause_resume_transitions() {
        assert!(JobState::Running.can_transition_to(JobState::Paused));
        assert!(JobState::Paused.can_transition_to(JobState::Running));
        assert!(JobState::Paused.can_transition_to(JobState::Stopping));
        assert!(!JobState::Idle.can_transition_to(JobState::Paused));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in ALL {
            assert!(!JobState::Completed.can_transition_to(next));
            assert!(!JobState::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_string_forms() {
        for state in ALL {
            assert_eq!(JobState::from_str_opt(state.as_str()), Some(state));
        }
        assert_eq!(JobState::from_str_opt("bogus"), None);
        assert_eq!(serde_json::to_string(&JobState::Stopping).unwrap(), "\"stopping\"");
    }
}
