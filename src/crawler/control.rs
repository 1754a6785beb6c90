//! External control of a running crawl job

use crate::state::JobState;
use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable handle for pausing, resuming and stopping a job
///
/// The run state lives in a `watch` channel: workers read it at each loop
/// boundary and block on it while paused. Stopping never aborts an in-flight
/// page; workers notice at their next boundary.
#[derive(Debug, Clone)]
pub struct JobHandle {
    state: Arc<watch::Sender<JobState>>,
}

impl Default for JobHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl JobHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(JobState::Idle);
        Self {
            state: Arc::new(tx),
        }
    }

    /// Current run state
    pub fn state(&self) -> JobState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state.subscribe()
    }

    /// Running -> Paused
    pub fn pause(&self) -> bool {
        self.transition(JobState::Paused)
    }

    /// Paused -> Running
    pub fn resume(&self) -> bool {
        self.state.send_if_modified(|state| {
            if *state == JobState::Paused {
                *state = JobState::Running;
                true
            } else {
                false
            }
        })
    }

    /// Requests a stop; a job that never started completes immediately
    pub fn stop(&self) -> bool {
        self.state.send_if_modified(|state| match *state {
            JobState::Running | JobState::Paused => {
                *state = JobState::Stopping;
                true
            }
            JobState::Idle => {
                *state = JobState::Completed;
                true
            }
            _ => false,
        })
    }

    /// Applies a transition if it is legal; returns whether it happened
    pub(crate) fn transition(&self, next: JobState) -> bool {
        self.state.send_if_modified(|state| {
            if state.can_transition_to(next) {
                *state = next;
                true
            } else {
                false
            }
        })
    }

    /// Blocks while the job is paused, then returns the state that ended the pause
    pub(crate) async fn wait_while_paused(&self) -> JobState {
        let mut rx = self.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            if current != JobState::Paused {
                return current;
            }
            if rx.changed().await.is_err() {
                return self.state();
            }
        }
    }
}

/// Owns at most one active job for a session
///
/// Starting a new job through the slot stops the one it replaces.
#[derive(Debug, Default)]
pub struct JobSlot {
    current: Option<JobHandle>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a fresh handle, stopping and returning the previous one
    pub fn start_new(&mut self) -> (JobHandle, Option<JobHandle>) {
        let previous = self.current.take();
        if let Some(prev) = &previous {
            if !prev.state().is_terminal() {
                prev.stop();
            }
        }
        let handle = JobHandle::new();
        self.current = Some(handle.clone());
        (handle, previous)
    }

    pub fn current(&self) -> Option<&JobHandle> {
        self.current.as_ref()
    }

    /// Stops and forgets the current job
    pub fn clear(&mut self) -> Option<JobHandle> {
        let previous = self.current.take();
        if let Some(prev) = &previous {
            prev.stop();
        }
        previous
    }
}
