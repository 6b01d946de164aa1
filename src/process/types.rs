/*!
 * Process Types
 * Process records, lifecycle states and errors
 */

use crate::core::types::{Megabytes, Pid};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Process operation result
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Process errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ProcessError {
    #[error("Invalid request: {field} must be positive (got {value})")]
    #[diagnostic(
        code(process::invalid_request),
        help("Both memory and duration must be at least 1.")
    )]
    InvalidRequest { field: &'static str, value: u64 },

    #[error("Capacity exceeded: requested {requested} MB, pool holds {total} MB")]
    #[diagnostic(
        code(process::capacity_exceeded),
        help("The request could never be admitted. Lower its memory requirement.")
    )]
    CapacityExceeded { requested: Megabytes, total: Megabytes },

    #[error("Invalid state transition for PID {pid}: {from:?} -> {to:?}")]
    #[diagnostic(code(process::invalid_state_transition))]
    InvalidStateTransition {
        pid: Pid,
        from: ProcessState,
        to: ProcessState,
    },

    #[error("PID space exhausted")]
    #[diagnostic(code(process::pid_exhausted))]
    PidExhausted,

    #[error("Dispatcher is shutting down")]
    #[diagnostic(
        code(process::shutting_down),
        help("No new processes are accepted after shutdown has begun.")
    )]
    ShuttingDown,

    #[error("No Tokio runtime available to run workers")]
    #[diagnostic(
        code(process::no_runtime),
        help("Start the dispatcher from inside a Tokio runtime.")
    )]
    RuntimeUnavailable,
}

/// Process state
///
/// Transitions are monotonic: Queued -> Running -> Finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Waiting for memory
    Queued,
    /// Memory reserved, simulated run in progress
    Running,
    /// Memory released; terminal
    Finished,
}

impl ProcessState {
    #[inline]
    #[must_use]
    pub const fn can_transition_to(self, next: ProcessState) -> bool {
        matches!(
            (self, next),
            (ProcessState::Queued, ProcessState::Running)
                | (ProcessState::Running, ProcessState::Finished)
        )
    }
}

/// How a record got admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionPath {
    /// Memory was available at submission
    Submit,
    /// Admitted from the head of the waiting queue
    Queue,
}

/// Why a worker stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Ran for its full duration
    Completed,
    /// Stopped early by shutdown, abort, or panic
    Interrupted,
}

/// A simulated process
///
/// `pid`, `name`, `memory_mb` and `duration` are fixed at creation.
#[derive(Debug, Clone)]
pub struct ProcessRecord {
    pid: Pid,
    name: String,
    memory_mb: Megabytes,
    duration: Duration,
    state: ProcessState,
    started_at: Option<Instant>,
}

impl ProcessRecord {
    #[must_use]
    pub fn new(pid: Pid, name: String, memory_mb: Megabytes, duration: Duration) -> Self {
        Self {
            pid,
            name,
            memory_mb,
            duration,
            state: ProcessState::Queued,
            started_at: None,
        }
    }

    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn memory_mb(&self) -> Megabytes {
        self.memory_mb
    }

    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    #[inline]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    #[inline]
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Time spent running, zero until admitted
    pub fn elapsed(&self) -> Duration {
        self.started_at
            .map(|started| started.elapsed())
            .unwrap_or_default()
    }

    /// Queued -> Running, stamping the start time
    pub fn admit(&mut self, now: Instant) -> ProcessResult<()> {
        self.transition(ProcessState::Running)?;
        self.started_at = Some(now);
        Ok(())
    }

    /// Running -> Finished
    pub fn finish(&mut self) -> ProcessResult<()> {
        self.transition(ProcessState::Finished)
    }

    fn transition(&mut self, next: ProcessState) -> ProcessResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(ProcessError::InvalidStateTransition {
                pid: self.pid,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

impl std::fmt::Display for ProcessRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "PID: {} | Name: {} | Memory: {} MB | Duration: {}s",
            self.pid,
            self.name,
            self.memory_mb,
            self.duration.as_secs()
        )
    }
}
