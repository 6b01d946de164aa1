/*!
 * Event System
 * Dispatcher events and the sink interface observers implement
 */

use crate::core::types::{Megabytes, Pid};
use crate::process::{AdmissionPath, ExitReason};
use serde::Serialize;
use std::fmt;
use std::time::SystemTime;

/// What happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// Memory reserved, worker started
    Admitted { via: AdmissionPath },
    /// Not enough memory; appended to the waiting queue
    Queued { available_mb: Megabytes },
    /// Submission refused before a PID was assigned
    Rejected { reason: String },
    /// Worker done, memory released
    Finished { reason: ExitReason },
    /// Discarded from the waiting queue at shutdown
    Abandoned,
}

/// A single dispatcher event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub timestamp: SystemTime,
    pub pid: Option<Pid>,
    pub name: String,
    pub memory_mb: Megabytes,
    pub kind: EventKind,
}

impl Event {
    pub fn new(
        pid: Option<Pid>,
        name: impl Into<String>,
        memory_mb: Megabytes,
        kind: EventKind,
    ) -> Self {
        Self {
            timestamp: SystemTime::now(),
            pid,
            name: name.into(),
            memory_mb,
            kind,
        }
    }

    /// Seconds since the Unix epoch, for compact display
    pub fn unix_secs(&self) -> u64 {
        self.timestamp
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let pid = self
            .pid
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());

        match &self.kind {
            EventKind::Admitted { via: AdmissionPath::Submit } => {
                write!(f, "Process {} (PID: {}) started.", self.name, pid)
            }
            EventKind::Admitted { via: AdmissionPath::Queue } => {
                write!(f, "Process {} (PID: {}) moved from queue to running.", self.name, pid)
            }
            EventKind::Queued { available_mb } => write!(
                f,
                "Not enough memory ({} MB free). Process {} (PID: {}) queued.",
                available_mb, self.name, pid
            ),
            EventKind::Rejected { reason } => {
                write!(f, "Process {} rejected: {}", self.name, reason)
            }
            EventKind::Finished { reason: ExitReason::Completed } => {
                write!(f, "Process {} (PID: {}) finished, memory released.", self.name, pid)
            }
            EventKind::Finished { reason: ExitReason::Interrupted } => {
                write!(f, "Process {} (PID: {}) interrupted, memory released.", self.name, pid)
            }
            EventKind::Abandoned => {
                write!(f, "Process {} (PID: {}) dropped from queue.", self.name, pid)
            }
        }
    }
}

/// Receiver of dispatcher events
///
/// Never called with the process table locked, but emission is serialized
/// per lifecycle step; implementations must not block or call back into the
/// dispatcher.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

impl<F> EventSink for F
where
    F: Fn(Event) + Send + Sync,
{
    fn emit(&self, event: Event) {
        self(event)
    }
}
