/*!
 * Dispatcher Snapshots
 * Read-only, point-in-time copies of dispatcher state for display
 */

use super::types::ProcessRecord;
use crate::core::types::{Megabytes, Pid};
use crate::memory::MemoryStats;
use serde::Serialize;

/// An admitted process as seen by the status view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunningProcess {
    pub pid: Pid,
    pub name: String,
    pub memory_mb: Megabytes,
    pub duration_secs: u64,
    pub elapsed_secs: u64,
    pub remaining_secs: u64,
}

impl From<&ProcessRecord> for RunningProcess {
    fn from(record: &ProcessRecord) -> Self {
        let duration_secs = record.duration().as_secs();
        let elapsed_secs = record.elapsed().as_secs();
        Self {
            pid: record.pid(),
            name: record.name().to_string(),
            memory_mb: record.memory_mb(),
            duration_secs,
            elapsed_secs,
            remaining_secs: duration_secs.saturating_sub(elapsed_secs),
        }
    }
}

/// A queued process as seen by the status view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitingProcess {
    pub pid: Pid,
    pub name: String,
    pub memory_mb: Megabytes,
}

impl From<&ProcessRecord> for WaitingProcess {
    fn from(record: &ProcessRecord) -> Self {
        Self {
            pid: record.pid(),
            name: record.name().to_string(),
            memory_mb: record.memory_mb(),
        }
    }
}

/// Memory and both process lists captured under one lock
///
/// `running` is ordered by PID, `waiting` by arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub memory: MemoryStats,
    pub running: Vec<RunningProcess>,
    pub waiting: Vec<WaitingProcess>,
}

impl SystemSnapshot {
    /// Sum of memory held by running processes
    pub fn running_memory_mb(&self) -> Megabytes {
        self.running.iter().map(|p| p.memory_mb).sum()
    }
}
