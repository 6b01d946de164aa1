/*!
 * PID Allocation
 * Monotonic process identifiers, never reused
 */

use super::types::{ProcessError, ProcessResult};
use crate::core::types::Pid;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug)]
pub struct PidAllocator {
    next: AtomicU32,
}

impl PidAllocator {
    pub fn new(base: Pid) -> Self {
        Self {
            next: AtomicU32::new(base),
        }
    }

    /// Hand out the next PID
    pub fn allocate(&self) -> ProcessResult<Pid> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |pid| pid.checked_add(1))
            .map_err(|_| ProcessError::PidExhausted)
    }
}
