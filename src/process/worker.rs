/*!
 * Execution Worker
 *
 * One Tokio task per admitted process. The worker sleeps for the process
 * duration unless shutdown is signalled, then hands its reservation back.
 *
 * Cleanup lives in [`Completion`]'s `Drop`, so it runs exactly once whether
 * the sleep finishes, shutdown interrupts it, or the task is aborted.
 */

use super::dispatcher::DispatcherCore;
use super::types::{ExitReason, ProcessRecord};
use crate::core::types::Pid;
use crate::memory::Reservation;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tracing::debug;

/// Releases memory and retires the record when dropped
pub(crate) struct Completion {
    core: Arc<DispatcherCore>,
    pid: Pid,
    reservation: Option<Reservation>,
    reason: ExitReason,
}

impl Completion {
    pub(crate) fn new(core: Arc<DispatcherCore>, pid: Pid, reservation: Reservation) -> Self {
        Self {
            core,
            pid,
            reservation: Some(reservation),
            // Anything short of a full run counts as an interruption
            reason: ExitReason::Interrupted,
        }
    }

    fn complete(mut self, reason: ExitReason) {
        self.reason = reason;
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.core
            .finish(self.pid, self.reservation.take(), self.reason);
    }
}

/// Simulated execution of one admitted process
pub struct ExecutionWorker {
    pid: Pid,
    duration: Duration,
    shutdown: watch::Receiver<bool>,
    completion: Completion,
}

impl ExecutionWorker {
    pub(crate) fn new(
        record: &ProcessRecord,
        reservation: Reservation,
        core: Arc<DispatcherCore>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            pid: record.pid(),
            duration: record.duration(),
            shutdown,
            completion: Completion::new(core, record.pid(), reservation),
        }
    }

    /// Run until the duration elapses or shutdown is signalled
    pub async fn run(self) -> ExitReason {
        let ExecutionWorker {
            pid,
            duration,
            mut shutdown,
            completion,
        } = self;

        debug!(pid, duration_secs = duration.as_secs(), "Worker started");

        let reason = tokio::select! {
            _ = tokio::time::sleep(duration) => ExitReason::Completed,
            _ = shutdown.wait_for(|stop| *stop) => ExitReason::Interrupted,
        };

        completion.complete(reason);
        reason
    }
}

/// Counts live workers so shutdown can wait for all of them
#[derive(Debug, Default)]
pub(crate) struct WorkerSet {
    active: AtomicUsize,
    idle: Notify,
    // Serializes the last-exit notification against waiters registering
    gate: Mutex<()>,
}

impl WorkerSet {
    pub(crate) fn enter(&self) {
        self.active.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn exit(&self) {
        let _gate = self.gate.lock();
        if self.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    pub(crate) fn active(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) async fn wait_idle(&self) {
        loop {
            let notified = {
                let _gate = self.gate.lock();
                if self.active() == 0 {
                    return;
                }
                self.idle.notified()
            };
            notified.await;
        }
    }
}
