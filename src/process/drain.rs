/*!
 * Drain Task - Waiting Queue Admission
 *
 * Background task that re-attempts admission for the head of the waiting
 * queue. It polls on a fixed interval and also wakes whenever a worker
 * releases memory, so queued processes start without waiting for the next
 * tick. Either way only the head is evaluated, so FIFO order is preserved.
 */

use super::dispatcher::DispatcherCore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, trace, warn};

/// Control messages for the drain task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainCommand {
    /// Run an admission pass immediately
    Trigger,
    /// Stop the task
    Shutdown,
}

/// Handle to the drain background task
pub struct DrainTask {
    command_tx: mpsc::UnboundedSender<DrainCommand>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl DrainTask {
    pub(crate) fn spawn(core: Arc<DispatcherCore>, interval: Duration) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let handle = core
            .runtime()
            .clone()
            .spawn(run_drain_loop(core, interval, command_rx));

        info!(interval_ms = interval.as_millis() as u64, "Drain task spawned");

        Self {
            command_tx,
            handle: Some(handle),
        }
    }

    /// Trigger an immediate admission pass
    pub fn trigger(&self) {
        let _ = self.command_tx.send(DrainCommand::Trigger);
    }

    /// Shutdown the drain task gracefully
    pub async fn shutdown(mut self) {
        let _ = self.command_tx.send(DrainCommand::Shutdown);

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Drain task shutdown error");
            } else {
                info!("Drain task shutdown complete");
            }
        }
    }
}

async fn run_drain_loop(
    core: Arc<DispatcherCore>,
    period: Duration,
    mut command_rx: mpsc::UnboundedReceiver<DrainCommand>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let admitted = core.drain_waiting();
                if admitted > 0 {
                    trace!(admitted, "Drain tick admitted queued processes");
                }
            }

            _ = core.released() => {
                let admitted = core.drain_waiting();
                if admitted > 0 {
                    trace!(admitted, "Release wakeup admitted queued processes");
                }
            }

            cmd = command_rx.recv() => {
                match cmd {
                    Some(DrainCommand::Trigger) => {
                        core.drain_waiting();
                    }
                    Some(DrainCommand::Shutdown) | None => {
                        info!("Drain task shutting down");
                        break;
                    }
                }
            }
        }
    }
}

impl Drop for DrainTask {
    fn drop(&mut self) {
        if self.handle.is_some() {
            let _ = self.command_tx.send(DrainCommand::Shutdown);
        }
    }
}
