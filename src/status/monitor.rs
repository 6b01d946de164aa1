/*!
 * Status Monitor
 *
 * Periodically redraws the status panel from dispatcher snapshots.
 * Read-only: it never mutates dispatcher state, and it stops on its own
 * once the dispatcher begins shutting down.
 */

use super::render::render;
use crate::monitoring::RecentEvents;
use crate::process::Dispatcher;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const CLEAR_SCREEN: &str = "\u{1B}[H\u{1B}[2J";

/// Handle to the status refresh task
pub struct StatusMonitor {
    handle: JoinHandle<()>,
}

impl StatusMonitor {
    /// Spawn on the current runtime; must be called from inside one
    pub fn spawn(dispatcher: Dispatcher, events: Arc<RecentEvents>, period: Duration) -> Self {
        let handle = tokio::spawn(run_status_loop(dispatcher, events, period));
        Self { handle }
    }

    /// Wait for the monitor to stop
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Status monitor stopped abnormally");
        }
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

async fn run_status_loop(dispatcher: Dispatcher, events: Arc<RecentEvents>, period: Duration) {
    let mut shutdown = dispatcher.shutdown_signal();
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    debug!(period_ms = period.as_millis() as u64, "Status monitor started");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let panel = render(&dispatcher.snapshot(), &events.snapshot());
                let mut stdout = std::io::stdout().lock();
                let written = write!(stdout, "{CLEAR_SCREEN}{panel}").and_then(|_| stdout.flush());
                if let Err(e) = written {
                    warn!(error = %e, "Status monitor cannot write to stdout");
                    break;
                }
            }

            _ = shutdown.wait_for(|stop| *stop) => {
                debug!("Status monitor stopping");
                break;
            }
        }
    }
}
