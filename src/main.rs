/*!
 * Memory Admission Simulator - Main Entry Point
 *
 * Boots the dispatcher, draws the live status panel and feeds it a small
 * demo workload. Press Ctrl+C to shut down.
 */

use memsim_kernel::{
    init_tracing, Dispatcher, KernelConfig, KernelResult, RecentEvents, StatusMonitor,
};
use miette::IntoDiagnostic;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Demo processes: (name, memory MB, duration s, pause before next)
const DEMO_WORKLOAD: &[(&str, u64, u64, Duration)] = &[
    ("Web Browser", 350, 10, Duration::ZERO),
    ("Code Editor", 250, 15, Duration::from_secs(1)),
    ("Game", 700, 20, Duration::from_secs(1)),
    ("Music Player", 100, 5, Duration::ZERO),
];

/// Lets the status panel draw once before the first submission
const WORKLOAD_START_DELAY: Duration = Duration::from_secs(2);

async fn run_demo_workload(dispatcher: Dispatcher) {
    tokio::time::sleep(WORKLOAD_START_DELAY).await;

    for (name, memory_mb, duration_secs, pause) in DEMO_WORKLOAD {
        match dispatcher.submit(*name, *memory_mb, *duration_secs) {
            Ok(pid) => info!(pid, name, "Demo process submitted"),
            Err(e) => warn!(name, error = %e, "Demo process rejected"),
        }
        tokio::time::sleep(*pause).await;
    }
}

/// Load configuration and start the dispatcher with a recent-events sink
fn boot() -> KernelResult<(Dispatcher, Arc<RecentEvents>)> {
    let config = KernelConfig::from_env()?;
    let events = Arc::new(RecentEvents::with_capacity(config.recent_events));

    let dispatcher = Dispatcher::builder()
        .with_config(config)
        .with_event_sink(events.clone())
        .start()?;

    Ok((dispatcher, events))
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    init_tracing();

    info!("Memory admission simulator starting...");

    let (dispatcher, events) = boot()?;

    let status_interval = dispatcher.config().status_interval;
    let monitor = StatusMonitor::spawn(dispatcher.clone(), events, status_interval);
    let workload = tokio::spawn(run_demo_workload(dispatcher.clone()));

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await.into_diagnostic()?;

    info!("Interrupt received, shutting down");
    workload.abort();
    let report = dispatcher.shutdown().await;
    monitor.join().await;

    match serde_json::to_string(&report) {
        Ok(json) => info!(%report, report_json = %json, "Simulator stopped"),
        Err(e) => warn!(%report, error = %e, "Simulator stopped; report not serializable"),
    }
    Ok(())
}
