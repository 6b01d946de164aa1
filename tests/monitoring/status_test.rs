/*!
 * Status View Tests
 */

use memsim_kernel::status::{render, usage_bar};
use memsim_kernel::{Dispatcher, KernelConfig, RecentEvents, StatusMonitor};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_panel_reflects_dispatcher_state() {
    let recent = Arc::new(RecentEvents::default());
    let dispatcher = Dispatcher::builder()
        .with_event_sink(recent.clone())
        .start()
        .unwrap();

    dispatcher.submit("Browser", 350, 10).unwrap();
    dispatcher.submit("Game", 900, 20).unwrap();

    let panel = render(&dispatcher.snapshot(), &recent.snapshot());
    assert!(panel.contains("RAM Total: 1024 MB | RAM Available: 674 MB"));
    assert!(panel.contains("RUNNING PROCESSES (1)"));
    assert!(panel.contains("- Browser (PID: 1000)"));
    assert!(panel.contains("Remaining: 10s"));
    assert!(panel.contains("WAITING QUEUE (1)"));
    assert!(panel.contains("- Game (PID: 1001) -> Memory required: 900 MB"));
    assert!(panel.contains("Process Game (PID: 1001) queued."));
    assert!(panel.contains(&usage_bar(350, 1024)));

    dispatcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_monitor_stops_with_dispatcher() {
    let dispatcher = Dispatcher::start(KernelConfig::default()).unwrap();
    let monitor = StatusMonitor::spawn(
        dispatcher.clone(),
        Arc::new(RecentEvents::default()),
        Duration::from_secs(2),
    );

    dispatcher.submit("Music", 100, 5).unwrap();
    tokio::time::sleep(Duration::from_secs(7)).await;

    dispatcher.shutdown().await;
    tokio::time::timeout(Duration::from_secs(1), monitor.join())
        .await
        .expect("monitor exits after shutdown");
}
