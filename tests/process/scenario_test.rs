/*!
 * Scenario Tests
 * Full workload timelines on virtual time
 */

use crate::support::{assert_conserved, recorded, running_pids, waiting_pids};
use memsim_kernel::{AdmissionPath, EventKind, ExitReason, KernelConfig, ShutdownReport};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

fn at(start: Instant, millis: u64) -> Instant {
    start + Duration::from_millis(millis)
}

#[tokio::test(start_paused = true)]
async fn test_reference_workload_timeline() {
    let start = Instant::now();
    let (dispatcher, sink) = recorded(KernelConfig::default());

    let browser = dispatcher.submit("Browser", 350, 10).unwrap();
    let editor = dispatcher.submit("Editor", 250, 15).unwrap();
    assert_eq!(dispatcher.available(), 424);

    let game = dispatcher.submit("Game", 700, 20).unwrap();
    assert_eq!(waiting_pids(&dispatcher), vec![game]);

    let music = dispatcher.submit("Music", 100, 5).unwrap();
    assert_eq!(dispatcher.available(), 324);
    assert_eq!(running_pids(&dispatcher), vec![browser, editor, music]);
    assert_conserved(&dispatcher);

    // Music done; 424 free is still short of Game's 700
    sleep_until(at(start, 5_500)).await;
    assert_eq!(dispatcher.available(), 424);
    assert_eq!(waiting_pids(&dispatcher), vec![game]);
    assert_eq!(running_pids(&dispatcher), vec![browser, editor]);
    assert_conserved(&dispatcher);

    // Browser done, Game fits in 774 and is admitted
    sleep_until(at(start, 10_500)).await;
    assert!(waiting_pids(&dispatcher).is_empty());
    assert_eq!(dispatcher.available(), 74);
    let running = dispatcher.running_snapshot();
    assert_eq!(running.iter().map(|p| p.pid).collect::<Vec<_>>(), vec![editor, game]);
    let game_view = &running[1];
    assert_eq!(game_view.elapsed_secs, 0);
    assert_eq!(game_view.remaining_secs, 20);
    assert_conserved(&dispatcher);

    sleep_until(at(start, 15_500)).await;
    assert_eq!(dispatcher.available(), 324);
    assert_eq!(running_pids(&dispatcher), vec![game]);

    sleep_until(at(start, 30_500)).await;
    assert_eq!(dispatcher.available(), 1024);
    assert!(dispatcher.snapshot().running.is_empty());

    let finished = sink.pids_where(|k| {
        matches!(k, EventKind::Finished { reason: ExitReason::Completed })
    });
    assert_eq!(finished, vec![music, browser, editor, game]);
    let queued_admits =
        sink.pids_where(|k| matches!(k, EventKind::Admitted { via: AdmissionPath::Queue }));
    assert_eq!(queued_admits, vec![game]);

    let report = dispatcher.shutdown().await;
    assert_eq!(
        report,
        ShutdownReport {
            completed: 4,
            interrupted: 0,
            abandoned: 0
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_event_order_for_single_process() {
    let start = Instant::now();
    let (dispatcher, sink) = recorded(KernelConfig::default());

    dispatcher.submit("Holder", 1000, 2).unwrap();
    let pid = dispatcher.submit("Late", 100, 1).unwrap();

    sleep_until(at(start, 3_500)).await;

    let kinds: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|e| e.pid == Some(pid))
        .map(|e| e.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            EventKind::Queued { available_mb: 24 },
            EventKind::Admitted {
                via: AdmissionPath::Queue
            },
            EventKind::Finished {
                reason: ExitReason::Completed
            },
        ]
    );

    dispatcher.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_waiter_runs_after_holder_finishes() {
    let start = Instant::now();
    let config = KernelConfig::default()
        .with_total_memory(500)
        .with_drain_interval(Duration::from_millis(250));
    let dispatcher = memsim_kernel::Dispatcher::start(config).unwrap();

    let holder = dispatcher.submit("Holder", 400, 1).unwrap();
    let waiter = dispatcher.submit("Waiter", 300, 1).unwrap();
    assert_eq!(running_pids(&dispatcher), vec![holder]);

    sleep_until(at(start, 1_300)).await;
    assert_eq!(running_pids(&dispatcher), vec![waiter]);
    assert_eq!(dispatcher.available(), 200);

    sleep_until(at(start, 2_500)).await;
    assert_eq!(dispatcher.available(), 500);

    dispatcher.shutdown().await;
}
