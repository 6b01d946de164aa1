/*!
 * Shutdown Tests
 * Interruption, exactly-once release and the shutdown report
 */

use crate::support::{recorded, waiting_pids};
use memsim_kernel::{
    Dispatcher, EventKind, ExitReason, KernelConfig, MemoryPool, ProcessError, ShutdownReport,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_shutdown_interrupts_running_workers() {
    let (dispatcher, sink) = recorded(KernelConfig::default());

    let a = dispatcher.submit("A", 300, 100).unwrap();
    let b = dispatcher.submit("B", 300, 100).unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    let report = dispatcher.shutdown().await;
    assert_eq!(
        report,
        ShutdownReport {
            completed: 0,
            interrupted: 2,
            abandoned: 0
        }
    );
    assert_eq!(dispatcher.available(), 1024);
    assert!(dispatcher.running_snapshot().is_empty());

    let mut interrupted = sink.pids_where(|k| {
        matches!(k, EventKind::Finished { reason: ExitReason::Interrupted })
    });
    interrupted.sort_unstable();
    assert_eq!(interrupted, vec![a, b]);
}

#[tokio::test(start_paused = true)]
async fn test_memory_released_exactly_once() {
    let pool = Arc::new(MemoryPool::new(1024));
    // Held outside the dispatcher so a double release would show up
    // instead of being clamped at the total
    let outside = pool.reserve(200).unwrap();

    let dispatcher = Dispatcher::builder()
        .with_pool(Arc::clone(&pool))
        .start()
        .unwrap();
    dispatcher.submit("Short", 300, 2).unwrap();
    dispatcher.submit("Long", 400, 60).unwrap();
    assert_eq!(pool.available(), 124);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(pool.available(), 424);

    let report = dispatcher.shutdown().await;
    assert_eq!(report.completed, 1);
    assert_eq!(report.interrupted, 1);
    assert_eq!(pool.available(), 824);

    // A second shutdown has nothing left to release
    let again = dispatcher.shutdown().await;
    assert_eq!(again.abandoned, 0);
    assert_eq!(pool.available(), 824);

    assert_eq!(outside.release(), 200);
    assert_eq!(pool.available(), 1024);
}

#[tokio::test(start_paused = true)]
async fn test_waiting_records_are_abandoned() {
    let (dispatcher, sink) = recorded(KernelConfig::default());

    dispatcher.submit("Holder", 1000, 30).unwrap();
    let q1 = dispatcher.submit("Q1", 500, 5).unwrap();
    let q2 = dispatcher.submit("Q2", 50, 5).unwrap();
    assert_eq!(waiting_pids(&dispatcher), vec![q1, q2]);

    let report = dispatcher.shutdown().await;
    assert_eq!(report.abandoned, 2);
    assert_eq!(report.interrupted, 1);
    assert!(dispatcher.waiting_snapshot().is_empty());
    assert_eq!(dispatcher.available(), 1024);

    let abandoned = sink.pids_where(|k| matches!(k, EventKind::Abandoned));
    assert_eq!(abandoned, vec![q1, q2]);
    // Abandoned records never ran
    let admitted = sink.pids_where(|k| matches!(k, EventKind::Admitted { .. }));
    assert!(!admitted.contains(&q1));
    assert!(!admitted.contains(&q2));
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_signal_and_rejection() {
    let dispatcher = Dispatcher::start(KernelConfig::default()).unwrap();
    let mut signal = dispatcher.shutdown_signal();
    assert!(!*signal.borrow());
    assert!(dispatcher.is_accepting());

    let waiter = {
        let dispatcher = dispatcher.clone();
        tokio::spawn(async move { dispatcher.shutdown().await })
    };
    signal.wait_for(|stop| *stop).await.unwrap();

    assert!(!dispatcher.is_accepting());
    assert_eq!(
        dispatcher.submit("late", 10, 1),
        Err(ProcessError::ShuttingDown)
    );
    assert_eq!(waiter.await.unwrap(), ShutdownReport::default());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_shutdown_calls() {
    let dispatcher = Dispatcher::start(KernelConfig::default()).unwrap();
    dispatcher.submit("A", 100, 50).unwrap();
    dispatcher.submit("B", 100, 50).unwrap();

    let (first, second) = tokio::join!(dispatcher.shutdown(), dispatcher.shutdown());

    assert_eq!(first.interrupted, 2);
    assert_eq!(second.interrupted, 2);
    assert_eq!(dispatcher.available(), 1024);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_runtime_work_still_releases() {
    let pool = Arc::new(MemoryPool::new(512));
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap();

    // Runtime teardown drops every worker future without running it to
    // completion; cleanup must still hand the memory back.
    std::thread::spawn({
        let pool = Arc::clone(&pool);
        move || {
            rt.block_on(async {
                let dispatcher = Dispatcher::builder().with_pool(pool).start().unwrap();
                dispatcher.submit("A", 200, 100).unwrap();
                dispatcher.submit("B", 300, 100).unwrap();
                tokio::time::sleep(Duration::from_secs(1)).await;
            });
            drop(rt);
        }
    })
    .join()
    .unwrap();

    assert_eq!(pool.available(), 512);
}
