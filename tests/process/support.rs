/*!
 * Shared helpers for dispatcher tests
 */

#![allow(dead_code)]

use memsim_kernel::{Dispatcher, Event, EventKind, EventSink, KernelConfig};
use parking_lot::Mutex;
use std::sync::Arc;

/// Event sink that keeps everything it receives
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// PIDs of events matching `pred`, in emission order
    pub fn pids_where(&self, pred: impl Fn(&EventKind) -> bool) -> Vec<u32> {
        self.events
            .lock()
            .iter()
            .filter(|e| pred(&e.kind))
            .filter_map(|e| e.pid)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: Event) {
        self.events.lock().push(event);
    }
}

/// Dispatcher with a recording sink attached
pub fn recorded(config: KernelConfig) -> (Dispatcher, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let dispatcher = Dispatcher::builder()
        .with_config(config)
        .with_event_sink(sink.clone())
        .start()
        .expect("dispatcher starts inside a runtime");
    (dispatcher, sink)
}

/// Memory conservation as seen through one consistent snapshot
pub fn assert_conserved(dispatcher: &Dispatcher) {
    let snapshot = dispatcher.snapshot();
    assert_eq!(
        snapshot.memory.available_mb + snapshot.running_memory_mb(),
        snapshot.memory.total_mb,
        "available + running memory must equal total"
    );
    assert!(snapshot.memory.used_mb <= snapshot.memory.total_mb);
}

pub fn running_pids(dispatcher: &Dispatcher) -> Vec<u32> {
    dispatcher.running_snapshot().iter().map(|p| p.pid).collect()
}

pub fn waiting_pids(dispatcher: &Dispatcher) -> Vec<u32> {
    dispatcher.waiting_snapshot().iter().map(|p| p.pid).collect()
}
