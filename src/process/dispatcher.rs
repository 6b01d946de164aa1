/*!
 * Dispatcher
 *
 * Admission control over a bounded memory pool.
 *
 * A submission reserves memory immediately when it can and starts a worker;
 * otherwise it joins the FIFO waiting queue. The drain task only ever looks
 * at the head of that queue, so a large head blocks everything behind it.
 *
 * # Locking
 *
 * The waiting queue and the admitted set live behind one mutex. Every move
 * between them, every reservation made on their behalf, and every release
 * at completion happens under that lock, so a record is never in both
 * collections or lost between them, and snapshots always satisfy
 * `available + running memory == total`. The lock is never held across
 * an `.await`; workers are spawned and events emitted only after it is
 * dropped.
 *
 * Events for one PID reach the sink in lifecycle order. A path that moves a
 * record takes the emit-order lock before dropping the table lock and emits
 * while holding it, so a queued record's `Queued` event always precedes the
 * `Admitted` or `Abandoned` that follows it.
 */

use super::drain::DrainTask;
use super::pid::PidAllocator;
use super::snapshot::{RunningProcess, SystemSnapshot, WaitingProcess};
use super::types::{AdmissionPath, ExitReason, ProcessError, ProcessRecord, ProcessResult};
use super::worker::{ExecutionWorker, WorkerSet};
use crate::core::config::{KernelConfig, OversizePolicy};
use crate::core::types::KernelResult;
use crate::core::types::{Megabytes, Pid};
use crate::memory::{MemoryPool, MemoryStats, Reservation};
use crate::monitoring::{Event, EventKind, EventSink};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Waiting queue and admitted set
#[derive(Debug, Default)]
struct ProcessTable {
    waiting: VecDeque<ProcessRecord>,
    admitted: BTreeMap<Pid, ProcessRecord>,
}

/// An admitted record whose worker has not been spawned yet
struct Admission {
    event: Event,
    worker: ExecutionWorker,
    span: tracing::Span,
}

/// Totals reported when the dispatcher shuts down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ShutdownReport {
    /// Workers that ran their full duration
    pub completed: u64,
    /// Workers stopped early
    pub interrupted: u64,
    /// Waiting records discarded without ever running
    pub abandoned: u64,
}

impl fmt::Display for ShutdownReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} completed, {} interrupted, {} abandoned",
            self.completed, self.interrupted, self.abandoned
        )
    }
}

/// State shared by the dispatcher handle, the drain task and every worker
pub(crate) struct DispatcherCore {
    config: KernelConfig,
    pool: Arc<MemoryPool>,
    table: Mutex<ProcessTable>,
    pids: PidAllocator,
    events: Option<Arc<dyn EventSink>>,
    // Acquired under `table`; orders event emission across submit, drain and shutdown
    emit_order: Mutex<()>,
    runtime: Handle,
    released: Notify,
    accepting: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    workers: WorkerSet,
    completed: AtomicU64,
    interrupted: AtomicU64,
}

impl DispatcherCore {
    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Resolves after the next memory release (or immediately if one was missed)
    pub(crate) async fn released(&self) {
        self.released.notified().await
    }

    fn emit(&self, event: Event) {
        if let Some(ref sink) = self.events {
            sink.emit(event);
        }
    }

    fn submit(
        self: &Arc<Self>,
        name: String,
        memory_mb: Megabytes,
        duration_secs: u64,
    ) -> ProcessResult<Pid> {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(ProcessError::ShuttingDown);
        }

        if memory_mb == 0 {
            warn!(name = %name, "Rejected submission with zero memory");
            return Err(ProcessError::InvalidRequest {
                field: "memory_mb",
                value: memory_mb,
            });
        }
        if duration_secs == 0 {
            warn!(name = %name, "Rejected submission with zero duration");
            return Err(ProcessError::InvalidRequest {
                field: "duration_secs",
                value: duration_secs,
            });
        }

        let total = self.pool.total();
        if memory_mb > total {
            match self.config.oversize_policy {
                OversizePolicy::Reject => {
                    let err = ProcessError::CapacityExceeded {
                        requested: memory_mb,
                        total,
                    };
                    warn!(
                        name = %name,
                        memory_mb,
                        total_mb = total,
                        "Rejected request larger than the pool"
                    );
                    self.emit(Event::new(
                        None,
                        name,
                        memory_mb,
                        EventKind::Rejected {
                            reason: err.to_string(),
                        },
                    ));
                    return Err(err);
                }
                OversizePolicy::Enqueue => {
                    warn!(
                        name = %name,
                        memory_mb,
                        total_mb = total,
                        "Request exceeds pool capacity; it will block the queue indefinitely"
                    );
                }
            }
        }

        let pid = self.pids.allocate()?;
        let record = ProcessRecord::new(pid, name, memory_mb, Duration::from_secs(duration_secs));

        let mut table = self.table.lock();
        if !self.accepting.load(Ordering::Acquire) {
            return Err(ProcessError::ShuttingDown);
        }

        match self.pool.reserve(memory_mb) {
            Ok(reservation) => {
                let admission =
                    self.admit_locked(&mut table, record, reservation, AdmissionPath::Submit)?;
                drop(table);
                self.launch(admission);
            }
            Err(err) => {
                let available_mb = self.pool.available();
                debug!(pid, error = %err, "Reservation failed at submission");
                info!(
                    pid,
                    name = %record.name(),
                    memory_mb,
                    available_mb,
                    queue_len = table.waiting.len() + 1,
                    "Not enough memory - process queued"
                );
                let event = Event::new(
                    Some(pid),
                    record.name(),
                    memory_mb,
                    EventKind::Queued { available_mb },
                );
                table.waiting.push_back(record);
                let _ordered = self.emit_order.lock();
                drop(table);
                self.emit(event);
            }
        }

        Ok(pid)
    }

    /// Move a record into the admitted set and prepare its worker
    ///
    /// Caller holds the table lock and has already reserved the memory. The
    /// worker is counted here but spawned by [`launch`](Self::launch) after
    /// the lock is dropped.
    fn admit_locked(
        self: &Arc<Self>,
        table: &mut ProcessTable,
        mut record: ProcessRecord,
        reservation: Reservation,
        via: AdmissionPath,
    ) -> ProcessResult<Admission> {
        record.admit(Instant::now())?;

        let pid = record.pid();
        let span = info_span!("worker", pid, name = %record.name());
        let worker = ExecutionWorker::new(
            &record,
            reservation,
            Arc::clone(self),
            self.shutdown_tx.subscribe(),
        );

        info!(
            pid,
            name = %record.name(),
            memory_mb = record.memory_mb(),
            duration_secs = record.duration().as_secs(),
            available_mb = self.pool.available(),
            via = ?via,
            "Process admitted"
        );
        let event = Event::new(
            Some(pid),
            record.name(),
            record.memory_mb(),
            EventKind::Admitted { via },
        );

        table.admitted.insert(pid, record);
        self.workers.enter();

        Ok(Admission {
            event,
            worker,
            span,
        })
    }

    /// Emit the admission, then spawn its worker
    ///
    /// The event goes out first so a fast worker's `Finished` cannot
    /// overtake it.
    fn launch(&self, admission: Admission) {
        let Admission {
            event,
            worker,
            span,
        } = admission;
        self.emit(event);
        self.spawn_worker(worker, span);
    }

    fn spawn_worker(&self, worker: ExecutionWorker, span: tracing::Span) {
        self.runtime.spawn(worker.run().instrument(span));
    }

    /// Admit from the head of the waiting queue until the head does not fit
    pub(crate) fn drain_waiting(self: &Arc<Self>) -> usize {
        let mut admissions = Vec::new();
        let ordered = {
            let mut table = self.table.lock();
            if !self.accepting.load(Ordering::Acquire) {
                return 0;
            }

            while let Some(required) = table.waiting.front().map(ProcessRecord::memory_mb) {
                let reservation = match self.pool.reserve(required) {
                    Ok(reservation) => reservation,
                    Err(_) => break,
                };
                let Some(record) = table.waiting.pop_front() else {
                    break;
                };
                match self.admit_locked(&mut table, record, reservation, AdmissionPath::Queue) {
                    Ok(admission) => admissions.push(admission),
                    Err(e) => error!(error = %e, "Failed to admit queued process"),
                }
            }
            self.emit_order.lock()
        };

        // Spawning outside the emit-order lock: a worker dropped during
        // runtime teardown runs its cleanup inline, and that takes `table`
        let mut workers = Vec::with_capacity(admissions.len());
        for Admission {
            event,
            worker,
            span,
        } in admissions
        {
            self.emit(event);
            workers.push((worker, span));
        }
        drop(ordered);

        let count = workers.len();
        for (worker, span) in workers {
            self.spawn_worker(worker, span);
        }
        count
    }

    /// Worker cleanup: retire the record and return its memory
    pub(crate) fn finish(&self, pid: Pid, reservation: Option<Reservation>, reason: ExitReason) {
        let record = {
            let mut table = self.table.lock();
            let record = table.admitted.remove(&pid);
            if let Some(reservation) = reservation {
                reservation.release();
            }
            record
        };

        match reason {
            ExitReason::Completed => self.completed.fetch_add(1, Ordering::Relaxed),
            ExitReason::Interrupted => self.interrupted.fetch_add(1, Ordering::Relaxed),
        };

        match record {
            Some(mut record) => {
                if let Err(e) = record.finish() {
                    error!(pid, error = %e, "Unexpected state at completion");
                }
                let available_mb = self.pool.available();
                match reason {
                    ExitReason::Completed => info!(
                        pid,
                        name = %record.name(),
                        memory_mb = record.memory_mb(),
                        available_mb,
                        "Process finished, memory released"
                    ),
                    ExitReason::Interrupted => warn!(
                        pid,
                        name = %record.name(),
                        memory_mb = record.memory_mb(),
                        elapsed_secs = record.elapsed().as_secs(),
                        available_mb,
                        "Process interrupted, memory released"
                    ),
                }
                self.emit(Event::new(
                    Some(pid),
                    record.name(),
                    record.memory_mb(),
                    EventKind::Finished { reason },
                ));
            }
            None => error!(pid, "Finished process missing from admitted set"),
        }

        self.released.notify_one();
        self.workers.exit();
    }

    fn running_snapshot(&self) -> Vec<RunningProcess> {
        self.table
            .lock()
            .admitted
            .values()
            .map(RunningProcess::from)
            .collect()
    }

    fn waiting_snapshot(&self) -> Vec<WaitingProcess> {
        self.table
            .lock()
            .waiting
            .iter()
            .map(WaitingProcess::from)
            .collect()
    }

    fn snapshot(&self) -> SystemSnapshot {
        let table = self.table.lock();
        SystemSnapshot {
            memory: self.pool.stats(),
            running: table.admitted.values().map(RunningProcess::from).collect(),
            waiting: table.waiting.iter().map(WaitingProcess::from).collect(),
        }
    }
}

/// Builder for [`Dispatcher`]
pub struct DispatcherBuilder {
    config: KernelConfig,
    pool: Option<Arc<MemoryPool>>,
    events: Option<Arc<dyn EventSink>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            config: KernelConfig::default(),
            pool: None,
            events: None,
        }
    }

    pub fn with_config(mut self, config: KernelConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing pool instead of creating one from the config
    pub fn with_pool(mut self, pool: Arc<MemoryPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = Some(sink);
        self
    }

    /// Start the dispatcher and its drain task on the current Tokio runtime
    ///
    /// The config is validated first, after a shared pool's capacity has
    /// replaced `total_memory_mb`.
    pub fn start(self) -> KernelResult<Dispatcher> {
        let mut config = self.config;
        if let Some(ref pool) = self.pool {
            config.total_memory_mb = pool.total();
        }
        config.validate()?;

        let runtime = Handle::try_current().map_err(|_| ProcessError::RuntimeUnavailable)?;
        let pool = match self.pool {
            Some(pool) => pool,
            None => Arc::new(MemoryPool::new(config.total_memory_mb)),
        };
        let (shutdown_tx, _) = watch::channel(false);

        let core = Arc::new(DispatcherCore {
            pids: PidAllocator::new(config.pid_base),
            config,
            pool,
            table: Mutex::new(ProcessTable::default()),
            events: self.events,
            emit_order: Mutex::new(()),
            runtime,
            released: Notify::new(),
            accepting: AtomicBool::new(true),
            shutdown_tx,
            workers: WorkerSet::default(),
            completed: AtomicU64::new(0),
            interrupted: AtomicU64::new(0),
        });

        let drain = DrainTask::spawn(Arc::clone(&core), core.config.drain_interval);

        info!(
            total_mb = core.pool.total(),
            pid_base = core.config.pid_base,
            drain_interval_ms = core.config.drain_interval.as_millis() as u64,
            oversize_policy = ?core.config.oversize_policy,
            "Dispatcher started"
        );

        Ok(Dispatcher {
            core,
            drain: Arc::new(Mutex::new(Some(drain))),
        })
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to the admission engine
///
/// Cheap to clone; all clones share the same pool, queue and workers.
#[derive(Clone)]
pub struct Dispatcher {
    core: Arc<DispatcherCore>,
    drain: Arc<Mutex<Option<DrainTask>>>,
}

impl Dispatcher {
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Start with `config` and no event sink
    pub fn start(config: KernelConfig) -> KernelResult<Self> {
        Self::builder().with_config(config).start()
    }

    /// Submit a process; never blocks
    ///
    /// Returns the new PID whether the process was admitted or queued.
    pub fn submit(
        &self,
        name: impl Into<String>,
        memory_mb: Megabytes,
        duration_secs: u64,
    ) -> ProcessResult<Pid> {
        self.core.submit(name.into(), memory_mb, duration_secs)
    }

    /// Run an admission pass now instead of waiting for the next poll
    pub fn trigger_drain(&self) {
        if let Some(ref task) = *self.drain.lock() {
            task.trigger();
        }
    }

    #[inline]
    pub fn available(&self) -> Megabytes {
        self.core.pool.available()
    }

    #[inline]
    pub fn used(&self) -> Megabytes {
        self.core.pool.used()
    }

    #[inline]
    pub fn total(&self) -> Megabytes {
        self.core.pool.total()
    }

    pub fn memory_stats(&self) -> MemoryStats {
        self.core.pool.stats()
    }

    pub fn config(&self) -> &KernelConfig {
        &self.core.config
    }

    /// Admitted processes ordered by PID
    pub fn running_snapshot(&self) -> Vec<RunningProcess> {
        self.core.running_snapshot()
    }

    /// Waiting processes in arrival order
    pub fn waiting_snapshot(&self) -> Vec<WaitingProcess> {
        self.core.waiting_snapshot()
    }

    /// Memory and both lists, captured together
    pub fn snapshot(&self) -> SystemSnapshot {
        self.core.snapshot()
    }

    pub fn is_accepting(&self) -> bool {
        self.core.accepting.load(Ordering::Acquire)
    }

    /// Flips to `true` once shutdown begins
    pub fn shutdown_signal(&self) -> watch::Receiver<bool> {
        self.core.shutdown_tx.subscribe()
    }

    /// Stop admitting, interrupt every worker and wait for their cleanup
    ///
    /// Waiting records are discarded. Safe to call more than once.
    pub async fn shutdown(&self) -> ShutdownReport {
        let drain = self.drain.lock().take();
        if let Some(task) = drain {
            task.shutdown().await;
        }

        let (abandoned, ordered) = {
            let mut table = self.core.table.lock();
            self.core.accepting.store(false, Ordering::Release);
            let abandoned = table.waiting.drain(..).collect::<Vec<_>>();
            (abandoned, self.core.emit_order.lock())
        };
        for record in &abandoned {
            info!(
                pid = record.pid(),
                name = %record.name(),
                "Queued process abandoned at shutdown"
            );
            self.core.emit(Event::new(
                Some(record.pid()),
                record.name(),
                record.memory_mb(),
                EventKind::Abandoned,
            ));
        }
        drop(ordered);

        let in_flight = self.core.workers.active();
        info!(in_flight, abandoned = abandoned.len(), "Dispatcher shutting down");
        self.core.shutdown_tx.send_replace(true);
        self.core.workers.wait_idle().await;

        let report = ShutdownReport {
            completed: self.core.completed.load(Ordering::Relaxed),
            interrupted: self.core.interrupted.load(Ordering::Relaxed),
            abandoned: abandoned.len() as u64,
        };
        info!(%report, available_mb = self.core.pool.available(), "Dispatcher shutdown complete");
        report
    }
}
