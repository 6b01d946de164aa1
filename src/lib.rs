/*!
 * Memory Admission Kernel Library
 *
 * A fixed RAM pool shared by simulated processes:
 * - Admission control with atomic reservations
 * - FIFO waiting queue with head-of-line blocking
 * - One Tokio task per running process
 * - Read-only snapshots and events for status views
 */

pub mod core;
pub mod memory;
pub mod monitoring;
pub mod process;
pub mod status;

// Re-exports
pub use crate::core::{ConfigError, KernelConfig, KernelError, KernelResult, OversizePolicy};
pub use memory::{MemoryError, MemoryPool, MemoryPressure, MemoryStats, Reservation};
pub use monitoring::{init_tracing, Event, EventKind, EventSink, RecentEvents};
pub use process::{
    AdmissionPath, Dispatcher, DispatcherBuilder, ExitReason, ProcessError, ProcessState,
    RunningProcess, ShutdownReport, SystemSnapshot, WaitingProcess,
};
pub use status::StatusMonitor;
