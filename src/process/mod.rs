/*!
 * Process Module
 * Process records, admission dispatch and simulated execution
 */

pub mod dispatcher;
pub mod drain;
pub mod pid;
pub mod snapshot;
pub mod types;
pub mod worker;

// Re-export for convenience
pub use dispatcher::{Dispatcher, DispatcherBuilder, ShutdownReport};
pub use drain::{DrainCommand, DrainTask};
pub use pid::PidAllocator;
pub use snapshot::{RunningProcess, SystemSnapshot, WaitingProcess};
pub use types::*;
pub use worker::ExecutionWorker;
