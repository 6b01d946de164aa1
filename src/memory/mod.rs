/*!
 * Memory Module
 * Bounded RAM pool and reservation tracking
 */

pub mod guard;
pub mod pool;
pub mod types;

// Re-export for convenience
pub use guard::Reservation;
pub use pool::MemoryPool;
pub use types::*;
