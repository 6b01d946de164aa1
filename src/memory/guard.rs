/*!
 * Reservation Guard
 *
 * RAII guard for a pool reservation with automatic release
 */

use super::pool::MemoryPool;
use crate::core::types::Megabytes;
use std::sync::Arc;

/// Memory held from a [`MemoryPool`]
///
/// The amount goes back to the pool exactly once: either through
/// [`release`](Self::release) or when the guard is dropped.
///
/// # Example
///
/// ```ignore
/// let reservation = pool.reserve(350)?;
/// // ... run the process ...
/// reservation.release(); // or just drop it
/// ```
#[derive(Debug)]
#[must_use = "dropping a reservation releases its memory immediately"]
pub struct Reservation {
    pool: Arc<MemoryPool>,
    amount: Megabytes,
    active: bool,
}

impl Reservation {
    pub(super) fn new(pool: Arc<MemoryPool>, amount: Megabytes) -> Self {
        Self {
            pool,
            amount,
            active: true,
        }
    }

    /// Reserved amount
    #[inline]
    pub fn amount(&self) -> Megabytes {
        self.amount
    }

    /// Give the memory back now, returning the released amount
    pub fn release(mut self) -> Megabytes {
        self.release_once();
        self.amount
    }

    fn release_once(&mut self) {
        if self.active {
            self.active = false;
            self.pool.release(self.amount);
        }
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.release_once();
    }
}
