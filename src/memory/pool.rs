/*!
 * Memory Pool
 *
 * Fixed-capacity RAM pool shared by all simulated processes.
 *
 * `available` is a single atomic counter; reservation is a compare-and-swap
 * loop so two concurrent callers can never both claim the last block.
 * `available + reserved == total` holds whenever no call is in flight.
 */

use super::guard::Reservation;
use super::types::{MemoryError, MemoryResult, MemoryStats};
use crate::core::types::Megabytes;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, trace};

/// Bounded memory pool
///
/// # Performance
/// - Cache-line aligned to prevent false sharing of the counter
#[repr(C, align(64))]
#[derive(Debug)]
pub struct MemoryPool {
    total: Megabytes,
    available: AtomicU64,
}

impl MemoryPool {
    /// Create a pool with `total` MB, all of it available
    pub fn new(total: Megabytes) -> Self {
        info!(total_mb = total, "Memory pool initialized");
        Self {
            total,
            available: AtomicU64::new(total),
        }
    }

    /// Atomically claim `amount` MB if that much is available
    ///
    /// Zero and amounts above the pool capacity always fail.
    pub fn try_reserve(&self, amount: Megabytes) -> bool {
        self.reserve_amount(amount).is_ok()
    }

    /// Like [`try_reserve`](Self::try_reserve), but returns a guard that
    /// gives the memory back exactly once
    pub fn reserve(self: &Arc<Self>, amount: Megabytes) -> MemoryResult<Reservation> {
        self.reserve_amount(amount)?;
        Ok(Reservation::new(Arc::clone(self), amount))
    }

    fn reserve_amount(&self, amount: Megabytes) -> MemoryResult<()> {
        if amount == 0 {
            return Err(MemoryError::InvalidAmount(amount));
        }
        if amount > self.total {
            return Err(MemoryError::ExceedsCapacity {
                requested: amount,
                total: self.total,
            });
        }

        self.available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |available| {
                available.checked_sub(amount)
            })
            .map(|previous| {
                trace!(amount_mb = amount, available_mb = previous - amount, "Memory reserved");
            })
            .map_err(|available| MemoryError::Insufficient {
                requested: amount,
                available,
            })
    }

    /// Return `amount` MB to the pool
    ///
    /// Callers must only release what they reserved, once. A release that
    /// would push `available` past `total` is clamped and logged.
    pub fn release(&self, amount: Megabytes) {
        if amount == 0 {
            return;
        }

        let total = self.total;
        let result = self
            .available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |available| {
                Some(available.saturating_add(amount).min(total))
            });

        // fetch_update with an always-Some closure cannot fail
        if let Ok(previous) = result {
            if previous.saturating_add(amount) > total {
                error!(
                    amount_mb = amount,
                    available_mb = previous,
                    total_mb = total,
                    "Release exceeds reserved memory - clamped to capacity"
                );
            } else {
                trace!(
                    amount_mb = amount,
                    available_mb = previous + amount,
                    "Memory released"
                );
            }
        }
    }

    #[inline]
    pub fn available(&self) -> Megabytes {
        self.available.load(Ordering::Acquire)
    }

    #[inline]
    pub fn total(&self) -> Megabytes {
        self.total
    }

    #[inline]
    pub fn used(&self) -> Megabytes {
        self.total.saturating_sub(self.available())
    }

    pub fn stats(&self) -> MemoryStats {
        MemoryStats::new(self.total, self.available())
    }
}
