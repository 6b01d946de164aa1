/*!
 * Memory Types
 * Common types for memory management
 */

use crate::core::limits::{
    MEMORY_PRESSURE_CRITICAL_PCT, MEMORY_PRESSURE_HIGH_PCT, MEMORY_PRESSURE_MEDIUM_PCT,
};
use crate::core::types::Megabytes;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Memory operation result
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Memory errors
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum MemoryError {
    #[error("Invalid reservation amount: {0} MB")]
    #[diagnostic(
        code(memory::invalid_amount),
        help("Reservations must request at least 1 MB.")
    )]
    InvalidAmount(Megabytes),

    #[error("Request of {requested} MB exceeds pool capacity of {total} MB")]
    #[diagnostic(
        code(memory::exceeds_capacity),
        help("This request can never be satisfied by the pool.")
    )]
    ExceedsCapacity { requested: Megabytes, total: Megabytes },

    #[error("Insufficient memory: requested {requested} MB, available {available} MB")]
    #[diagnostic(
        code(memory::insufficient),
        help("Wait for running processes to release memory.")
    )]
    Insufficient {
        requested: Megabytes,
        available: Megabytes,
    },
}

/// Point-in-time memory statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total_mb: Megabytes,
    pub used_mb: Megabytes,
    pub available_mb: Megabytes,
    pub usage_percentage: f64,
}

impl MemoryStats {
    pub fn new(total_mb: Megabytes, available_mb: Megabytes) -> Self {
        let used_mb = total_mb.saturating_sub(available_mb);
        let usage_percentage = if total_mb == 0 {
            0.0
        } else {
            used_mb as f64 / total_mb as f64 * 100.0
        };
        Self {
            total_mb,
            used_mb,
            available_mb,
            usage_percentage,
        }
    }

    pub fn memory_pressure(&self) -> MemoryPressure {
        if self.usage_percentage >= MEMORY_PRESSURE_CRITICAL_PCT {
            MemoryPressure::Critical
        } else if self.usage_percentage > MEMORY_PRESSURE_HIGH_PCT {
            MemoryPressure::High
        } else if self.usage_percentage > MEMORY_PRESSURE_MEDIUM_PCT {
            MemoryPressure::Medium
        } else {
            MemoryPressure::Low
        }
    }
}

/// Memory pressure levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryPressure {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for MemoryPressure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            MemoryPressure::Low => write!(f, "LOW"),
            MemoryPressure::Medium => write!(f, "MEDIUM"),
            MemoryPressure::High => write!(f, "HIGH"),
            MemoryPressure::Critical => write!(f, "CRITICAL"),
        }
    }
}
