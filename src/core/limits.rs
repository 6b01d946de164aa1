/*!
 * System Limits and Constants
 *
 * Centralized location for system-wide defaults and thresholds.
 * Organized by domain for maintainability and discoverability.
 */

use std::time::Duration;

// =============================================================================
// MEMORY LIMITS
// =============================================================================

/// Total simulated RAM (1GB)
/// Used as default capacity for the memory pool
pub const DEFAULT_TOTAL_MEMORY_MB: u64 = 1024;

/// Usage above this percentage is reported as medium pressure
pub const MEMORY_PRESSURE_MEDIUM_PCT: f64 = 50.0;

/// Usage above this percentage is reported as high pressure
pub const MEMORY_PRESSURE_HIGH_PCT: f64 = 75.0;

/// Usage at or above this percentage is reported as critical
pub const MEMORY_PRESSURE_CRITICAL_PCT: f64 = 95.0;

// =============================================================================
// PROCESS LIMITS
// =============================================================================

/// First PID handed out by the allocator
/// PIDs increase monotonically from here and are never reused
pub const DEFAULT_PID_BASE: u32 = 1000;

// =============================================================================
// DISPATCH TIMING
// =============================================================================

/// Interval between waiting-queue admission checks
/// Release notifications wake the drain loop earlier
pub const DEFAULT_DRAIN_INTERVAL: Duration = Duration::from_secs(1);

/// Refresh period of the status view
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(2);

// =============================================================================
// MONITORING
// =============================================================================

/// Number of recent events retained for display
pub const DEFAULT_RECENT_EVENTS: usize = 5;

/// Width of the memory usage bar in cells (one cell per 5%)
pub const STATUS_BAR_CELLS: usize = 20;
