/*!
 * Status Module
 * Live text view over dispatcher snapshots
 */

pub mod monitor;
pub mod render;

pub use monitor::StatusMonitor;
pub use render::{render, usage_bar};
