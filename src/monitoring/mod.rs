/*!
 * Monitoring Module
 * Tracing setup, dispatcher events and the recent-events log
 */

pub mod events;
pub mod recent;
pub mod tracer;

pub use events::{Event, EventKind, EventSink};
pub use recent::RecentEvents;
pub use tracer::init_tracing;
