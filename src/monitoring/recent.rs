/*!
 * Recent Events
 * Bounded log of the latest dispatcher events for the status view
 */

use super::events::{Event, EventSink};
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Keeps the last `capacity` events, oldest evicted first
#[derive(Debug)]
pub struct RecentEvents {
    capacity: usize,
    events: Mutex<VecDeque<Event>>,
}

impl RecentEvents {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Oldest first
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecentEvents {
    fn default() -> Self {
        Self::with_capacity(crate::core::limits::DEFAULT_RECENT_EVENTS)
    }
}

impl EventSink for RecentEvents {
    fn emit(&self, event: Event) {
        if self.capacity == 0 {
            return;
        }
        let mut events = self.events.lock();
        while events.len() >= self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }
}
