//! Nullable event sink — records every emitted event.

use scloud_types::{Event, EventSink};

/// Collects events in emission order.
#[derive(Default)]
pub struct NullEventSink {
    events: Vec<Event>,
}

impl NullEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Kinds of all recorded events, in order.
    pub fn kinds(&self) -> Vec<&str> {
        self.events.iter().map(|e| e.kind.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for NullEventSink {
    fn emit(&mut self, event: &Event) {
        self.events.push(event.clone());
    }
}
