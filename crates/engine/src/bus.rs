// SPDX-License-Identifier: MIT

//! In-process change event bus.
//!
//! Mutations publish after commit; observers (HTTP watchers, tests)
//! subscribe. Lossy by design: a slow observer misses events rather than
//! back-pressuring mutations.

use el_core::{DependencyType, ElementId};
use tokio::sync::broadcast;

const BUS_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
    Restored,
    Purged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    Element { id: ElementId, action: ChangeAction },
    DependencyAdded { source_id: ElementId, target_id: ElementId, dep_type: DependencyType },
    DependencyRemoved { source_id: ElementId, target_id: ElementId, dep_type: DependencyType },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Publish to current subscribers; dropped silently when none listen.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
