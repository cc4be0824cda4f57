// SPDX-License-Identifier: MIT

//! Materialized state built from WAL replay.

mod dependencies;
mod elements;
mod helpers;
mod sessions;
mod types;
mod worktrees;

pub use helpers::find_by_prefix;
pub use types::BlockedEntry;

use el_core::{
    Dependency, Element, ElementId, ElementKind, Event, MessageRecord, SessionId, SessionRecord,
    WorktreeRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Materialized state built from WAL operations.
///
/// # Idempotency Requirement
///
/// Event handlers MUST be idempotent: applying the same event twice must
/// produce the same state as applying it once. Record-carrying events make
/// this assignment-shaped; the handlers for id-only events guard on the
/// current state before mutating.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub elements: HashMap<ElementId, Element>,
    /// Outgoing edges, keyed by source element.
    #[serde(default)]
    pub dependencies: HashMap<ElementId, Vec<Dependency>>,
    #[serde(default)]
    pub sessions: HashMap<SessionId, SessionRecord>,
    /// Per-session message history, in append order.
    #[serde(default)]
    pub messages: HashMap<SessionId, Vec<MessageRecord>>,
    /// Worktrees keyed by canonical absolute path (display form).
    #[serde(default)]
    pub worktrees: HashMap<String, WorktreeRecord>,

    /// Reverse edge index: target → keys of edges pointing at it.
    /// Runtime-only; rebuilt by [`MaterializedState::rebuild_indexes`].
    #[serde(skip)]
    pub dependents: HashMap<ElementId, Vec<(ElementId, el_core::DependencyType)>>,
    /// Playbook name → element id. Runtime-only.
    #[serde(skip)]
    pub playbook_names: HashMap<String, ElementId>,
    /// The blocked cache: element → why it is blocked. Wholly derived;
    /// rebuilt at boot and maintained incrementally afterwards.
    #[serde(skip)]
    pub blocked: HashMap<ElementId, BlockedEntry>,
}

impl MaterializedState {
    /// Apply an event to derive state changes.
    ///
    /// Events are facts about what happened; state is derived from them.
    /// Blocked-cache maintenance is NOT done here — the cache is derived
    /// state owned by the engine, which invalidates after each commit.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::ElementCreated { .. }
            | Event::ElementUpdated { .. }
            | Event::ElementDeleted { .. }
            | Event::ElementRestored { .. }
            | Event::ElementPurged { .. } => elements::apply(self, event),

            Event::DependencyAdded { .. } | Event::DependencyRemoved { .. } => {
                dependencies::apply(self, event)
            }

            Event::SessionStarted { .. }
            | Event::SessionUpdated { .. }
            | Event::MessageAppended { .. } => sessions::apply(self, event),

            Event::WorktreeCreated { .. }
            | Event::WorktreeUpdated { .. }
            | Event::WorktreeRemoved { .. } => worktrees::apply(self, event),

            Event::Custom => {}
        }
    }

    /// Rebuild the runtime-only indexes after deserialization.
    pub fn rebuild_indexes(&mut self) {
        self.dependents.clear();
        self.playbook_names.clear();
        for deps in self.dependencies.values() {
            for dep in deps {
                self.dependents
                    .entry(dep.target_id)
                    .or_default()
                    .push((dep.source_id, dep.dep_type));
            }
        }
        for element in self.elements.values() {
            if let Some(playbook) = element.playbook() {
                if !element.is_deleted() {
                    self.playbook_names.insert(playbook.name.clone(), element.id);
                }
            }
        }
    }

    /// Get an element by exact id.
    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.get(id)
    }

    /// Get an element by id or unique prefix (like git commit hashes).
    pub fn element_by_prefix(&self, id: &str) -> Option<&Element> {
        helpers::find_by_prefix(&self.elements, id)
    }

    /// Outgoing edges of `id`.
    pub fn deps_from(&self, id: &str) -> &[Dependency] {
        self.dependencies.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Incoming edges of `id`, resolved through the reverse index.
    pub fn deps_to(&self, id: &str) -> Vec<&Dependency> {
        let Some(refs) = self.dependents.get(id) else {
            return Vec::new();
        };
        refs.iter()
            .filter_map(|(source, dep_type)| {
                self.deps_from(source.as_str())
                    .iter()
                    .find(|d| d.target_id == id && d.dep_type == *dep_type)
            })
            .collect()
    }

    /// Resolve a playbook by element id or unique name.
    pub fn playbook_by_ref(&self, name_or_id: &str) -> Option<&Element> {
        if let Some(el) = self.elements.get(name_or_id) {
            if el.kind() == ElementKind::Playbook {
                return Some(el);
            }
        }
        self.playbook_names.get(name_or_id).and_then(|id| self.elements.get(id))
    }

    /// Iterate non-tombstoned elements of one kind.
    pub fn live_of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &Element> {
        self.elements
            .values()
            .filter(move |e| e.kind() == kind && !e.is_deleted())
    }

    pub fn session(&self, id: &str) -> Option<&SessionRecord> {
        self.sessions.get(id)
    }

    pub fn session_messages(&self, id: &str) -> &[MessageRecord] {
        self.messages.get(id).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
#[path = "../state_tests.rs"]
mod tests;
