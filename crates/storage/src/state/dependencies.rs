// SPDX-License-Identifier: MIT

//! Dependency event application.
//!
//! Uniqueness on `(source, target, type)` is enforced at the API layer;
//! the handlers here still guard on it so replaying a duplicate event is
//! a no-op (idempotency requirement).

use super::MaterializedState;
use el_core::Event;

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::DependencyAdded { dependency } => {
            let edges = state.dependencies.entry(dependency.source_id).or_default();
            if edges.iter().any(|d| d.key() == dependency.key()) {
                return;
            }
            edges.push(dependency.clone());

            let refs = state.dependents.entry(dependency.target_id).or_default();
            let rref = (dependency.source_id, dependency.dep_type);
            if !refs.contains(&rref) {
                refs.push(rref);
            }
        }

        Event::DependencyRemoved { source_id, target_id, dep_type } => {
            if let Some(edges) = state.dependencies.get_mut(source_id.as_str()) {
                edges.retain(|d| {
                    !(d.target_id == *target_id && d.dep_type == *dep_type)
                });
                if edges.is_empty() {
                    state.dependencies.remove(source_id.as_str());
                }
            }
            if let Some(refs) = state.dependents.get_mut(target_id.as_str()) {
                refs.retain(|(source, t)| !(source == source_id && t == dep_type));
                if refs.is_empty() {
                    state.dependents.remove(target_id.as_str());
                }
            }
        }

        _ => {}
    }
}
