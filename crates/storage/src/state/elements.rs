// SPDX-License-Identifier: MIT

//! Element event application.

use super::MaterializedState;
use el_core::{Event, ElementKind};

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::ElementCreated { element } | Event::ElementUpdated { element } => {
            if element.kind() == ElementKind::Playbook {
                index_playbook(state, element);
            }
            state.elements.insert(element.id, element.clone());
        }

        Event::ElementDeleted { id, at } => {
            let name = {
                let Some(element) = state.elements.get_mut(id.as_str()) else {
                    return;
                };
                if element.is_deleted() {
                    return; // already tombstoned
                }
                element.deleted_at = Some(*at);
                element.updated_at = *at;
                element.version += 1;
                element.playbook().map(|p| p.name.clone())
            };
            // A tombstoned playbook releases its unique name.
            if let Some(name) = name {
                state.playbook_names.remove(&name);
            }
        }

        Event::ElementRestored { id, at } => {
            let restored = {
                let Some(element) = state.elements.get_mut(id.as_str()) else {
                    return;
                };
                if element.deleted_at.is_none() {
                    return;
                }
                element.deleted_at = None;
                element.updated_at = *at;
                element.version += 1;
                element.clone()
            };
            if restored.kind() == ElementKind::Playbook {
                index_playbook(state, &restored);
            }
        }

        Event::ElementPurged { id } => {
            if let Some(removed) = state.elements.remove(id.as_str()) {
                if let Some(playbook) = removed.playbook() {
                    state.playbook_names.remove(&playbook.name);
                }
            }
            // Drop every edge touching the purged element, both directions.
            state.dependencies.remove(id.as_str());
            for deps in state.dependencies.values_mut() {
                deps.retain(|d| d.target_id != *id);
            }
            state.dependents.remove(id.as_str());
            for refs in state.dependents.values_mut() {
                refs.retain(|(source, _)| source != id);
            }
            state.blocked.remove(id.as_str());
        }

        _ => {}
    }
}

fn index_playbook(state: &mut MaterializedState, element: &el_core::Element) {
    if let Some(playbook) = element.playbook() {
        if !element.is_deleted() {
            state.playbook_names.insert(playbook.name.clone(), element.id);
        }
    }
}
