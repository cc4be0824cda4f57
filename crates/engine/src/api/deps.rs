// SPDX-License-Identifier: MIT

//! Dependency edge operations.

use crate::blocked;
use crate::bus::ChangeEvent;
use crate::engine::Engine;
use crate::error::ElementError;
use el_core::{
    Clock, Dependency, DependencyType, ElementId, EntityId, Event, Gate, GateError, Metadata,
};
use el_store::MaterializedState;
use std::collections::HashSet;

impl<C: Clock> Engine<C> {
    /// Insert an edge. `(source, target, type)` stays unique and the
    /// blocking subgraph stays acyclic.
    pub fn add_dependency(
        &self,
        source: &str,
        target: &str,
        dep_type: DependencyType,
        metadata: Metadata,
        created_by: EntityId,
    ) -> Result<Dependency, ElementError> {
        let now = self.clock().now_utc();
        let dependency;
        {
            let mut state = self.state().lock();
            let source_el = state
                .element(source)
                .filter(|e| !e.is_deleted())
                .ok_or_else(|| ElementError::NotFound(source.to_string()))?;
            let target_el = state
                .element(target)
                .filter(|e| !e.is_deleted())
                .ok_or_else(|| ElementError::NotFound(target.to_string()))?;
            let (source_id, target_id) = (source_el.id, target_el.id);

            if source_id == target_id {
                return Err(ElementError::Validation(
                    "an element cannot depend on itself".to_string(),
                ));
            }

            if state
                .deps_from(source)
                .iter()
                .any(|d| d.target_id == target_id && d.dep_type == dep_type)
            {
                return Err(ElementError::DuplicateDependency(format!(
                    "{source} -[{dep_type}]-> {target}"
                )));
            }

            // awaits edges must carry a valid gate; everything else must not.
            let gate = match dep_type {
                DependencyType::Awaits => {
                    if metadata.is_empty() {
                        return Err(GateError::Missing.into());
                    }
                    Some(Gate::from_metadata(&metadata)?)
                }
                _ => None,
            };

            if dep_type.is_blocking() && creates_cycle(&state, &source_id, &target_id) {
                return Err(ElementError::CycleDetected(format!(
                    "{source} -[{dep_type}]-> {target}"
                )));
            }

            dependency = Dependency {
                source_id,
                target_id,
                dep_type,
                gate,
                metadata,
                created_by,
                created_at: now,
            };
            self.commit_locked(
                &mut state,
                Event::DependencyAdded { dependency: dependency.clone() },
            )?;

            if dep_type.is_blocking() {
                blocked::invalidate_cascade(&mut state, source_id, now);
            }
        }

        self.publish(ChangeEvent::DependencyAdded {
            source_id: dependency.source_id,
            target_id: dependency.target_id,
            dep_type,
        });
        Ok(dependency)
    }

    /// Remove an edge; the blocked cache never keeps a dangling row.
    pub fn remove_dependency(
        &self,
        source: &str,
        target: &str,
        dep_type: DependencyType,
    ) -> Result<(), ElementError> {
        let now = self.clock().now_utc();
        let source_id;
        let target_id;
        {
            let mut state = self.state().lock();
            let existing = state
                .deps_from(source)
                .iter()
                .find(|d| d.target_id == target && d.dep_type == dep_type)
                .ok_or_else(|| {
                    ElementError::NotFound(format!("{source} -[{dep_type}]-> {target}"))
                })?;
            source_id = existing.source_id;
            target_id = existing.target_id;

            self.commit_locked(
                &mut state,
                Event::DependencyRemoved { source_id, target_id, dep_type },
            )?;

            if dep_type.is_blocking() {
                blocked::invalidate_cascade(&mut state, source_id, now);
            }
        }

        self.publish(ChangeEvent::DependencyRemoved { source_id, target_id, dep_type });
        Ok(())
    }

    /// Outgoing edges, optionally filtered by type.
    pub fn get_dependencies(
        &self,
        id: &str,
        types: Option<&[DependencyType]>,
    ) -> Result<Vec<Dependency>, ElementError> {
        let state = self.state().lock();
        require_live(&state, id)?;
        Ok(state
            .deps_from(id)
            .iter()
            .filter(|d| types.map(|ts| ts.contains(&d.dep_type)).unwrap_or(true))
            .cloned()
            .collect())
    }

    /// Incoming edges, optionally filtered by type.
    pub fn get_dependents(
        &self,
        id: &str,
        types: Option<&[DependencyType]>,
    ) -> Result<Vec<Dependency>, ElementError> {
        let state = self.state().lock();
        require_live(&state, id)?;
        Ok(state
            .deps_to(id)
            .into_iter()
            .filter(|d| types.map(|ts| ts.contains(&d.dep_type)).unwrap_or(true))
            .cloned()
            .collect())
    }
}

fn require_live(state: &MaterializedState, id: &str) -> Result<(), ElementError> {
    state
        .element(id)
        .filter(|e| !e.is_deleted())
        .map(|_| ())
        .ok_or_else(|| ElementError::NotFound(id.to_string()))
}

/// DFS from `target` along blocking edges; reaching `source` means the
/// new edge would close a cycle.
fn creates_cycle(state: &MaterializedState, source: &ElementId, target: &ElementId) -> bool {
    let mut visited: HashSet<ElementId> = HashSet::new();
    let mut stack: Vec<ElementId> = vec![*target];

    while let Some(id) = stack.pop() {
        if id == *source {
            return true;
        }
        if !visited.insert(id) {
            continue;
        }
        for dep in state.deps_from(id.as_str()) {
            if dep.dep_type.is_blocking() {
                stack.push(dep.target_id);
            }
        }
    }
    false
}
