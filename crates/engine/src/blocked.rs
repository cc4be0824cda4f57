// SPDX-License-Identifier: MIT

//! The blocked cache.
//!
//! A materialized map from element id to `{blocked_by, reason}` that makes
//! "which tasks are ready?" O(1). The cache is a pure function of the
//! dependency graph, element statuses, and the current time; it is rebuilt
//! from scratch at boot and maintained incrementally under the same state
//! lock as the mutation that triggered the change.
//!
//! `parent-child` entries read the *parent's* cache entry, so rebuild must
//! process parents before children (topological pass below), and runtime
//! invalidation cascades down the child direction whenever an entry
//! actually changes.

use chrono::{DateTime, Utc};
use el_core::{Dependency, DependencyType, ElementId, Gate};
use el_store::{BlockedEntry, MaterializedState};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::warn;

/// Compute the blocking state of one element.
///
/// Edges are evaluated in `(type, created_at, target_id)` order and the
/// first blocking edge wins, so the reported cause is deterministic.
pub fn compute_blocking_state(
    state: &MaterializedState,
    id: &ElementId,
    now: DateTime<Utc>,
) -> Option<BlockedEntry> {
    let element = state.element(id.as_str())?;
    if element.is_deleted() {
        return None;
    }

    let mut edges: Vec<&Dependency> =
        state.deps_from(id.as_str()).iter().filter(|d| d.dep_type.is_blocking()).collect();
    edges.sort_by(|a, b| {
        (a.dep_type, a.created_at, a.target_id.as_str())
            .cmp(&(b.dep_type, b.created_at, b.target_id.as_str()))
    });

    for edge in edges {
        let target = match state.element(edge.target_id.as_str()) {
            Some(t) if !t.is_deleted() => t,
            // A tombstoned or vanished target contributes neither blocking
            // nor inherited blocking.
            _ => continue,
        };

        match edge.dep_type {
            DependencyType::Blocks => {
                if !target.is_blocking_complete() {
                    return Some(BlockedEntry {
                        blocked_by: target.id,
                        reason: format!("Blocked by {} (blocks dependency)", target.title),
                    });
                }
            }
            DependencyType::ParentChild => {
                if state.blocked.contains_key(target.id.as_str()) {
                    return Some(BlockedEntry {
                        blocked_by: target.id,
                        reason: format!("Blocked by {} (parent is blocked)", target.title),
                    });
                }
                if !target.is_blocking_complete() {
                    return Some(BlockedEntry {
                        blocked_by: target.id,
                        reason: format!("Blocked by {} (parent-child dependency)", target.title),
                    });
                }
            }
            DependencyType::Awaits => match &edge.gate {
                Some(gate) if gate.is_satisfied(now) => {}
                Some(gate) => {
                    return Some(BlockedEntry {
                        blocked_by: target.id,
                        reason: format!("Awaiting {} gate", gate.kind()),
                    });
                }
                // Unreadable gate metadata blocks (fail-safe).
                None => {
                    return Some(BlockedEntry {
                        blocked_by: target.id,
                        reason: "Awaiting gate (invalid metadata)".to_string(),
                    });
                }
            },
            _ => {}
        }
    }

    None
}

/// Recompute one element's entry. Returns whether the entry changed.
pub(crate) fn invalidate(
    state: &mut MaterializedState,
    id: &ElementId,
    now: DateTime<Utc>,
) -> bool {
    let fresh = compute_blocking_state(state, id, now);
    match fresh {
        Some(entry) => state.blocked.insert(*id, entry.clone()) != Some(entry),
        None => state.blocked.remove(id.as_str()).is_some(),
    }
}

/// Children of `id` through `parent-child` edges (sources pointing at it).
fn children_of(state: &MaterializedState, id: &ElementId) -> Vec<ElementId> {
    state
        .dependents
        .get(id.as_str())
        .map(|refs| {
            refs.iter()
                .filter(|(_, t)| *t == DependencyType::ParentChild)
                .map(|(source, _)| *source)
                .collect()
        })
        .unwrap_or_default()
}

/// Recompute `start` and cascade into descendants whose inherited state
/// can have changed. Cycle-safe via the visited set.
pub(crate) fn invalidate_cascade(
    state: &mut MaterializedState,
    start: ElementId,
    now: DateTime<Utc>,
) {
    let mut visited: HashSet<ElementId> = HashSet::new();
    let mut queue: VecDeque<ElementId> = VecDeque::from([start]);

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        if invalidate(state, &id, now) {
            for child in children_of(state, &id) {
                queue.push_back(child);
            }
        }
    }
}

/// Recompute everything that blocks on `target` (after a status flip,
/// soft delete, or restore of the target).
pub(crate) fn invalidate_dependents(
    state: &mut MaterializedState,
    target: &ElementId,
    now: DateTime<Utc>,
) {
    let sources: Vec<ElementId> = state
        .dependents
        .get(target.as_str())
        .map(|refs| {
            refs.iter()
                .filter(|(_, t)| t.is_blocking())
                .map(|(source, _)| *source)
                .collect()
        })
        .unwrap_or_default();

    for source in sources {
        invalidate_cascade(state, source, now);
    }
}

/// Full rebuild: clear and recompute every candidate, parents first.
pub fn rebuild(state: &mut MaterializedState, now: DateTime<Utc>) {
    state.blocked.clear();

    // Candidate set: live elements with at least one outgoing blocking edge.
    let candidates: HashSet<ElementId> = state
        .dependencies
        .iter()
        .filter(|(_, deps)| deps.iter().any(|d| d.dep_type.is_blocking()))
        .map(|(id, _)| *id)
        .filter(|id| state.element(id.as_str()).map(|e| !e.is_deleted()).unwrap_or(false))
        .collect();

    // Parent/child maps restricted to the candidate set.
    let mut parents: HashMap<ElementId, Vec<ElementId>> = HashMap::new();
    let mut children: HashMap<ElementId, Vec<ElementId>> = HashMap::new();
    for id in &candidates {
        let ps: Vec<ElementId> = state
            .deps_from(id.as_str())
            .iter()
            .filter(|d| {
                d.dep_type == DependencyType::ParentChild && candidates.contains(&d.target_id)
            })
            .map(|d| d.target_id)
            .collect();
        for p in &ps {
            children.entry(*p).or_default().push(*id);
        }
        parents.insert(*id, ps);
    }

    let mut processed: HashSet<ElementId> = HashSet::new();
    let mut queue: VecDeque<ElementId> = candidates
        .iter()
        .filter(|id| parents.get(*id).map(Vec::is_empty).unwrap_or(true))
        .copied()
        .collect();

    let mut stalled = 0usize;
    while let Some(id) = queue.pop_front() {
        if processed.contains(&id) {
            continue;
        }
        let ready = parents
            .get(&id)
            .map(|ps| ps.iter().all(|p| processed.contains(p)))
            .unwrap_or(true);
        if !ready {
            // Parent still pending; revisit after the rest of the queue.
            queue.push_back(id);
            stalled += 1;
            if stalled > queue.len() {
                break;
            }
            continue;
        }
        stalled = 0;

        if let Some(entry) = compute_blocking_state(state, &id, now) {
            state.blocked.insert(id, entry);
        }
        processed.insert(id);
        if let Some(cs) = children.get(&id) {
            for c in cs.clone() {
                if !processed.contains(&c) {
                    queue.push_back(c);
                }
            }
        }
    }

    // Defensive pass for malformed graphs: anything unreached is computed
    // directly rather than dropped from the cache.
    let unprocessed: Vec<ElementId> =
        candidates.into_iter().filter(|id| !processed.contains(id)).collect();
    if !unprocessed.is_empty() {
        warn!(count = unprocessed.len(), "rebuild sweep over unreached candidates");
    }
    for id in unprocessed {
        if let Some(entry) = compute_blocking_state(state, &id, now) {
            state.blocked.insert(id, entry);
        }
    }
}

/// Re-check every element whose timer gate has come due. Returns how many
/// cache entries changed state.
pub(crate) fn tick_due_timers(state: &mut MaterializedState, now: DateTime<Utc>) -> usize {
    let due: Vec<ElementId> = state
        .dependencies
        .iter()
        .filter(|(id, deps)| {
            state.blocked.contains_key(id.as_str())
                && deps.iter().any(|d| {
                    matches!(&d.gate, Some(Gate::Timer { wait_until }) if *wait_until <= now)
                })
        })
        .map(|(id, _)| *id)
        .collect();

    let mut changed = 0;
    for id in due {
        if invalidate(state, &id, now) {
            changed += 1;
            // Descendants inherit through parent-child; cascade from here.
            for child in children_of(state, &id) {
                invalidate_cascade(state, child, now);
            }
        }
    }
    changed
}

#[cfg(test)]
#[path = "blocked_tests.rs"]
mod tests;
