// SPDX-License-Identifier: MIT

use super::*;
use el_core::test_support::{dep, fixed_time, playbook_element, task_element};
use el_core::DependencyType;

fn created(element: Element) -> Event {
    Event::ElementCreated { element }
}

#[test]
fn create_then_get() {
    let mut state = MaterializedState::default();
    let el = task_element("hello");
    let id = el.id;
    state.apply_event(&created(el.clone()));
    assert_eq!(state.element(id.as_str()), Some(&el));
}

#[test]
fn delete_is_tombstone_and_idempotent() {
    let mut state = MaterializedState::default();
    let el = task_element("doomed");
    let id = el.id;
    state.apply_event(&created(el));

    let delete = Event::ElementDeleted { id, at: fixed_time() };
    state.apply_event(&delete);
    let v1 = state.element(id.as_str()).unwrap().version;
    assert!(state.element(id.as_str()).unwrap().is_deleted());

    // Applying the same fact twice changes nothing.
    state.apply_event(&delete);
    assert_eq!(state.element(id.as_str()).unwrap().version, v1);
}

#[test]
fn restore_clears_tombstone() {
    let mut state = MaterializedState::default();
    let el = task_element("phoenix");
    let id = el.id;
    state.apply_event(&created(el));
    state.apply_event(&Event::ElementDeleted { id, at: fixed_time() });
    state.apply_event(&Event::ElementRestored { id, at: fixed_time() });

    let el = state.element(id.as_str()).unwrap();
    assert!(!el.is_deleted());
    assert_eq!(el.version, 3);
}

#[test]
fn duplicate_dependency_apply_is_noop() {
    let mut state = MaterializedState::default();
    let a = task_element("a");
    let b = task_element("b");
    let (a_id, b_id) = (a.id, b.id);
    state.apply_event(&created(a));
    state.apply_event(&created(b));

    let add = Event::DependencyAdded { dependency: dep(a_id, b_id, DependencyType::Blocks) };
    state.apply_event(&add);
    state.apply_event(&add);

    assert_eq!(state.deps_from(a_id.as_str()).len(), 1);
    assert_eq!(state.deps_to(b_id.as_str()).len(), 1);
}

#[test]
fn remove_dependency_cleans_both_indexes() {
    let mut state = MaterializedState::default();
    let a = task_element("a");
    let b = task_element("b");
    let (a_id, b_id) = (a.id, b.id);
    state.apply_event(&created(a));
    state.apply_event(&created(b));
    state.apply_event(&Event::DependencyAdded {
        dependency: dep(a_id, b_id, DependencyType::Blocks),
    });

    state.apply_event(&Event::DependencyRemoved {
        source_id: a_id,
        target_id: b_id,
        dep_type: DependencyType::Blocks,
    });

    assert!(state.deps_from(a_id.as_str()).is_empty());
    assert!(state.deps_to(b_id.as_str()).is_empty());
    assert!(!state.dependencies.contains_key(a_id.as_str()));
    assert!(!state.dependents.contains_key(b_id.as_str()));
}

#[test]
fn purge_drops_edges_in_both_directions() {
    let mut state = MaterializedState::default();
    let a = task_element("a");
    let b = task_element("b");
    let c = task_element("c");
    let (a_id, b_id, c_id) = (a.id, b.id, c.id);
    for el in [a, b, c] {
        state.apply_event(&created(el));
    }
    state.apply_event(&Event::DependencyAdded {
        dependency: dep(a_id, b_id, DependencyType::Blocks),
    });
    state.apply_event(&Event::DependencyAdded {
        dependency: dep(b_id, c_id, DependencyType::RelatesTo),
    });

    state.apply_event(&Event::ElementPurged { id: b_id });

    assert!(state.element(b_id.as_str()).is_none());
    assert!(state.deps_from(a_id.as_str()).is_empty());
    assert!(state.deps_to(c_id.as_str()).is_empty());
}

#[test]
fn playbook_name_index_tracks_lifecycle() {
    let mut state = MaterializedState::default();
    let pb = playbook_element("release", vec![], vec![]);
    let id = pb.id;
    state.apply_event(&created(pb));

    assert_eq!(state.playbook_by_ref("release").map(|e| e.id), Some(id));
    assert_eq!(state.playbook_by_ref(id.as_str()).map(|e| e.id), Some(id));

    state.apply_event(&Event::ElementDeleted { id, at: fixed_time() });
    assert!(state.playbook_by_ref("release").is_none());

    state.apply_event(&Event::ElementRestored { id, at: fixed_time() });
    assert_eq!(state.playbook_by_ref("release").map(|e| e.id), Some(id));
}

#[test]
fn element_by_prefix_requires_uniqueness() {
    let mut state = MaterializedState::default();
    let a = task_element("a");
    let a_id = a.id;
    state.apply_event(&created(a));

    assert_eq!(state.element_by_prefix(&a_id.as_str()[..8]).map(|e| e.id), Some(a_id));
    // "el-" matches every element; ambiguous once there are two.
    state.apply_event(&created(task_element("b")));
    assert!(state.element_by_prefix("el-").is_none());
}
