// SPDX-License-Identifier: MIT

use super::*;
use chrono::Duration;

#[yare::parameterized(
    blocks = { DependencyType::Blocks, DependencyFamily::Blocking },
    parent_child = { DependencyType::ParentChild, DependencyFamily::Blocking },
    awaits = { DependencyType::Awaits, DependencyFamily::Blocking },
    relates_to = { DependencyType::RelatesTo, DependencyFamily::Associative },
    supersedes = { DependencyType::Supersedes, DependencyFamily::Associative },
    caused_by = { DependencyType::CausedBy, DependencyFamily::Associative },
    authored_by = { DependencyType::AuthoredBy, DependencyFamily::Attribution },
    replies_to = { DependencyType::RepliesTo, DependencyFamily::Attribution },
)]
fn families(dep_type: DependencyType, family: DependencyFamily) {
    assert_eq!(dep_type.family(), family);
}

#[test]
fn parse_round_trips_every_type() {
    use DependencyType::*;
    for dep_type in [
        Blocks, ParentChild, Awaits, RelatesTo, References, Supersedes, Duplicates, CausedBy,
        Validates, AuthoredBy, AssignedTo, ApprovedBy, RepliesTo,
    ] {
        assert_eq!(DependencyType::parse(dep_type.as_str()), Some(dep_type));
    }
    assert_eq!(DependencyType::parse("nope"), None);
}

#[test]
fn serde_uses_kebab_case() {
    let json = serde_json::to_value(DependencyType::ParentChild).unwrap();
    assert_eq!(json, serde_json::json!("parent-child"));
}

#[test]
fn blocking_types_sort_before_awaits() {
    // The cache iterates edges in (type, created_at, target) order; the
    // enum's derived Ord must keep blocks < parent-child < awaits.
    assert!(DependencyType::Blocks < DependencyType::ParentChild);
    assert!(DependencyType::ParentChild < DependencyType::Awaits);
}

#[test]
fn timer_gate_boundary() {
    let now = crate::test_support::fixed_time();
    let gate = Gate::Timer { wait_until: now };
    assert!(gate.is_satisfied(now));
    assert!(gate.is_satisfied(now + Duration::milliseconds(1)));
    assert!(!gate.is_satisfied(now - Duration::milliseconds(1)));
}

#[test]
fn approval_gate_defaults_to_all_required() {
    let a = crate::element::EntityId::from_string("el-a");
    let b = crate::element::EntityId::from_string("el-b");
    let gate = Gate::Approval {
        required_approvers: vec![a, b],
        current_approvers: vec![a],
        approval_count: None,
    };
    assert!(!gate.is_satisfied(crate::test_support::fixed_time()));

    let gate = Gate::Approval {
        required_approvers: vec![a, b],
        current_approvers: vec![a],
        approval_count: Some(1),
    };
    assert!(gate.is_satisfied(crate::test_support::fixed_time()));
}

#[yare::parameterized(
    external = { Gate::External },
    webhook = { Gate::Webhook },
)]
fn inspection_never_satisfies(gate: Gate) {
    assert!(!gate.is_satisfied(crate::test_support::fixed_time()));
}

#[test]
fn gate_from_metadata_parses_timer() {
    let metadata: Metadata = serde_json::from_value(serde_json::json!({
        "gate": "timer",
        "waitUntil": "2026-01-01T00:00:00Z",
    }))
    .unwrap();
    let gate = Gate::from_metadata(&metadata).unwrap();
    assert_eq!(gate.kind(), GateKind::Timer);
}

#[test]
fn gate_from_metadata_rejects_garbage() {
    let metadata: Metadata =
        serde_json::from_value(serde_json::json!({ "gate": "lunar-phase" })).unwrap();
    assert!(matches!(Gate::from_metadata(&metadata), Err(GateError::Invalid(_))));
}

#[test]
fn dep_key_uniqueness_is_per_type() {
    let s = ElementId::from_string("el-s");
    let t = ElementId::from_string("el-t");
    let a = crate::test_support::dep(s, t, DependencyType::Blocks);
    let b = crate::test_support::dep(s, t, DependencyType::RelatesTo);
    assert_ne!(a.key(), b.key());
    assert_eq!(a.key(), crate::test_support::dep(s, t, DependencyType::Blocks).key());
}
