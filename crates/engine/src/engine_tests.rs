// SPDX-License-Identifier: MIT

use super::*;
use crate::api::{ElementFilter, ElementPatch, NewElement};
use crate::bus::{ChangeAction, ChangeEvent};
use crate::error::ElementError;
use crate::test_util::{new_task, test_engine};
use crate::worktree::WorktreeConfig;
use el_core::test_support::actor;
use el_core::{ElementBody, ElementKind, FakeClock};
use tempfile::TempDir;

#[test]
fn create_then_get_returns_canonical_form() {
    let (engine, _dir) = test_engine();
    let created = engine.create(new_task("write spec")).unwrap();

    assert_eq!(created.version, 1);
    assert_eq!(created.kind(), ElementKind::Task);
    assert_eq!(created.task().unwrap().priority, el_core::DEFAULT_PRIORITY);

    let fetched = engine.get(created.id.as_str(), false).unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn create_rejects_empty_title() {
    let (engine, _dir) = test_engine();
    assert!(matches!(engine.create(new_task("  ")), Err(ElementError::Validation(_))));
}

#[test]
fn update_bumps_version_monotonically() {
    let (engine, _dir) = test_engine();
    let created = engine.create(new_task("v1")).unwrap();

    let mut last = created.version;
    for title in ["v2", "v3", "v4"] {
        let patch = ElementPatch { title: Some(title.to_string()), ..Default::default() };
        let updated = engine.update(created.id.as_str(), patch, None).unwrap();
        assert_eq!(updated.version, last + 1);
        last = updated.version;
    }
}

#[test]
fn update_rejects_stale_version() {
    let (engine, _dir) = test_engine();
    let created = engine.create(new_task("contended")).unwrap();

    let patch = ElementPatch { title: Some("first".to_string()), ..Default::default() };
    engine.update(created.id.as_str(), patch, Some(1)).unwrap();

    let patch = ElementPatch { title: Some("second".to_string()), ..Default::default() };
    let err = engine.update(created.id.as_str(), patch, Some(1)).unwrap_err();
    assert!(matches!(
        err,
        ElementError::ConcurrentModification { expected: 1, actual: 2, .. }
    ));
}

#[test]
fn update_without_expected_version_is_last_writer_wins() {
    let (engine, _dir) = test_engine();
    let created = engine.create(new_task("lww")).unwrap();

    let patch = ElementPatch { title: Some("a".to_string()), ..Default::default() };
    engine.update(created.id.as_str(), patch, None).unwrap();
    let patch = ElementPatch { title: Some("b".to_string()), ..Default::default() };
    let updated = engine.update(created.id.as_str(), patch, None).unwrap();
    assert_eq!(updated.title, "b");
    assert_eq!(updated.version, 3);
}

#[test]
fn delete_hides_element_and_restore_revives_it() {
    let (engine, _dir) = test_engine();
    let created = engine.create(new_task("tombstone me")).unwrap();
    let id = created.id;

    engine.delete(id.as_str()).unwrap();
    assert!(matches!(engine.get(id.as_str(), false), Err(ElementError::NotFound(_))));

    // Opt-in shows the tombstone.
    let hidden = engine.get(id.as_str(), true).unwrap();
    assert!(hidden.is_deleted());

    // Double delete is NotFound, not a second tombstone.
    assert!(matches!(engine.delete(id.as_str()), Err(ElementError::NotFound(_))));

    let restored = engine.restore(id.as_str()).unwrap();
    assert!(!restored.is_deleted());
    assert!(engine.get(id.as_str(), false).is_ok());
}

#[test]
fn update_on_tombstoned_element_is_not_found() {
    let (engine, _dir) = test_engine();
    let created = engine.create(new_task("gone")).unwrap();
    engine.delete(created.id.as_str()).unwrap();

    let patch = ElementPatch { title: Some("zombie".to_string()), ..Default::default() };
    assert!(matches!(
        engine.update(created.id.as_str(), patch, None),
        Err(ElementError::NotFound(_))
    ));
}

#[test]
fn list_filters_by_kind_and_excludes_tombstones() {
    let (engine, _dir) = test_engine();
    let keep = engine.create(new_task("keep")).unwrap();
    let drop = engine.create(new_task("drop")).unwrap();
    engine.delete(drop.id.as_str()).unwrap();

    let tasks = engine.list(&ElementFilter::kind(ElementKind::Task));
    assert_eq!(tasks.iter().map(|e| e.id).collect::<Vec<_>>(), vec![keep.id]);

    let mut with_deleted = ElementFilter::kind(ElementKind::Task);
    with_deleted.include_deleted = true;
    assert_eq!(engine.list(&with_deleted).len(), 2);
}

#[test]
fn list_paginated_reports_total() {
    let (engine, _dir) = test_engine();
    for i in 0..5 {
        engine.create(new_task(&format!("task {i}"))).unwrap();
        engine.clock().advance(std::time::Duration::from_secs(1));
    }

    let mut filter = ElementFilter::kind(ElementKind::Task);
    filter.limit = Some(2);
    let page = engine.list_paginated(&filter, 2);
    assert_eq!(page.total, 5);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].title, "task 2");
}

#[test]
fn search_ranks_by_recency() {
    let (engine, _dir) = test_engine();
    let old = engine.create(new_task("deploy api")).unwrap();
    engine.clock().advance(std::time::Duration::from_secs(60));
    let fresh = engine.create(new_task("deploy web")).unwrap();
    engine.create(new_task("unrelated")).unwrap();

    let hits = engine.search("deploy", &ElementFilter::default()).unwrap();
    assert_eq!(hits.iter().map(|e| e.id).collect::<Vec<_>>(), vec![fresh.id, old.id]);
}

#[test]
fn search_rejects_empty_query() {
    let (engine, _dir) = test_engine();
    assert!(matches!(
        engine.search("   ", &ElementFilter::default()),
        Err(ElementError::Validation(_))
    ));
}

#[test]
fn state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join("state");
    let id;
    {
        let engine = Engine::open_with_clock(
            &state_dir,
            WorktreeConfig::new(dir.path()),
            FakeClock::new(),
        )
        .unwrap();
        id = engine.create(new_task("durable")).unwrap().id;
    }

    let engine =
        Engine::open_with_clock(&state_dir, WorktreeConfig::new(dir.path()), FakeClock::new())
            .unwrap();
    assert_eq!(engine.get(id.as_str(), false).unwrap().title, "durable");
}

#[test]
fn bus_receives_change_events() {
    let (engine, _dir) = test_engine();
    let mut rx = engine.bus().subscribe();
    let created = engine.create(new_task("observable")).unwrap();

    let event = rx.try_recv().unwrap();
    assert_eq!(
        event,
        ChangeEvent::Element { id: created.id, action: ChangeAction::Created }
    );
}

#[test]
fn duplicate_playbook_name_rejected() {
    let (engine, _dir) = test_engine();
    let body = ElementBody::Playbook(el_core::PlaybookFields {
        name: "release".to_string(),
        steps: vec![],
        variables: vec![],
    });
    engine.create(NewElement::new("release", actor(), body.clone())).unwrap();
    assert!(matches!(
        engine.create(NewElement::new("release", actor(), body)),
        Err(ElementError::Validation(_))
    ));
}
