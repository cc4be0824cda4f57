// SPDX-License-Identifier: MIT

use super::*;
use crate::api::NewElement;
use crate::error::ElementError;
use crate::test_util::{new_task, test_engine};
use el_core::test_support::actor;
use el_core::{DependencyType, ElementBody, Metadata, TaskFields};
use std::time::Duration;

#[test]
fn ready_excludes_blocked_and_closed() {
    let (engine, _dir) = test_engine();
    let t1 = engine.create(new_task("T1")).unwrap();
    let t2 = engine.create(new_task("T2")).unwrap();
    engine
        .add_dependency(
            t2.id.as_str(),
            t1.id.as_str(),
            DependencyType::Blocks,
            Metadata::new(),
            actor(),
        )
        .unwrap();

    let ready = engine.ready_tasks(&TaskFilter::default());
    assert_eq!(ready.iter().map(|e| e.id).collect::<Vec<_>>(), vec![t1.id]);

    let blocked = engine.blocked_tasks(&TaskFilter::default());
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].task.id, t2.id);
    assert_eq!(blocked[0].blocked_by, Some(t1.id));
    assert_eq!(blocked[0].reason, "Blocked by T1 (blocks dependency)");

    // Closing the blocker frees T2; the closed task leaves the pool.
    engine.close_task(t1.id.as_str(), None).unwrap();
    let ready = engine.ready_tasks(&TaskFilter::default());
    assert_eq!(ready.iter().map(|e| e.id).collect::<Vec<_>>(), vec![t2.id]);
}

#[test]
fn ready_orders_by_priority_schedule_then_age() {
    let (engine, _dir) = test_engine();
    let now = engine.clock().now_utc();

    let mk = |title: &str, priority: u8, scheduled: Option<i64>| {
        let mut fields = TaskFields { priority, ..Default::default() };
        fields.scheduled_for = scheduled.map(|s| now - chrono::Duration::seconds(s));
        engine
            .create(NewElement::new(title, actor(), ElementBody::Task(fields)))
            .unwrap()
            .id
    };

    let low = mk("low", 4, None);
    engine.clock().advance(Duration::from_secs(1));
    let urgent_late = mk("urgent scheduled", 1, Some(10));
    engine.clock().advance(Duration::from_secs(1));
    let urgent_unscheduled = mk("urgent unscheduled", 1, None);
    engine.clock().advance(Duration::from_secs(1));
    let urgent_unscheduled_newer = mk("urgent newer", 1, None);

    let ready: Vec<_> = engine.ready_tasks(&TaskFilter::default()).iter().map(|e| e.id).collect();
    // nulls first, then scheduled ascending; priority dominates.
    assert_eq!(ready, vec![urgent_unscheduled, urgent_unscheduled_newer, urgent_late, low]);
}

#[test]
fn ready_respects_future_schedule() {
    let (engine, _dir) = test_engine();
    let task = engine.create(new_task("later")).unwrap();
    let future = engine.clock().now_utc() + chrono::Duration::seconds(60);
    engine
        .update(
            task.id.as_str(),
            crate::api::ElementPatch { scheduled_for: Some(Some(future)), ..Default::default() },
            None,
        )
        .unwrap();

    assert!(engine.ready_tasks(&TaskFilter::default()).is_empty());
    engine.clock().advance(Duration::from_secs(61));
    assert_eq!(engine.ready_tasks(&TaskFilter::default()).len(), 1);
}

#[test]
fn ready_filters() {
    let (engine, _dir) = test_engine();
    let me = actor();
    let mine = engine
        .create(NewElement::new(
            "mine",
            me,
            ElementBody::Task(TaskFields { assignee: Some(me), ..Default::default() }),
        ))
        .unwrap();
    engine.create(new_task("unowned")).unwrap();

    let filter = TaskFilter { assignee: Some(me), ..Default::default() };
    let ready = engine.ready_tasks(&filter);
    assert_eq!(ready.iter().map(|e| e.id).collect::<Vec<_>>(), vec![mine.id]);

    let filter = TaskFilter { limit: Some(1), ..Default::default() };
    assert_eq!(engine.ready_tasks(&filter).len(), 1);
}

#[test]
fn manual_blocked_status_appears_without_cache_entry() {
    let (engine, _dir) = test_engine();
    let task = engine.create(new_task("stuck")).unwrap();
    engine.start_task(task.id.as_str()).unwrap();
    engine
        .update(
            task.id.as_str(),
            crate::api::ElementPatch { status: Some("blocked".into()), ..Default::default() },
            None,
        )
        .unwrap();

    let blocked = engine.blocked_tasks(&TaskFilter::default());
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].blocked_by, None);
    assert_eq!(blocked[0].reason, "Status set to blocked");
}

#[test]
fn lifecycle_helpers_follow_the_status_machine() {
    let (engine, _dir) = test_engine();
    let task = engine.create(new_task("life")).unwrap();
    let id = task.id;

    let started = engine.start_task(id.as_str()).unwrap();
    assert_eq!(started.task().unwrap().status, el_core::TaskStatus::InProgress);

    let closed = engine.close_task(id.as_str(), Some("done".to_string())).unwrap();
    assert_eq!(closed.task().unwrap().status, el_core::TaskStatus::Closed);
    assert_eq!(closed.task().unwrap().close_reason.as_deref(), Some("done"));

    let reopened = engine.reopen_task(id.as_str()).unwrap();
    assert_eq!(reopened.task().unwrap().status, el_core::TaskStatus::Open);
    assert!(reopened.task().unwrap().close_reason.is_none());
}

#[test]
fn reopen_requires_closed() {
    let (engine, _dir) = test_engine();
    let task = engine.create(new_task("open")).unwrap();
    assert!(matches!(
        engine.reopen_task(task.id.as_str()),
        Err(ElementError::InvalidState(_))
    ));
}

#[test]
fn defer_and_undefer() {
    let (engine, _dir) = test_engine();
    let task = engine.create(new_task("later")).unwrap();
    let until = engine.clock().now_utc() + chrono::Duration::seconds(30);

    let deferred = engine.defer_task(task.id.as_str(), Some(until)).unwrap();
    assert_eq!(deferred.task().unwrap().status, el_core::TaskStatus::Deferred);
    assert!(engine.ready_tasks(&TaskFilter::default()).is_empty());

    let undeferred = engine.undefer_task(task.id.as_str()).unwrap();
    assert_eq!(undeferred.task().unwrap().status, el_core::TaskStatus::Open);
    assert!(undeferred.task().unwrap().scheduled_for.is_none());
    assert_eq!(engine.ready_tasks(&TaskFilter::default()).len(), 1);
}

#[test]
fn undefer_requires_deferred() {
    let (engine, _dir) = test_engine();
    let task = engine.create(new_task("open")).unwrap();
    assert!(matches!(
        engine.undefer_task(task.id.as_str()),
        Err(ElementError::InvalidState(_))
    ));
}

#[test]
fn assign_and_unassign() {
    let (engine, _dir) = test_engine();
    let task = engine.create(new_task("work")).unwrap();
    let me = actor();

    let assigned = engine.assign_task(task.id.as_str(), Some(me)).unwrap();
    assert_eq!(assigned.task().unwrap().assignee, Some(me));

    let unassigned = engine.assign_task(task.id.as_str(), None).unwrap();
    assert!(unassigned.task().unwrap().assignee.is_none());
}

#[test]
fn task_helpers_reject_non_tasks() {
    let (engine, _dir) = test_engine();
    let doc = engine
        .create(NewElement::new("doc", actor(), ElementBody::Document { content: None }))
        .unwrap();
    assert!(matches!(
        engine.close_task(doc.id.as_str(), None),
        Err(ElementError::InvalidState(_))
    ));
}
