// SPDX-License-Identifier: MIT

//! Task queries and lifecycle helpers.

use crate::api::ElementPatch;
use crate::engine::Engine;
use crate::error::ElementError;
use chrono::{DateTime, Utc};
use el_core::{Clock, Element, ElementId, ElementKind, EntityId, TaskStatus, TaskType};

/// Filters shared by the ready and blocked queries.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub assignee: Option<EntityId>,
    pub priority: Option<u8>,
    pub task_type: Option<TaskType>,
    pub limit: Option<usize>,
}

impl TaskFilter {
    fn matches(&self, element: &Element) -> bool {
        let Some(task) = element.task() else {
            return false;
        };
        if let Some(assignee) = &self.assignee {
            if task.assignee.as_ref() != Some(assignee) {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority != priority {
                return false;
            }
        }
        if let Some(task_type) = self.task_type {
            if task.task_type != task_type {
                return false;
            }
        }
        true
    }
}

/// One row of the blocked query.
#[derive(Debug, Clone)]
pub struct BlockedTask {
    pub task: Element,
    /// Absent when the task was manually moved to `blocked` without a
    /// blocking edge behind it.
    pub blocked_by: Option<ElementId>,
    pub reason: String,
}

impl<C: Clock> Engine<C> {
    /// Tasks that are actionable now: status open/in_progress, not in the
    /// blocked cache, and not scheduled into the future.
    ///
    /// Ordered by `(priority, scheduled_for nulls-first, created_at)`.
    pub fn ready_tasks(&self, filter: &TaskFilter) -> Vec<Element> {
        let now = self.clock().now_utc();
        let state = self.state().lock();
        let mut tasks: Vec<Element> = state
            .live_of_kind(ElementKind::Task)
            .filter(|e| {
                let Some(task) = e.task() else { return false };
                matches!(task.status, TaskStatus::Open | TaskStatus::InProgress)
                    && !state.blocked.contains_key(e.id.as_str())
                    && task.scheduled_for.map(|at| at <= now).unwrap_or(true)
                    && filter.matches(e)
            })
            .cloned()
            .collect();

        tasks.sort_by(|a, b| ready_key(a).cmp(&ready_key(b)));
        if let Some(limit) = filter.limit {
            tasks.truncate(limit);
        }
        tasks
    }

    /// Tasks that cannot proceed, with the cached cause.
    pub fn blocked_tasks(&self, filter: &TaskFilter) -> Vec<BlockedTask> {
        let state = self.state().lock();
        let mut rows: Vec<BlockedTask> = state
            .live_of_kind(ElementKind::Task)
            .filter(|e| filter.matches(e))
            .filter_map(|e| {
                let entry = state.blocked.get(e.id.as_str());
                let manual = e.task().map(|t| t.status == TaskStatus::Blocked).unwrap_or(false);
                match entry {
                    Some(entry) => Some(BlockedTask {
                        task: e.clone(),
                        blocked_by: Some(entry.blocked_by),
                        reason: entry.reason.clone(),
                    }),
                    None if manual => Some(BlockedTask {
                        task: e.clone(),
                        blocked_by: None,
                        reason: "Status set to blocked".to_string(),
                    }),
                    None => None,
                }
            })
            .collect();

        rows.sort_by(|a, b| ready_key(&a.task).cmp(&ready_key(&b.task)));
        if let Some(limit) = filter.limit {
            rows.truncate(limit);
        }
        rows
    }

    /// `open → in_progress`.
    pub fn start_task(&self, id: &str) -> Result<Element, ElementError> {
        self.task_status(id, TaskStatus::InProgress)
    }

    pub fn close_task(&self, id: &str, reason: Option<String>) -> Result<Element, ElementError> {
        self.require_kind(id, ElementKind::Task)?;
        let patch = ElementPatch {
            status: Some(TaskStatus::Closed.as_str().to_string()),
            close_reason: reason.map(Some),
            ..Default::default()
        };
        self.update(id, patch, None)
    }

    /// `closed → open`; anything else is inapplicable, not a validation
    /// problem.
    pub fn reopen_task(&self, id: &str) -> Result<Element, ElementError> {
        let current = self.get(id, false)?;
        let status = current
            .task()
            .map(|t| t.status)
            .ok_or_else(|| ElementError::InvalidState(format!("{id} is not a task")))?;
        if status != TaskStatus::Closed {
            return Err(ElementError::InvalidState(format!("{id} is not closed")));
        }
        self.task_status(id, TaskStatus::Open)
    }

    pub fn assign_task(
        &self,
        id: &str,
        assignee: Option<EntityId>,
    ) -> Result<Element, ElementError> {
        self.require_kind(id, ElementKind::Task)?;
        let patch = ElementPatch { assignee: Some(assignee), ..Default::default() };
        self.update(id, patch, None)
    }

    /// Park a task; with `until`, it returns to the ready pool via the
    /// schedule check once undeferred.
    pub fn defer_task(
        &self,
        id: &str,
        until: Option<DateTime<Utc>>,
    ) -> Result<Element, ElementError> {
        self.require_kind(id, ElementKind::Task)?;
        let patch = ElementPatch {
            status: Some(TaskStatus::Deferred.as_str().to_string()),
            scheduled_for: Some(until),
            ..Default::default()
        };
        self.update(id, patch, None)
    }

    pub fn undefer_task(&self, id: &str) -> Result<Element, ElementError> {
        let current = self.get(id, false)?;
        let status = current
            .task()
            .map(|t| t.status)
            .ok_or_else(|| ElementError::InvalidState(format!("{id} is not a task")))?;
        if status != TaskStatus::Deferred {
            return Err(ElementError::InvalidState(format!("{id} is not deferred")));
        }
        let patch = ElementPatch {
            status: Some(TaskStatus::Open.as_str().to_string()),
            scheduled_for: Some(None),
            ..Default::default()
        };
        self.update(id, patch, None)
    }

    fn task_status(&self, id: &str, to: TaskStatus) -> Result<Element, ElementError> {
        self.require_kind(id, ElementKind::Task)?;
        let patch = ElementPatch { status: Some(to.as_str().to_string()), ..Default::default() };
        self.update(id, patch, None)
    }

    fn require_kind(&self, id: &str, kind: ElementKind) -> Result<(), ElementError> {
        let element = self.get(id, false)?;
        if element.kind() != kind {
            return Err(ElementError::InvalidState(format!("{id} is not a {kind}")));
        }
        Ok(())
    }
}

type ReadyKey<'a> = (u8, Option<DateTime<Utc>>, DateTime<Utc>, &'a str);

fn ready_key(element: &Element) -> ReadyKey<'_> {
    let (priority, scheduled_for) = element
        .task()
        .map(|t| (t.priority, t.scheduled_for))
        .unwrap_or((el_core::DEFAULT_PRIORITY, None));
    (priority, scheduled_for, element.created_at, element.id.as_str())
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
