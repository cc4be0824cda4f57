// SPDX-License-Identifier: MIT

//! Workflow operations: pour, progress, squash, burn, gc.

use crate::api::{ElementPatch, NewElement};
use crate::blocked;
use crate::bus::{ChangeAction, ChangeEvent};
use crate::engine::Engine;
use crate::error::ElementError;
use chrono::Duration;
use el_core::{
    Clock, DependencyType, Element, ElementBody, ElementId, ElementKind, EntityId, Event,
    Metadata, TaskFields, TaskStatus, WorkflowFields,
};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::info;

/// Result of a pour.
#[derive(Debug, Clone)]
pub struct PourOutcome {
    pub workflow: Element,
    pub task_ids: Vec<ElementId>,
    pub skipped_steps: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct WorkflowProgress {
    pub workflow_id: ElementId,
    pub total_tasks: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub ready_tasks: Vec<ElementId>,
    pub blocked_tasks: Vec<ElementId>,
    /// `round(100 * closed / total)`, 0 for an empty workflow.
    pub completion_percentage: u32,
}

#[derive(Debug, Clone)]
pub struct GcReport {
    pub candidates: Vec<ElementId>,
    pub burned: usize,
    pub dry_run: bool,
}

impl<C: Clock> Engine<C> {
    /// Instantiate a playbook: create tasks for included steps, translate
    /// step dependencies into `blocks` edges, and parent every task under
    /// a fresh pending workflow.
    pub fn pour_workflow(
        &self,
        playbook_ref: &str,
        variables: Metadata,
        ephemeral: bool,
        title: Option<String>,
        created_by: EntityId,
    ) -> Result<PourOutcome, ElementError> {
        let (playbook_id, fields) = {
            let state = self.state().lock();
            let element = state
                .playbook_by_ref(playbook_ref)
                .filter(|e| !e.is_deleted())
                .ok_or_else(|| ElementError::NotFound(playbook_ref.to_string()))?;
            let fields = element
                .playbook()
                .cloned()
                .ok_or_else(|| ElementError::InvalidState(format!("{playbook_ref} is not a playbook")))?;
            (element.id, fields)
        };

        let plan = el_playbook::plan(&fields, &variables)?;

        let workflow = self.create(NewElement::new(
            title.unwrap_or_else(|| fields.name.clone()),
            created_by,
            ElementBody::Workflow(WorkflowFields {
                ephemeral,
                playbook_id: Some(playbook_id),
                variables: plan.variables.clone(),
                ..Default::default()
            }),
        ))?;

        let mut by_step: HashMap<String, ElementId> = HashMap::new();
        let mut task_ids = Vec::with_capacity(plan.tasks.len());
        for planned in &plan.tasks {
            let task = self.create(NewElement::new(
                planned.title.clone(),
                created_by,
                ElementBody::Task(TaskFields {
                    priority: planned.priority,
                    complexity: planned.complexity,
                    description: planned.description.clone(),
                    ephemeral,
                    ..Default::default()
                }),
            ))?;
            by_step.insert(planned.step_id.clone(), task.id);
            task_ids.push(task.id);
        }

        for planned in &plan.tasks {
            let source = by_step[&planned.step_id];
            for dep_step in &planned.depends_on {
                let target = by_step[dep_step];
                self.add_dependency(
                    source.as_str(),
                    target.as_str(),
                    DependencyType::Blocks,
                    Metadata::new(),
                    created_by,
                )?;
            }
            self.add_dependency(
                source.as_str(),
                workflow.id.as_str(),
                DependencyType::ParentChild,
                Metadata::new(),
                created_by,
            )?;
        }

        info!(
            workflow = %workflow.id,
            playbook = %fields.name,
            tasks = task_ids.len(),
            skipped = plan.skipped_steps.len(),
            "workflow poured"
        );
        Ok(PourOutcome { workflow, task_ids, skipped_steps: plan.skipped_steps })
    }

    /// Tasks reachable from the workflow through `parent-child` chains.
    pub fn workflow_tasks(&self, id: &str) -> Result<Vec<Element>, ElementError> {
        let state = self.state().lock();
        let workflow = state
            .element(id)
            .filter(|e| !e.is_deleted() && e.kind() == ElementKind::Workflow)
            .ok_or_else(|| ElementError::NotFound(id.to_string()))?;

        let mut tasks: Vec<Element> = collect_children(&state, workflow.id)
            .into_iter()
            .filter_map(|cid| state.element(cid.as_str()))
            .filter(|e| !e.is_deleted() && e.kind() == ElementKind::Task)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| (a.created_at, a.id.as_str()).cmp(&(b.created_at, b.id.as_str())));
        Ok(tasks)
    }

    pub fn workflow_progress(&self, id: &str) -> Result<WorkflowProgress, ElementError> {
        let now = self.clock().now_utc();
        let state = self.state().lock();
        let workflow = state
            .element(id)
            .filter(|e| !e.is_deleted() && e.kind() == ElementKind::Workflow)
            .ok_or_else(|| ElementError::NotFound(id.to_string()))?;

        let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();
        let mut ready = Vec::new();
        let mut blocked = Vec::new();
        let mut total = 0usize;
        let mut closed = 0usize;

        for cid in collect_children(&state, workflow.id) {
            let Some(task) = state
                .element(cid.as_str())
                .filter(|e| !e.is_deleted() && e.kind() == ElementKind::Task)
            else {
                continue;
            };
            let Some(fields) = task.task() else { continue };
            total += 1;
            *status_counts.entry(fields.status.as_str().to_string()).or_default() += 1;
            if fields.status == TaskStatus::Closed {
                closed += 1;
            }
            if state.blocked.contains_key(cid.as_str()) {
                blocked.push(cid);
            } else if matches!(fields.status, TaskStatus::Open | TaskStatus::InProgress)
                && fields.scheduled_for.map(|at| at <= now).unwrap_or(true)
            {
                ready.push(cid);
            }
        }

        let completion_percentage = if total == 0 {
            0
        } else {
            ((closed as f64 / total as f64) * 100.0).round() as u32
        };

        Ok(WorkflowProgress {
            workflow_id: workflow.id,
            total_tasks: total,
            status_counts,
            ready_tasks: ready,
            blocked_tasks: blocked,
            completion_percentage,
        })
    }

    /// Make an ephemeral workflow durable. Idempotent.
    pub fn squash_workflow(&self, id: &str) -> Result<Element, ElementError> {
        let current = self.get(id, false)?;
        let fields = current
            .workflow()
            .ok_or_else(|| ElementError::InvalidState(format!("{id} is not a workflow")))?;
        if !fields.ephemeral {
            return Ok(current);
        }
        self.update(id, ElementPatch { ephemeral: Some(false), ..Default::default() }, None)
    }

    /// Hard-delete a workflow and its direct child tasks, edges included.
    ///
    /// Refused for durable workflows unless `force`.
    pub fn burn_workflow(&self, id: &str, force: bool) -> Result<Vec<ElementId>, ElementError> {
        let now = self.clock().now_utc();
        let purged;
        {
            let mut state = self.state().lock();
            let workflow = state
                .element(id)
                .filter(|e| !e.is_deleted() && e.kind() == ElementKind::Workflow)
                .ok_or_else(|| ElementError::NotFound(id.to_string()))?;
            let fields = workflow
                .workflow()
                .ok_or_else(|| ElementError::InvalidState(format!("{id} is not a workflow")))?;
            if !fields.ephemeral && !force {
                return Err(ElementError::InvalidState(format!(
                    "{id} is durable; burn requires force"
                )));
            }
            let workflow_id = workflow.id;

            // Direct children only: one hop through parent-child.
            let mut doomed: Vec<ElementId> = direct_children(&state, workflow_id);
            doomed.push(workflow_id);
            let doomed_set: HashSet<ElementId> = doomed.iter().copied().collect();

            // Anything outside the burn set that blocks on a burned element
            // needs a recompute once the edges are gone.
            let mut outside: HashSet<ElementId> = HashSet::new();
            for id in &doomed {
                if let Some(refs) = state.dependents.get(id.as_str()) {
                    for (source, dep_type) in refs {
                        if dep_type.is_blocking() && !doomed_set.contains(source) {
                            outside.insert(*source);
                        }
                    }
                }
            }

            for id in &doomed {
                self.commit_locked(&mut state, Event::ElementPurged { id: *id })?;
            }
            for source in outside {
                blocked::invalidate_cascade(&mut state, source, now);
            }
            purged = doomed;
        }

        for id in &purged {
            self.publish(ChangeEvent::Element { id: *id, action: ChangeAction::Purged });
        }
        info!(count = purged.len(), "workflow burned");
        Ok(purged)
    }

    /// Collect (and optionally burn) expired ephemeral workflows.
    pub fn gc_workflows(&self, max_age_ms: i64, dry_run: bool) -> Result<GcReport, ElementError> {
        let now = self.clock().now_utc();
        let cutoff = Duration::milliseconds(max_age_ms);
        let candidates: Vec<ElementId> = {
            let state = self.state().lock();
            state
                .live_of_kind(ElementKind::Workflow)
                .filter(|e| {
                    e.workflow()
                        .map(|w| {
                            w.ephemeral
                                && w.status.is_terminal()
                                && w.finished_at.map(|f| f + cutoff <= now).unwrap_or(false)
                        })
                        .unwrap_or(false)
                })
                .map(|e| e.id)
                .collect()
        };

        let mut burned = 0;
        if !dry_run {
            for id in &candidates {
                self.burn_workflow(id.as_str(), false)?;
                burned += 1;
            }
        }
        Ok(GcReport { candidates, burned, dry_run })
    }
}

/// Direct children: sources of parent-child edges targeting `id`.
fn direct_children(state: &el_store::MaterializedState, id: ElementId) -> Vec<ElementId> {
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

/// All elements reachable against parent-child edges, cycle-safe.
fn collect_children(state: &el_store::MaterializedState, root: ElementId) -> Vec<ElementId> {
    let mut seen: HashSet<ElementId> = HashSet::new();
    let mut queue: VecDeque<ElementId> = direct_children(state, root).into();
    let mut out = Vec::new();
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        out.push(id);
        for child in direct_children(state, id) {
            queue.push_back(child);
        }
    }
    out
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
