// SPDX-License-Identifier: MIT

//! Pour planning: playbook + variables → concrete task plan.
//!
//! Pure computation; the engine materializes the plan into elements and
//! `blocks` edges.

use crate::template::{is_truthy, render};
use crate::vars::{resolve, VariableError};
use crate::{validate, DefError};
use el_core::{Metadata, PlaybookFields};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PourError {
    #[error(transparent)]
    Invalid(#[from] DefError),
    #[error(transparent)]
    Variable(#[from] VariableError),
}

/// One task the pour will create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTask {
    pub step_id: String,
    pub title: String,
    pub priority: u8,
    pub complexity: u8,
    pub description: Option<String>,
    /// Step ids this task blocks on, already filtered to included steps.
    pub depends_on: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PourPlan {
    pub tasks: Vec<PlannedTask>,
    pub skipped_steps: Vec<String>,
    /// Resolved variables, for recording on the workflow element.
    pub variables: Metadata,
}

/// Evaluate conditions and render titles for every step.
///
/// Steps whose condition renders falsy are skipped; dependencies onto
/// skipped steps are dropped from the plan.
pub fn plan(playbook: &PlaybookFields, provided: &Metadata) -> Result<PourPlan, PourError> {
    validate(playbook)?;
    let vars = resolve(&playbook.variables, provided)?;

    let mut plan = PourPlan::default();
    let mut included: Vec<&str> = Vec::new();

    for step in &playbook.steps {
        let include = match &step.condition {
            Some(condition) => is_truthy(&render(condition, &vars)),
            None => true,
        };
        if !include {
            plan.skipped_steps.push(step.id.clone());
            continue;
        }

        plan.tasks.push(PlannedTask {
            step_id: step.id.clone(),
            title: render(&step.title, &vars),
            priority: step.priority,
            complexity: step.complexity,
            description: step.description.as_ref().map(|d| render(d, &vars)),
            depends_on: step
                .depends_on
                .iter()
                .filter(|d| included.contains(&d.as_str()))
                .cloned()
                .collect(),
        });
        included.push(&step.id);
    }

    plan.variables = vars.into_iter().collect();
    Ok(plan)
}

#[cfg(test)]
#[path = "pour_tests.rs"]
mod tests;
