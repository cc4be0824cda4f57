// SPDX-License-Identifier: MIT

//! Structural validation of playbook definitions.

use el_core::{task, PlaybookFields};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefError {
    #[error("playbook name is empty")]
    EmptyName,
    #[error("duplicate step id: {0}")]
    DuplicateStep(String),
    #[error("step {step} depends on {reference}, which is not an earlier step")]
    BadStepReference { step: String, reference: String },
    #[error("duplicate variable: {0}")]
    DuplicateVariable(String),
    #[error("variable {0} default does not match its declared type")]
    BadDefault(String),
    #[error("variable {0} enum values do not match its declared type")]
    BadEnum(String),
    #[error("step {step} has out-of-range {field}")]
    BadScale { step: String, field: &'static str },
}

/// Validate a playbook definition.
///
/// `depends_on` may reference only *prior* step ids within the same
/// playbook — no forward or external references — which also makes the
/// induced step DAG acyclic by construction.
pub fn validate(playbook: &PlaybookFields) -> Result<(), DefError> {
    if playbook.name.trim().is_empty() {
        return Err(DefError::EmptyName);
    }

    let mut seen: HashSet<&str> = HashSet::new();
    for step in &playbook.steps {
        if !seen.insert(&step.id) {
            return Err(DefError::DuplicateStep(step.id.clone()));
        }
        // `seen` holds exactly the prior ids (plus this one, already
        // distinct), so membership is the prior-reference check.
        for reference in &step.depends_on {
            if reference == &step.id || !seen.contains(reference.as_str()) {
                return Err(DefError::BadStepReference {
                    step: step.id.clone(),
                    reference: reference.clone(),
                });
            }
        }
        if !task::valid_scale(step.priority) {
            return Err(DefError::BadScale { step: step.id.clone(), field: "priority" });
        }
        if !task::valid_scale(step.complexity) {
            return Err(DefError::BadScale { step: step.id.clone(), field: "complexity" });
        }
    }

    let mut var_names: HashSet<&str> = HashSet::new();
    for var in &playbook.variables {
        if !var_names.insert(&var.name) {
            return Err(DefError::DuplicateVariable(var.name.clone()));
        }
        if let Some(default) = &var.default {
            if !var.var_type.matches(default) {
                return Err(DefError::BadDefault(var.name.clone()));
            }
        }
        if var.one_of.iter().any(|v| !var.var_type.matches(v)) {
            return Err(DefError::BadEnum(var.name.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "def_tests.rs"]
mod tests;
