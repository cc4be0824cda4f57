// SPDX-License-Identifier: MIT

//! Playbook variable resolution.

use el_core::{Metadata, VariableDef};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VariableError {
    #[error("required variable missing: {0}")]
    MissingRequired(String),
    #[error("variable {name} expects {expected}")]
    TypeMismatch { name: String, expected: &'static str },
    #[error("variable {0} is not one of the allowed values")]
    NotInEnum(String),
    #[error("unknown variable: {0}")]
    Undeclared(String),
}

/// Merge provided values with declared defaults and validate the result.
///
/// Undeclared provided variables are rejected — silently accepting them
/// hides typos that would otherwise skip a conditional step.
pub fn resolve(
    defs: &[VariableDef],
    provided: &Metadata,
) -> Result<HashMap<String, Value>, VariableError> {
    for name in provided.keys() {
        if !defs.iter().any(|d| d.name == *name) {
            return Err(VariableError::Undeclared(name.clone()));
        }
    }

    let mut resolved = HashMap::with_capacity(defs.len());
    for def in defs {
        let value = match provided.get(&def.name) {
            Some(v) => v.clone(),
            None => match &def.default {
                Some(d) => d.clone(),
                None if def.required => {
                    return Err(VariableError::MissingRequired(def.name.clone()));
                }
                None => continue,
            },
        };

        if !def.var_type.matches(&value) {
            return Err(VariableError::TypeMismatch {
                name: def.name.clone(),
                expected: match def.var_type {
                    el_core::VariableType::String => "string",
                    el_core::VariableType::Number => "number",
                    el_core::VariableType::Boolean => "boolean",
                },
            });
        }

        if !def.one_of.is_empty() && !def.one_of.contains(&value) {
            return Err(VariableError::NotInEnum(def.name.clone()));
        }

        resolved.insert(def.name.clone(), value);
    }
    Ok(resolved)
}

#[cfg(test)]
#[path = "vars_tests.rs"]
mod tests;
