// SPDX-License-Identifier: MIT

//! Playbook template data: steps and variable declarations.
//!
//! Validation and instantiation logic lives in `el-playbook`; this module
//! only defines the shapes stored on a `playbook` element.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One templated step of a playbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDef {
    /// Step id, unique within the playbook; referenced by `depends_on`.
    pub id: String,
    /// Task title template (`{{var}}` interpolation).
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    /// Template whose rendered value decides inclusion; absent means
    /// the step is always included.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default = "default_scale")]
    pub priority: u8,
    #[serde(default = "default_scale")]
    pub complexity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_scale() -> u8 {
    crate::task::DEFAULT_PRIORITY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableType {
    String,
    Number,
    Boolean,
}

crate::simple_display! {
    VariableType {
        String => "string",
        Number => "number",
        Boolean => "boolean",
    }
}

impl VariableType {
    /// Whether a JSON value inhabits this type.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            VariableType::String => value.is_string(),
            VariableType::Number => value.is_number(),
            VariableType::Boolean => value.is_boolean(),
        }
    }
}

/// Declared playbook variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDef {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values; empty means unconstrained.
    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Value>,
}

/// Kind-specific fields of a `playbook` element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookFields {
    /// Unique within the workspace; pour resolves by name or id.
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<StepDef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<VariableDef>,
}
