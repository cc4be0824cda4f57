// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! el-playbook: playbook validation and instantiation planning.
//!
//! Playbooks are stored as elements (`el_core::PlaybookFields`); this crate
//! owns the logic around them — structural validation, `{{var}}` template
//! rendering, variable resolution, and turning a playbook plus variables
//! into the task plan a pour materializes.

mod def;
mod pour;
mod template;
mod vars;

pub use def::{validate, DefError};
pub use pour::{plan, PlannedTask, PourError, PourPlan};
pub use template::{is_truthy, render};
pub use vars::{resolve, VariableError};
