// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! el-core: data model for the Elemental workspace orchestrator.
//!
//! Everything the daemon persists is an [`Element`] — a uniform record with
//! kind-specific fields — or a [`Dependency`] edge between two elements.
//! This crate defines those records, the WAL [`Event`] facts derived from
//! mutations, and the session/worktree records the daemon tracks.

pub mod macros;

pub mod clock;
pub mod dependency;
pub mod element;
pub mod event;
pub mod id;
pub mod message;
pub mod playbook;
pub mod session;
pub mod task;
pub mod workflow;
pub mod worktree;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use dependency::{
    DepKey, Dependency, DependencyFamily, DependencyType, Gate, GateError, GateKind,
};
pub use element::{
    Element, ElementBody, ElementId, ElementKind, EntityId, EntityType, Metadata, SYSTEM_ENTITY,
};
pub use event::Event;
pub use id::IdBuf;
pub use message::{MessageKind, MessageRecord};
pub use playbook::{PlaybookFields, StepDef, VariableDef, VariableType};
pub use session::{
    AgentEvent, AgentEventKind, SessionEvent, SessionId, SessionMode, SessionRecord, SessionStatus,
    SessionTransitionError, ToolCall,
};
pub use task::{TaskFields, TaskStatus, TaskType, TransitionError, DEFAULT_COMPLEXITY,
    DEFAULT_PRIORITY};
pub use workflow::{WorkflowFields, WorkflowStatus};
pub use worktree::{WorktreeRecord, WorktreeState, WorktreeTransitionError};
