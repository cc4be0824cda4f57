// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! el-wire: HTTP surface contract shared by the daemon and the CLI.
//!
//! Request/response DTOs plus the stable error code table. Adapters stay
//! thin: core types that already serialize cleanly pass through as-is.

mod error;
mod request;
mod response;

pub use error::{ErrorBody, ErrorCode, ErrorDetail};
pub use request::{
    AddDependencyRequest, CreateTaskRequest, CreateWorkflowRequest, DispatchRequest, GcRequest,
    PourRequest, RegisterEntityRequest, ResumeSessionRequest, SendInputRequest,
    StartSessionRequest, StopSessionRequest, UpdateTaskRequest, UpdateWorkflowRequest,
};
pub use response::{
    BlockedTaskEntry, GcResponse, MessagesResponse, PourResponse, ProgressResponse, SessionList,
    TaskDetail, TaskList, WorkflowTasksResponse,
};
