// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! el-daemon: the Elemental daemon.
//!
//! Hosts the engine behind an HTTP+SSE surface and manages agent child
//! processes: one reader per live session, per-agent mutual exclusion,
//! and lossy-but-honest fan-out to any number of stream subscribers.

pub mod config;
pub mod env;
pub mod http;
pub mod lifecycle;
pub mod session;
pub mod ticks;

pub use config::Config;
pub use session::{
    AgentCommand, SessionError, SessionManager, SessionSettings, StartOptions,
    StreamSubscription, UwpCheck,
};
