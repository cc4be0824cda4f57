// SPDX-License-Identifier: MIT

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! el-store: durable persistence for the Elemental daemon.
//!
//! The store is event-sourced: every mutation is an [`el_core::Event`]
//! appended to a write-ahead log and applied to the in-memory
//! [`MaterializedState`]. A zstd-compressed snapshot bounds recovery time;
//! boot loads the snapshot and replays WAL entries after its sequence.

mod snapshot;
mod store;
mod wal;

pub mod state;

pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::{BlockedEntry, MaterializedState};
pub use store::{Store, StoreError};
pub use wal::{Wal, WalEntry, WalError};
