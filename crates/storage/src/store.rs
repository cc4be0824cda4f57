// SPDX-License-Identifier: MIT

//! Store facade: snapshot + WAL recovery and the commit path.

use crate::snapshot::{Snapshot, SnapshotError};
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use chrono::{DateTime, Utc};
use el_core::Event;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const WAL_FILE: &str = "events.wal";
const SNAPSHOT_FILE: &str = "state.snapshot";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Durable backing for the materialized state.
///
/// The caller owns the state and the locking discipline; the store owns
/// the files. `open` performs recovery; `commit` makes one event durable;
/// `snapshot` compacts.
pub struct Store {
    dir: PathBuf,
    wal: Wal,
    snapshot_seq: u64,
}

impl Store {
    /// Recover state from `dir`: load the snapshot (if any), then replay
    /// WAL entries past its sequence. Runtime indexes are rebuilt; the
    /// blocked cache is left empty for the engine to rebuild.
    pub fn open(dir: impl AsRef<Path>) -> Result<(Store, MaterializedState), StoreError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(WalError::Io)?;

        let snapshot_path = dir.join(SNAPSHOT_FILE);
        let (mut state, snapshot_seq) = match Snapshot::load(&snapshot_path)? {
            Some(snapshot) => (snapshot.state, snapshot.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(dir.join(WAL_FILE), snapshot_seq)?;
        let mut replayed = 0u64;
        while let Some(entry) = wal.next_unprocessed()? {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
            replayed += 1;
        }
        state.rebuild_indexes();

        if replayed > 0 || snapshot_seq > 0 {
            info!(snapshot_seq, replayed, "store recovered");
        }

        Ok((Store { dir, wal, snapshot_seq }, state))
    }

    /// Append one event and fsync. Returns the committed sequence.
    ///
    /// The caller applies the event to its state while still holding the
    /// state lock, which is what makes mutation + cache update atomic from
    /// the perspective of other callers.
    pub fn commit(&mut self, event: &Event) -> Result<u64, StoreError> {
        let seq = self.wal.append(event)?;
        self.wal.flush()?;
        // Commit implies inline application; nothing is left to replay.
        while let Some(entry) = self.wal.next_unprocessed()? {
            self.wal.mark_processed(entry.seq);
        }
        Ok(seq)
    }

    /// Entries committed since the last snapshot (compaction trigger).
    pub fn wal_backlog(&self) -> u64 {
        self.wal.len_since(self.snapshot_seq)
    }

    /// Snapshot the given state and compact the WAL.
    pub fn snapshot(
        &mut self,
        state: &MaterializedState,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let seq = self.wal.write_seq();
        Snapshot::save(&self.dir.join(SNAPSHOT_FILE), state, seq, at)?;
        self.snapshot_seq = seq;
        self.wal.compact()?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
