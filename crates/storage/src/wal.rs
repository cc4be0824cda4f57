// SPDX-License-Identifier: MIT

//! Append-only write-ahead log of events.
//!
//! One JSON entry per line: `{"seq": N, "event": {...}}`. Sequence numbers
//! start at 1 and never reset; a snapshot records the sequence it covers
//! and recovery replays everything after it. A torn final line (crash mid
//! write) is tolerated: replay stops at the last complete entry.

use el_core::Event;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum WalError {
    #[error("WAL io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("WAL serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One committed log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

/// The write-ahead log.
///
/// `processed_seq` tracks how far replay has consumed the log; entries at
/// or below it are covered by the snapshot the caller recovered from.
pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    write_seq: u64,
    processed_seq: u64,
    /// Entries not yet handed out by [`Wal::next_unprocessed`].
    pending: VecDeque<WalEntry>,
}

impl Wal {
    /// Open (creating if absent) the log at `path`.
    ///
    /// Entries with `seq <= processed_seq` are skipped; the rest queue up
    /// for replay via [`Wal::next_unprocessed`].
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut pending = VecDeque::new();
        let mut write_seq = processed_seq;
        let mut valid_len: u64 = 0;

        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    valid_len += line.len() as u64 + 1;
                    continue;
                }
                match serde_json::from_str::<WalEntry>(&line) {
                    Ok(entry) => {
                        valid_len += line.len() as u64 + 1;
                        write_seq = write_seq.max(entry.seq);
                        if entry.seq > processed_seq {
                            pending.push_back(entry);
                        }
                    }
                    Err(e) => {
                        // Torn tail from a crash mid-append; everything
                        // before it is intact.
                        warn!(path = %path.display(), error = %e, "truncating torn WAL tail");
                        break;
                    }
                }
            }
        }

        let file = OpenOptions::new().create(true).append(false).write(true).read(true).open(&path)?;
        file.set_len(valid_len)?;
        let mut writer = BufWriter::new(file);
        writer.seek(SeekFrom::End(0))?;

        Ok(Self { path, writer, write_seq, processed_seq, pending })
    }

    /// Append an event, returning its sequence number.
    ///
    /// The entry is buffered; call [`Wal::flush`] to make it durable.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        let seq = self.write_seq + 1;
        let entry = WalEntry { seq, event: event.clone() };
        let line = serde_json::to_string(&entry)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.write_seq = seq;
        self.pending.push_back(entry);
        Ok(seq)
    }

    /// Flush buffered entries and fsync.
    pub fn flush(&mut self) -> Result<(), WalError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    /// Next entry past `processed_seq`, or `None` when replay is caught up.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        while let Some(entry) = self.pending.pop_front() {
            if entry.seq > self.processed_seq {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Record that every entry up to `seq` has been applied.
    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    /// Entries appended since the sequence the last snapshot covered.
    pub fn len_since(&self, snapshot_seq: u64) -> u64 {
        self.write_seq.saturating_sub(snapshot_seq)
    }

    /// Drop the log contents after a snapshot has captured everything.
    ///
    /// Only valid when replay is caught up; sequence numbering continues
    /// from `write_seq`, so compaction never reuses a sequence.
    pub fn compact(&mut self) -> Result<(), WalError> {
        if self.processed_seq < self.write_seq || !self.pending.is_empty() {
            return Ok(());
        }
        self.writer.flush()?;
        self.writer.get_ref().set_len(0)?;
        self.writer.seek(SeekFrom::Start(0))?;
        self.writer.get_ref().sync_data()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
