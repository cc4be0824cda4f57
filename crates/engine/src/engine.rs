// SPDX-License-Identifier: MIT

//! The engine: state + store + bus behind one handle.
//!
//! Initialization order is explicit: open the store (recovery), rebuild
//! the blocked cache, then hand the engine to adapters. No globals — the
//! daemon passes `Arc<Engine>` to whatever needs it.

use crate::blocked;
use crate::bus::{ChangeEvent, EventBus};
use crate::worktree::WorktreeConfig;
use el_core::{Clock, Event, SystemClock};
use el_store::{MaterializedState, Store, StoreError};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

pub struct Engine<C: Clock = SystemClock> {
    state: Arc<Mutex<MaterializedState>>,
    store: Mutex<Store>,
    bus: EventBus,
    clock: C,
    worktrees: WorktreeConfig,
}

impl Engine<SystemClock> {
    /// Open the store under `state_dir` and boot with the system clock.
    pub fn open(state_dir: &Path, worktrees: WorktreeConfig) -> Result<Self, StoreError> {
        Self::open_with_clock(state_dir, worktrees, SystemClock)
    }
}

impl<C: Clock> Engine<C> {
    pub fn open_with_clock(
        state_dir: &Path,
        worktrees: WorktreeConfig,
        clock: C,
    ) -> Result<Self, StoreError> {
        let (store, mut state) = Store::open(state_dir)?;

        // The cache is wholly derived; recovery always rebuilds it.
        let now = clock.now_utc();
        blocked::rebuild(&mut state, now);
        info!(elements = state.elements.len(), blocked = state.blocked.len(), "engine booted");

        Ok(Self {
            state: Arc::new(Mutex::new(state)),
            store: Mutex::new(store),
            bus: EventBus::new(),
            clock,
            worktrees,
        })
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub(crate) fn state(&self) -> &Arc<Mutex<MaterializedState>> {
        &self.state
    }

    pub(crate) fn worktree_config(&self) -> &WorktreeConfig {
        &self.worktrees
    }

    /// Commit an event and apply it to the already-locked state.
    ///
    /// Called with the state lock held so that the WAL append, the state
    /// change, and the follow-up cache invalidation are one atomic unit
    /// from the perspective of every other caller.
    pub(crate) fn commit_locked(
        &self,
        state: &mut MaterializedState,
        event: Event,
    ) -> Result<(), StoreError> {
        self.store.lock().commit(&event)?;
        state.apply_event(&event);
        Ok(())
    }

    /// Publish after the state lock is released.
    pub(crate) fn publish(&self, event: ChangeEvent) {
        self.bus.publish(event);
    }

    /// Run one pass over the shared state under the lock.
    pub fn with_state<T>(&self, f: impl FnOnce(&MaterializedState) -> T) -> T {
        f(&self.state.lock())
    }

    /// Re-check timer gates that have come due; the daemon calls this on
    /// a periodic tick. Returns how many cache entries changed.
    pub fn tick_timers(&self) -> usize {
        let now = self.clock.now_utc();
        let mut state = self.state.lock();
        blocked::tick_due_timers(&mut state, now)
    }

    /// Snapshot when the WAL backlog passes `threshold`; used by the
    /// daemon's maintenance loop and at clean shutdown.
    pub fn maybe_snapshot(&self, threshold: u64) {
        let backlog = self.store.lock().wal_backlog();
        if backlog < threshold {
            return;
        }
        let state = self.state.lock();
        if let Err(e) = self.store.lock().snapshot(&state, self.clock.now_utc()) {
            error!(error = %e, "snapshot failed; WAL keeps growing until the next pass");
        }
    }

    /// Unconditional snapshot (clean shutdown).
    pub fn snapshot_now(&self) -> Result<(), StoreError> {
        let state = self.state.lock();
        self.store.lock().snapshot(&state, self.clock.now_utc())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
