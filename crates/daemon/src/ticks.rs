// SPDX-License-Identifier: MIT

//! Background maintenance: timer-gate re-checks and snapshot compaction.

use crate::config::Config;
use el_core::Clock;
use el_engine::Engine;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const SNAPSHOT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Spawn the maintenance loops; both stop when `cancel` fires.
pub fn spawn<C: Clock + 'static>(
    engine: Arc<Engine<C>>,
    config: &Config,
    cancel: CancellationToken,
) {
    let tick = Duration::from_millis(config.timer_tick_ms.max(50));
    let threshold = config.snapshot_threshold;

    {
        let engine = Arc::clone(&engine);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            // Catch up immediately: timers may have come due while the
            // daemon was down.
            let changed = engine.tick_timers();
            if changed > 0 {
                debug!(changed, "startup timer sweep");
            }
            let mut interval = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let changed = engine.tick_timers();
                        if changed > 0 {
                            debug!(changed, "timer gates released");
                        }
                    }
                }
            }
        });
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SNAPSHOT_CHECK_INTERVAL);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => engine.maybe_snapshot(threshold),
            }
        }
    });
}
