//! services/learner/src/workspace/persistence.rs
//!
//! The timing layer over the notes save: a trailing-edge idle debounce and a
//! periodic flush. Both only ever call `SessionCore::persist`, which allows at
//! most one save in flight.

use std::sync::Arc;

use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::workspace::controller::{SaveOutcome, SavePolicy, SessionCore};

/// Saves dirty notes once the editor has been idle for the debounce period.
///
/// A later edit cancels `token` and schedules a fresh task, so only the last
/// edit of a burst results in a save.
pub(crate) async fn idle_flush(core: Arc<SessionCore>, token: CancellationToken) {
    tokio::select! {
        _ = token.cancelled() => {
            debug!("Idle save superseded.");
            return;
        }
        _ = sleep(core.ctx.timing.save_debounce) => {}
    }

    // Failures are already surfaced to the user by `persist`.
    if let Ok(SaveOutcome::Saved) = core.persist(SavePolicy::IfDirty).await {
        debug!("Idle save completed.");
    }
}

/// Saves dirty notes on a fixed period, independent of typing pauses.
pub(crate) async fn autosave_loop(core: Arc<SessionCore>, shutdown: CancellationToken) {
    let period = core.ctx.timing.autosave_interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Autosave stopped.");
                return;
            }
            _ = ticker.tick() => {}
        }

        if let Ok(SaveOutcome::Saved) = core.persist(SavePolicy::IfDirty).await {
            debug!("Periodic flush saved notes.");
        }
    }
}
