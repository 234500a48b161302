use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{
    dao::{models::PersistedState, state_store::StateStore},
    state::SharedState,
};

/// Read the persisted document once at startup.
///
/// A missing, unreadable, or corrupt document is logged and replaced by an
/// empty one: the server always starts.
pub async fn restore(backend: &dyn StateStore) -> PersistedState {
    match backend.load().await {
        Ok(state) => {
            info!(
                stopwatches = state.stopwatchs.len(),
                groups = state.stopwatch_groups.len(),
                "restored persisted state"
            );
            state
        }
        Err(err) => {
            warn!(error = %err, "failed to restore persisted state; starting empty");
            PersistedState::default()
        }
    }
}

/// Write the state document whenever it changed, at most once per persistence window.
///
/// The first mutation after a quiet period arms the window; when it closes,
/// the latest document is written in one go, covering every mutation that
/// landed meanwhile. A mutation arriving during the write arms the next
/// window. A failed write re-arms the window on its own, so the latest state
/// is retried once per window until a write succeeds. Persistence is
/// therefore eventual: a crash inside a window loses that window's mutations.
pub async fn run(state: SharedState) {
    let window = state.config().persist_window();
    let mut retry = false;
    loop {
        if !retry {
            state.records().changed().await;
        }
        sleep(window).await;
        retry = !flush_pending(&state).await;
    }
}

/// Write the current document if it holds mutations not yet written.
///
/// Returns `false` when the write failed. Failures are logged and recorded for
/// the health report; the in-memory records are unaffected and the next flush
/// retries with the latest state.
pub async fn flush_pending(state: &SharedState) -> bool {
    let flushed = state.persistence_status().flushed_revision;
    if state.records().revision() == flushed {
        debug!(revision = flushed, "state already persisted; skipping write");
        return true;
    }

    let (revision, document) = state.records().snapshot().await;
    match state.backend().save(document).await {
        Ok(()) => {
            debug!(revision, "state persisted");
            state.record_flush_success(revision);
            true
        }
        Err(err) => {
            warn!(revision, error = %err, "failed to persist state");
            state.record_flush_failure(err.to_string());
            false
        }
    }
}
