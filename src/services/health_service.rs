use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Summarize record counts, live subscriptions, and persistence health.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let (stopwatches, groups) = state.records().counts().await;
    let persistence = state.persistence_status();

    let status = match &persistence.last_error {
        Some(error) => {
            warn!(%error, "last state write failed (degraded mode)");
            HealthResponse::degraded()
        }
        None => HealthResponse::ok(),
    };

    status
        .with_counts(stopwatches, groups, state.registry().subscription_count())
        .with_last_persisted(persistence.last_success)
}
