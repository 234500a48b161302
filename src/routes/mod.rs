use axum::Router;

use crate::state::SharedState;

/// Swagger UI.
pub mod docs;
/// Group records.
pub mod group;
/// Health check.
pub mod health;
/// Stopwatch records.
pub mod stopwatch;
/// Sync socket upgrade.
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(stopwatch::router())
        .merge(group::router())
        .merge(websocket::router())
        .merge(docs::router());

    api_router.with_state(state)
}
