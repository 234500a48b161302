use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};

use crate::{services::websocket_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/ws",
    tag = "sync",
    responses((status = 101, description = "Switching protocols to WebSocket"))
)]
/// Upgrade to a sync session: clients send `listen`, `stopListening` and
/// `clear` frames and receive `update`/`delete` events for the stopwatches they
/// listen on.
pub async fn ws_handler(
    State(state): State<SharedState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| websocket_service::handle_socket(state, socket))
}

/// Single sync endpoint shared by every client.
pub fn router() -> Router<SharedState> {
    Router::new().route("/ws", get(ws_handler))
}
