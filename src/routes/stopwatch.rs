use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::{
    error::AppError,
    services::stopwatch_service,
    state::{SharedState, stopwatch::Stopwatch},
};

/// Routes reading and replacing individual stopwatches.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/stopwatch/{id}",
        get(get_stopwatch).put(put_stopwatch).delete(delete_stopwatch),
    )
}

/// Fetch a stopwatch, materializing the default record for unknown ids.
#[utoipa::path(
    get,
    path = "/stopwatch/{id}",
    tag = "stopwatch",
    params(("id" = String, Path, description = "Opaque stopwatch identifier")),
    responses(
        (status = 200, description = "Stored or default stopwatch", body = Stopwatch)
    )
)]
pub async fn get_stopwatch(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Json<Stopwatch> {
    Json(stopwatch_service::get_stopwatch(&state, &id).await)
}

/// Replace a stopwatch and push an `update` event to its listeners.
#[utoipa::path(
    put,
    path = "/stopwatch/{id}",
    tag = "stopwatch",
    params(("id" = String, Path, description = "Opaque stopwatch identifier")),
    request_body = Stopwatch,
    responses(
        (status = 200, description = "Stopwatch replaced"),
        (status = 400, description = "Body is not JSON")
    )
)]
pub async fn put_stopwatch(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    stopwatch_service::put_stopwatch(&state, &id, &body).await?;
    Ok(StatusCode::OK)
}

/// Push a `delete` event to the stopwatch's listeners, then remove it.
#[utoipa::path(
    delete,
    path = "/stopwatch/{id}",
    tag = "stopwatch",
    params(("id" = String, Path, description = "Opaque stopwatch identifier")),
    responses((status = 200, description = "Stopwatch deleted"))
)]
pub async fn delete_stopwatch(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> StatusCode {
    stopwatch_service::delete_stopwatch(&state, &id).await;
    StatusCode::OK
}
