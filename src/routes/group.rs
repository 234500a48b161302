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
    state::{SharedState, stopwatch::StopwatchGroup},
};

/// Routes reading and replacing stopwatch groups.
pub fn router() -> Router<SharedState> {
    Router::new().route(
        "/stopwatchgroup/{id}",
        get(get_group).put(put_group).delete(delete_group),
    )
}

/// Fetch a group, materializing an empty one for unknown ids.
#[utoipa::path(
    get,
    path = "/stopwatchgroup/{id}",
    tag = "group",
    params(("id" = String, Path, description = "Opaque group identifier")),
    responses(
        (status = 200, description = "Stored or default group", body = StopwatchGroup)
    )
)]
pub async fn get_group(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Json<StopwatchGroup> {
    Json(stopwatch_service::get_group(&state, &id).await)
}

/// Replace a group's name and member list.
#[utoipa::path(
    put,
    path = "/stopwatchgroup/{id}",
    tag = "group",
    params(("id" = String, Path, description = "Opaque group identifier")),
    request_body = StopwatchGroup,
    responses(
        (status = 200, description = "Group replaced"),
        (status = 400, description = "Body is not JSON")
    )
)]
pub async fn put_group(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    stopwatch_service::put_group(&state, &id, &body).await?;
    Ok(StatusCode::OK)
}

/// Remove a group; its member stopwatches are kept.
#[utoipa::path(
    delete,
    path = "/stopwatchgroup/{id}",
    tag = "group",
    params(("id" = String, Path, description = "Opaque group identifier")),
    responses((status = 200, description = "Group deleted"))
)]
pub async fn delete_group(State(state): State<SharedState>, Path(id): Path<String>) -> StatusCode {
    stopwatch_service::delete_group(&state, &id).await;
    StatusCode::OK
}
