use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for tickshare.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::stopwatch::get_stopwatch,
        crate::routes::stopwatch::put_stopwatch,
        crate::routes::stopwatch::delete_stopwatch,
        crate::routes::group::get_group,
        crate::routes::group::put_group,
        crate::routes::group::delete_group,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::ws::SyncRequest,
            crate::dto::ws::EventKind,
            crate::dto::ws::ErrorReply,
            crate::state::stopwatch::Stopwatch,
            crate::state::stopwatch::StopwatchGroup,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "stopwatch", description = "Live-synced stopwatch records"),
        (name = "group", description = "Named lists of stopwatch ids"),
        (name = "sync", description = "WebSocket subscriptions to stopwatch events"),
    )
)]
pub struct ApiDoc;
