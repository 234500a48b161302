/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Stopwatch and group record operations.
pub mod stopwatch_service;
/// Debounced persistence of the state document.
pub mod storage_supervisor;
/// WebSocket connection and message handling service.
pub mod websocket_service;
