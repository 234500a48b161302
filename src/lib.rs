//! Library crate for tickshare, exposing modules for binaries and integration tests.

/// HTTP and socket client with the local reconciler.
pub mod client;
/// Command-line arguments and runtime configuration.
pub mod config;
/// Persisted document and storage backends.
pub mod dao;
/// Wire shapes of the HTTP and sync interfaces.
pub mod dto;
mod error;
/// Axum route trees.
pub mod routes;
/// Request handling and background tasks.
pub mod services;
/// Shared in-memory state.
pub mod state;
