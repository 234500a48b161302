/// Persisted state document.
pub mod models;
/// Persistence backends for the state document.
pub mod state_store;
/// Storage error types shared by every backend.
pub mod storage;
