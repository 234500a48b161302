/// Authoritative stopwatch and group records.
pub mod records;
/// Live subscriptions per stopwatch id.
pub mod registry;
/// Record types and their time semantics.
pub mod stopwatch;

use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};

use crate::{
    config::AppConfig,
    dao::{models::PersistedState, state_store::StateStore},
};

pub use self::records::RecordStore;
pub use self::registry::{ConnectionId, ListenerChannel, SubscriptionRegistry};

/// Handle to [`AppState`] cloned into every handler and task.
pub type SharedState = Arc<AppState>;

/// Outcome of the most recent attempts to write the state document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistenceStatus {
    /// Completion time of the last successful write.
    pub last_success: Option<SystemTime>,
    /// Message of the last failure, cleared by the next success.
    pub last_error: Option<String>,
    /// Number of successful writes since startup.
    pub writes: u64,
    /// Store revision contained in the last successful write.
    pub flushed_revision: u64,
}

/// Central application state: records, live subscriptions, and the persistence backend.
///
/// Every service is constructed here and handed out by reference; nothing is
/// reachable through globals, so tests can build as many isolated states as
/// they need.
pub struct AppState {
    config: AppConfig,
    registry: Arc<SubscriptionRegistry>,
    records: RecordStore,
    backend: Arc<dyn StateStore>,
    persistence: Mutex<PersistenceStatus>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// `initial` is the document restored from `backend` at startup.
    pub fn new(
        config: AppConfig,
        backend: Arc<dyn StateStore>,
        initial: PersistedState,
    ) -> SharedState {
        let registry = Arc::new(SubscriptionRegistry::new());
        Arc::new(Self {
            config,
            records: RecordStore::new(initial, registry.clone()),
            registry,
            backend,
            persistence: Mutex::new(PersistenceStatus::default()),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Authoritative stopwatch and group records.
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// Live subscriptions keyed by stopwatch id.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Durable backend the persistence worker writes to.
    pub fn backend(&self) -> &Arc<dyn StateStore> {
        &self.backend
    }

    /// Copy of the persistence bookkeeping.
    pub fn persistence_status(&self) -> PersistenceStatus {
        self.lock_persistence().clone()
    }

    /// Whether the last write attempt failed.
    pub fn is_degraded(&self) -> bool {
        self.lock_persistence().last_error.is_some()
    }

    /// Record a successful write of the document at `revision`.
    pub fn record_flush_success(&self, revision: u64) {
        let mut status = self.lock_persistence();
        status.last_success = Some(SystemTime::now());
        status.last_error = None;
        status.writes += 1;
        status.flushed_revision = status.flushed_revision.max(revision);
    }

    /// Record a failed write.
    pub fn record_flush_failure(&self, message: String) {
        self.lock_persistence().last_error = Some(message);
    }

    fn lock_persistence(&self) -> std::sync::MutexGuard<'_, PersistenceStatus> {
        self.persistence
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
