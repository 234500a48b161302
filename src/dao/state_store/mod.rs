/// Single JSON file backend.
pub mod file;

use crate::dao::{models::PersistedState, storage::StorageResult};
use futures::future::BoxFuture;

pub use self::file::JsonFileStore;

/// Abstraction over the durable copy of the state document.
///
/// Backends only ever see whole documents: `load` runs once at startup and
/// `save` replaces everything that was stored before.
pub trait StateStore: Send + Sync {
    /// Read the stored document; a backend with nothing stored yields an empty one.
    fn load(&self) -> BoxFuture<'static, StorageResult<PersistedState>>;
    /// Replace the stored document with `state`.
    fn save(&self, state: PersistedState) -> BoxFuture<'static, StorageResult<()>>;
}
