use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::{FutureExt, future::BoxFuture};
use tokio::fs;
use tracing::{debug, info};

use crate::dao::{
    models::PersistedState,
    state_store::StateStore,
    storage::{StorageError, StorageResult},
};

/// Stores the state document as a single JSON file.
///
/// Saves go through a sibling temporary file and a rename so a crash mid-write
/// leaves the previous document intact.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: Arc<Path>,
}

impl JsonFileStore {
    /// Create a store backed by the file at `path`; the file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::from(path.into()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> BoxFuture<'static, StorageResult<PersistedState>> {
        let path = self.path.clone();
        async move {
            let contents = match fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    info!(path = %path.display(), "state file not found; starting empty");
                    return Ok(PersistedState::default());
                }
                Err(err) => {
                    return Err(StorageError::unavailable(
                        format!("reading {}", path.display()),
                        err,
                    ));
                }
            };

            serde_json::from_str(&contents).map_err(|err| {
                StorageError::malformed(format!("parsing {}", path.display()), err)
            })
        }
        .boxed()
    }

    fn save(&self, state: PersistedState) -> BoxFuture<'static, StorageResult<()>> {
        let path = self.path.clone();
        let temp_path = self.temp_path();
        async move {
            let payload = serde_json::to_vec(&state).map_err(|err| {
                StorageError::malformed("serializing the state document", err)
            })?;

            fs::write(&temp_path, &payload).await.map_err(|err| {
                StorageError::unavailable(format!("writing {}", temp_path.display()), err)
            })?;
            fs::rename(&temp_path, &path).await.map_err(|err| {
                StorageError::unavailable(format!("replacing {}", path.display()), err)
            })?;

            debug!(
                path = %path.display(),
                bytes = payload.len(),
                stopwatches = state.stopwatchs.len(),
                groups = state.stopwatch_groups.len(),
                "state document written"
            );
            Ok(())
        }
        .boxed()
    }
}
