use std::io;

use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure reading or writing the durable copy of the state document.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The medium could not be read or written.
    #[error("storage unavailable while {context}")]
    Unavailable {
        /// Operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The stored bytes are not a state document.
    #[error("state document is malformed while {context}")]
    Malformed {
        /// Operation that failed.
        context: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// I/O failure during `context` (e.g. "writing /var/lib/tickshare.json").
    pub fn unavailable(context: impl Into<String>, source: io::Error) -> Self {
        StorageError::Unavailable {
            context: context.into(),
            source,
        }
    }

    /// Encoding or decoding failure during `context`.
    pub fn malformed(context: impl Into<String>, source: serde_json::Error) -> Self {
        StorageError::Malformed {
            context: context.into(),
            source,
        }
    }
}
