//! Error types for local persistence

use aria_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the file-backed store
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Value could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key contains characters that cannot be used as a file name
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(e) => CoreError::Serialization(e),
            other => CoreError::storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;
