//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Another loader holds the datafile's load lock.
    #[error("datafile is locked by another loader: {}", .path.display())]
    Locked {
        /// The datafile whose lock is held.
        path: PathBuf,
    },

    /// The datafile name collides with a lock or temp sibling.
    #[error("datafile name is reserved: {}", .path.display())]
    ReservedName {
        /// The rejected path.
        path: PathBuf,
    },
}

impl StorageError {
    /// Returns true if the error is transient lock contention.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}
