//! Error types for the datastore engine and the storage adapters.

use crate::registry::ApiVersion;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for datastore engine operations.
pub type DatastoreResult<T> = Result<T, DatastoreError>;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors raised by the embedded document engine.
#[derive(Debug, Error)]
pub enum DatastoreError {
    /// Datafile backend error.
    #[error("storage error: {0}")]
    Storage(#[from] nedb_storage::StorageError),

    /// A document could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An insert would create a second document with the same `_id`.
    #[error("can't insert key {id}, it violates the unique constraint")]
    UniqueViolated {
        /// The duplicated identity.
        id: String,
    },

    /// An update tried to change a document's `_id`.
    #[error("you cannot change a document's _id")]
    IdModification,

    /// The document shape is not storable.
    #[error("invalid document: {message}")]
    InvalidDocument {
        /// Why the document was rejected.
        message: String,
    },

    /// Too much of the datafile failed to parse.
    #[error(
        "more than {:.0}% of the datafile is corrupt ({corrupt} of {total} lines)",
        .threshold * 100.0
    )]
    Corrupted {
        /// Number of unparseable lines.
        corrupt: usize,
        /// Number of non-blank lines.
        total: usize,
        /// Tolerated corrupt fraction.
        threshold: f64,
    },

    /// An operation was issued before the datafile was loaded.
    #[error("datastore is not loaded")]
    NotLoaded,
}

impl DatastoreError {
    /// Creates an invalid document error.
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Returns true if the failure is load lock contention.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Storage(err) if err.is_locked())
    }

    /// Returns true if a retry can succeed without outside changes.
    ///
    /// A reserved datafile name is the only permanent load failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Self::Storage(nedb_storage::StorageError::ReservedName { .. })
        )
    }
}

/// Errors surfaced by [`crate::StorageAdapter`] implementations.
///
/// Every variant carries a stable code (see [`AdapterError::code`]) that
/// callers can match on without parsing messages.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The key is absent on `get`, `update` or `remove`.
    #[error("`{key}` not found.")]
    NotFound {
        /// The missing key.
        key: String,
    },

    /// The key is already present on `insert`.
    #[error("`{key}` already exists.")]
    AlreadyExists {
        /// The duplicated key.
        key: String,
    },

    /// The datafile could not be loaded within the retry budget.
    #[error("failed to load `{}` after {attempts} attempts: {source}", .path.display())]
    LoadFailed {
        /// The datafile path.
        path: PathBuf,
        /// How many load attempts were made.
        attempts: u32,
        /// The error from the last attempt.
        #[source]
        source: DatastoreError,
    },

    /// The host storage extension point is too old.
    #[error("unsupported host storage API {found}, require >= {required}")]
    UnsupportedHost {
        /// Minimum supported version.
        required: ApiVersion,
        /// Version reported by the host.
        found: ApiVersion,
    },

    /// Engine error on an already loaded store.
    #[error("datastore error: {0}")]
    Datastore(#[from] DatastoreError),

    /// File replacement error in the filesystem adapter.
    #[error("storage error: {0}")]
    Storage(#[from] nedb_storage::StorageError),

    /// I/O error in the filesystem adapter.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The filesystem adapter's collection file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AdapterError {
    /// Creates a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates an already exists error.
    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::AlreadyExists { key: key.into() }
    }

    /// Returns the stable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "ERR_NOT_FOUND",
            Self::AlreadyExists { .. } => "ERR_ALREADY_EXISTS",
            Self::LoadFailed { .. } => "ERR_LOAD_FAILED",
            Self::UnsupportedHost { .. } => "ERR_UNSUPPORTED_HOST",
            Self::Datastore(_) | Self::Storage(_) | Self::Io(_) | Self::Json(_) => {
                "ERR_STORAGE"
            }
        }
    }

    /// Returns true for [`AdapterError::NotFound`].
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for [`AdapterError::AlreadyExists`].
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}
