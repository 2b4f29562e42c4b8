//! Storage backend trait definition.

use crate::error::StorageResult;
use crate::lock::LoadLock;

/// A backend for one collection datafile.
///
/// Backends are **opaque byte stores**. The document engine decides what a
/// line means; the backend never parses the data it holds.
///
/// # Invariants
///
/// - `read_all` returns every byte appended or replaced so far
/// - `append` returns the offset where data was written
/// - `replace` is atomic: readers observe either the old or the new contents
/// - `try_lock` never blocks
pub trait StorageBackend: Send + Sync {
    /// Reads the full contents of the datafile.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn read_all(&self) -> StorageResult<Vec<u8>>;

    /// Appends data to the end of the datafile.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StorageResult<u64>;

    /// Atomically replaces the full contents of the datafile.
    ///
    /// Used by compaction to rewrite the log with one line per live
    /// document.
    ///
    /// # Errors
    ///
    /// Returns an error if the new contents cannot be written or renamed
    /// into place. The old contents are left intact in that case.
    fn replace(&mut self, data: &[u8]) -> StorageResult<()>;

    /// Flushes all pending writes to the OS.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StorageResult<()>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StorageResult<()>;

    /// Returns the current size of the datafile in bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StorageResult<u64>;

    /// Tries to take the exclusive load lock for this datafile.
    ///
    /// The lock is held while the engine reads and compacts the file so
    /// that two loaders never rewrite it at the same time. It is released
    /// when the returned guard is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::Locked`] if another loader holds the
    /// lock, or an I/O error if the lock file cannot be opened.
    fn try_lock(&self) -> StorageResult<LoadLock>;
}
