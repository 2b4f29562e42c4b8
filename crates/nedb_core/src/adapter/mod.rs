//! Key-value document adapters.
//!
//! Every storage backend the host can use implements [`StorageAdapter`]:
//!
//! - [`NedbAdapter`] - one NeDB datafile per collection
//! - [`FsAdapter`] - one JSON object file per collection
//!
//! The transfer routines are generic over this trait, so import and export
//! are the same algorithm with source and destination swapped.

mod fs;
mod nedb;

pub use fs::{FsAdapter, DEFAULT_FS_ROOT};
pub use nedb::NedbAdapter;

use crate::document::Document;
use crate::error::AdapterResult;
use std::collections::{btree_map, BTreeMap};

/// All entries of a collection, keyed by document key.
pub type Entries = BTreeMap<String, Document>;

/// Key-value document access to one named collection.
///
/// Documents never contain the engine's identity field. Keys are compared
/// as exact full strings.
///
/// # Errors
///
/// - `get`, `update` and `remove` fail with
///   [`AdapterError::NotFound`](crate::AdapterError::NotFound) for absent keys
/// - `insert` fails with
///   [`AdapterError::AlreadyExists`](crate::AdapterError::AlreadyExists) for
///   present keys
pub trait StorageAdapter: Send + Sync {
    /// Returns the collection name.
    fn name(&self) -> &str;

    /// Returns every entry. An empty collection yields an empty map.
    fn all(&self) -> AdapterResult<Entries>;

    /// Iterates over a fresh scan of every entry.
    fn iter(&self) -> AdapterResult<btree_map::IntoIter<String, Document>> {
        Ok(self.all()?.into_iter())
    }

    /// Returns the document stored at `key`.
    fn get(&self, key: &str) -> AdapterResult<Document>;

    /// Creates or fully replaces the document at `key` and returns it as
    /// re-read after the write.
    fn set(&self, key: &str, value: Document) -> AdapterResult<Document>;

    /// Creates the document at `key` and returns it.
    fn insert(&self, key: &str, value: Document) -> AdapterResult<Document>;

    /// Changes only the fields named in `value` and returns the re-read
    /// document.
    fn update(&self, key: &str, value: Document) -> AdapterResult<Document>;

    /// Deletes the document at `key`.
    fn remove(&self, key: &str) -> AdapterResult<()>;
}

impl<A: StorageAdapter + ?Sized> StorageAdapter for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn all(&self) -> AdapterResult<Entries> {
        (**self).all()
    }

    fn get(&self, key: &str) -> AdapterResult<Document> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Document) -> AdapterResult<Document> {
        (**self).set(key, value)
    }

    fn insert(&self, key: &str, value: Document) -> AdapterResult<Document> {
        (**self).insert(key, value)
    }

    fn update(&self, key: &str, value: Document) -> AdapterResult<Document> {
        (**self).update(key, value)
    }

    fn remove(&self, key: &str) -> AdapterResult<()> {
        (**self).remove(key)
    }
}
