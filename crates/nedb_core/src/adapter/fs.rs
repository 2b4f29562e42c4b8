//! Plain JSON file adapter.
//!
//! Each collection is one pretty-printed JSON object at `<root>/<name>`
//! mapping keys to documents. Reads re-parse the whole file and writes
//! replace it atomically through a sibling temp file, syncing the directory
//! afterwards.

use crate::adapter::{Entries, StorageAdapter};
use crate::document::{strip_id, Document, ID_FIELD};
use crate::error::{AdapterError, AdapterResult};
use nedb_storage::replace_file;
use parking_lot::Mutex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Default root directory of the file storage backend.
pub const DEFAULT_FS_ROOT: &str = "/var/lib/whaler/storage";

/// Key-value adapter over one JSON object file.
#[derive(Debug)]
pub struct FsAdapter {
    name: String,
    path: PathBuf,
    // Serializes read-modify-write cycles within the process.
    lock: Mutex<()>,
}

impl FsAdapter {
    /// Creates an adapter for `name` under [`DEFAULT_FS_ROOT`].
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_root(name, DEFAULT_FS_ROOT)
    }

    /// Creates an adapter for `name` stored at `<root>/<name>`.
    #[must_use]
    pub fn with_root(name: impl Into<String>, root: impl AsRef<Path>) -> Self {
        let name = name.into();
        let path = root.as_ref().join(&name);
        Self {
            name,
            path,
            lock: Mutex::new(()),
        }
    }

    /// Stores the collection at exactly `path` instead.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Returns the collection file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> AdapterResult<Entries> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(err) => return Err(err.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Entries::new());
        }

        let entries: Entries = serde_json::from_slice(&bytes)?;
        Ok(entries
            .into_iter()
            .map(|(key, doc)| (key, strip_id(doc)))
            .collect())
    }

    fn write(&self, entries: &Entries) -> AdapterResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut data = serde_json::to_vec_pretty(entries)?;
        data.push(b'\n');
        replace_file(&self.path, &data)?;

        trace!(path = %self.path.display(), entries = entries.len(), "collection file written");
        Ok(())
    }
}

impl StorageAdapter for FsAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn all(&self) -> AdapterResult<Entries> {
        let _guard = self.lock.lock();
        self.read()
    }

    fn get(&self, key: &str) -> AdapterResult<Document> {
        let _guard = self.lock.lock();
        self.read()?
            .remove(key)
            .ok_or_else(|| AdapterError::not_found(key))
    }

    fn set(&self, key: &str, value: Document) -> AdapterResult<Document> {
        let _guard = self.lock.lock();
        let mut entries = self.read()?;
        entries.insert(key.to_string(), strip_id(value));
        self.write(&entries)?;

        self.read()?
            .remove(key)
            .ok_or_else(|| AdapterError::not_found(key))
    }

    fn insert(&self, key: &str, value: Document) -> AdapterResult<Document> {
        let _guard = self.lock.lock();
        let mut entries = self.read()?;
        if entries.contains_key(key) {
            return Err(AdapterError::already_exists(key));
        }
        let value = strip_id(value);
        entries.insert(key.to_string(), value.clone());
        self.write(&entries)?;
        Ok(value)
    }

    fn update(&self, key: &str, value: Document) -> AdapterResult<Document> {
        let _guard = self.lock.lock();
        let mut entries = self.read()?;
        let current = entries
            .get_mut(key)
            .ok_or_else(|| AdapterError::not_found(key))?;
        for (name, field) in value {
            if name != ID_FIELD {
                current.insert(name, field);
            }
        }
        let updated = current.clone();
        self.write(&entries)?;
        Ok(updated)
    }

    fn remove(&self, key: &str) -> AdapterResult<()> {
        let _guard = self.lock.lock();
        let mut entries = self.read()?;
        if entries.remove(key).is_none() {
            return Err(AdapterError::not_found(key));
        }
        self.write(&entries)
    }
}
