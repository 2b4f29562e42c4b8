//! Embedded document engine.
//!
//! A [`Datastore`] keeps every live document of one collection in memory,
//! indexed by `_id`, and persists changes by appending lines to its
//! datafile (see the `persistence` module for the format). Loading replays the file
//! and, by default, compacts it back to one line per live document.
//!
//! Writes are applied to the datafile first and to the in-memory index
//! only once the append succeeded, so a failed write leaves the index
//! unchanged.

mod persistence;
mod query;
mod update;

pub use query::Query;
pub use update::{RemoveOptions, Update, UpdateOptions};

use crate::document::{Document, ID_FIELD};
use crate::error::{DatastoreError, DatastoreResult};
use nedb_storage::{FileBackend, InMemoryBackend, StorageBackend};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Engine options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatastoreOptions {
    /// Fraction of corrupt lines tolerated on load.
    pub corrupt_alert_threshold: f64,
    /// Whether to rewrite the datafile after loading it.
    pub compact_on_load: bool,
}

impl Default for DatastoreOptions {
    fn default() -> Self {
        Self {
            corrupt_alert_threshold: 0.1,
            compact_on_load: true,
        }
    }
}

/// A file-persisted document collection.
///
/// # Example
///
/// ```rust
/// use nedb_core::{Datastore, Query};
/// use serde_json::json;
///
/// let mut store = Datastore::in_memory();
/// store.load().unwrap();
///
/// let doc = json!({"_id": "app1", "image": "nginx"});
/// store.insert(doc.as_object().cloned().unwrap()).unwrap();
///
/// let found = store.find(&Query::by_id("app1")).unwrap();
/// assert_eq!(found.len(), 1);
/// ```
pub struct Datastore {
    backend: Box<dyn StorageBackend>,
    options: DatastoreOptions,
    docs: BTreeMap<String, Document>,
    loaded: bool,
}

impl Datastore {
    /// Creates an unloaded datastore over a backend.
    #[must_use]
    pub fn new(backend: Box<dyn StorageBackend>, options: DatastoreOptions) -> Self {
        Self {
            backend,
            options,
            docs: BTreeMap::new(),
            loaded: false,
        }
    }

    /// Opens the datafile at `path`, creating it and its directories if
    /// missing. The datastore still has to be [loaded](Self::load).
    ///
    /// # Errors
    ///
    /// Returns an error if the datafile cannot be opened or created.
    pub fn open(path: &Path, options: DatastoreOptions) -> DatastoreResult<Self> {
        let backend = FileBackend::open_with_create_dirs(path)?;
        Ok(Self::new(Box::new(backend), options))
    }

    /// Creates an unloaded, non-persistent datastore.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(InMemoryBackend::new()), DatastoreOptions::default())
    }

    /// Loads the datafile into the in-memory index.
    ///
    /// Holds the backend's load lock while reading and compacting. Calling
    /// `load` again reloads from the datafile.
    ///
    /// # Errors
    ///
    /// - the load lock is held by another loader
    /// - the datafile cannot be read or compacted
    /// - more than `corrupt_alert_threshold` of the lines are corrupt
    pub fn load(&mut self) -> DatastoreResult<()> {
        let _lock = self.backend.try_lock()?;

        let data = self.backend.read_all()?;
        let log = persistence::replay(&data);

        if log.exceeds(self.options.corrupt_alert_threshold) {
            return Err(DatastoreError::Corrupted {
                corrupt: log.corrupt,
                total: log.total,
                threshold: self.options.corrupt_alert_threshold,
            });
        }
        if log.corrupt > 0 {
            warn!(
                corrupt = log.corrupt,
                total = log.total,
                "dropping corrupt datafile lines"
            );
        }

        self.docs = log.docs;
        if self.options.compact_on_load {
            self.persist_snapshot()?;
        }
        self.loaded = true;

        debug!(documents = self.docs.len(), "datastore loaded");
        Ok(())
    }

    /// Returns true once [`load`](Self::load) has succeeded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Returns the number of live documents.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::NotLoaded`] before the first load.
    pub fn count(&self) -> DatastoreResult<usize> {
        self.ensure_loaded()?;
        Ok(self.docs.len())
    }

    /// Returns every document matching `query`, including `_id`.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::NotLoaded`] before the first load.
    pub fn find(&self, query: &Query) -> DatastoreResult<Vec<Document>> {
        self.ensure_loaded()?;
        Ok(self
            .matching_ids(query, true)
            .into_iter()
            .filter_map(|id| self.docs.get(&id).cloned())
            .collect())
    }

    /// Returns the first document matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::NotLoaded`] before the first load.
    pub fn find_one(&self, query: &Query) -> DatastoreResult<Option<Document>> {
        self.ensure_loaded()?;
        Ok(self
            .matching_ids(query, false)
            .first()
            .and_then(|id| self.docs.get(id).cloned()))
    }

    /// Inserts a new document and returns it as stored.
    ///
    /// A random `_id` is generated when the document has none.
    ///
    /// # Errors
    ///
    /// - [`DatastoreError::UniqueViolated`] if the `_id` is taken
    /// - [`DatastoreError::InvalidDocument`] for a non-string `_id` or a
    ///   field name starting with `$`
    /// - storage errors from the append
    pub fn insert(&mut self, mut doc: Document) -> DatastoreResult<Document> {
        self.ensure_loaded()?;

        let id = match doc.get(ID_FIELD) {
            None => {
                let id = uuid::Uuid::new_v4().simple().to_string();
                doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
            Some(Value::String(id)) => id.clone(),
            Some(_) => return Err(DatastoreError::invalid_document("_id must be a string")),
        };
        check_field_names(&doc)?;

        if self.docs.contains_key(&id) {
            return Err(DatastoreError::UniqueViolated { id });
        }

        self.append(&persistence::document_line(&doc)?)?;
        self.docs.insert(id, doc.clone());
        Ok(doc)
    }

    /// Updates documents matching `query` and returns how many were
    /// replaced or inserted.
    ///
    /// Only the first match is updated unless `options.multi` is set. With
    /// `options.upsert` and no match, a new document is inserted.
    ///
    /// # Errors
    ///
    /// - [`DatastoreError::IdModification`] if the update changes an `_id`
    /// - [`DatastoreError::InvalidDocument`] for `$`-prefixed field names
    /// - storage errors from the append
    pub fn update(
        &mut self,
        query: &Query,
        update: &Update,
        options: UpdateOptions,
    ) -> DatastoreResult<usize> {
        self.ensure_loaded()?;

        let ids = self.matching_ids(query, options.multi);
        if ids.is_empty() {
            if !options.upsert {
                return Ok(0);
            }
            self.insert(update.upsert_document(query))?;
            return Ok(1);
        }

        let mut changed = Vec::with_capacity(ids.len());
        let mut lines = Vec::new();
        for id in ids {
            let Some(current) = self.docs.get(&id) else {
                continue;
            };
            let next = update.apply(current)?;
            check_field_names(&next)?;
            lines.extend_from_slice(&persistence::document_line(&next)?);
            changed.push((id, next));
        }

        self.append(&lines)?;
        let count = changed.len();
        self.docs.extend(changed);
        Ok(count)
    }

    /// Removes documents matching `query` and returns how many were removed.
    ///
    /// Only the first match is removed unless `options.multi` is set.
    ///
    /// # Errors
    ///
    /// Returns storage errors from the append.
    pub fn remove(&mut self, query: &Query, options: RemoveOptions) -> DatastoreResult<usize> {
        self.ensure_loaded()?;

        let ids = self.matching_ids(query, options.multi);
        if ids.is_empty() {
            return Ok(0);
        }

        let mut lines = Vec::new();
        for id in &ids {
            lines.extend_from_slice(&persistence::tombstone_line(id)?);
        }
        self.append(&lines)?;

        for id in &ids {
            self.docs.remove(id);
        }
        Ok(ids.len())
    }

    /// Rewrites the datafile with one line per live document.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::NotLoaded`] before the first load, or a
    /// storage error if the datafile cannot be replaced.
    pub fn compact(&mut self) -> DatastoreResult<()> {
        self.ensure_loaded()?;
        self.persist_snapshot()
    }

    fn persist_snapshot(&mut self) -> DatastoreResult<()> {
        let data = persistence::snapshot(self.docs.values())?;
        self.backend.replace(&data)?;
        debug!(documents = self.docs.len(), bytes = data.len(), "datafile compacted");
        Ok(())
    }

    fn append(&mut self, lines: &[u8]) -> DatastoreResult<()> {
        self.backend.append(lines)?;
        self.backend.flush()?;
        Ok(())
    }

    fn ensure_loaded(&self) -> DatastoreResult<()> {
        if self.loaded {
            Ok(())
        } else {
            Err(DatastoreError::NotLoaded)
        }
    }

    fn matching_ids(&self, query: &Query, multi: bool) -> Vec<String> {
        if let Some(id) = query.id() {
            return match self.docs.get(id) {
                Some(doc) if query.matches(doc) => vec![id.to_string()],
                _ => Vec::new(),
            };
        }

        let matches = self
            .docs
            .iter()
            .filter(|(_, doc)| query.matches(doc))
            .map(|(id, _)| id.clone());
        if multi {
            matches.collect()
        } else {
            matches.take(1).collect()
        }
    }
}

impl std::fmt::Debug for Datastore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datastore")
            .field("documents", &self.docs.len())
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

/// Rejects `$`-prefixed field names at any depth; `$$deleted` marks tombstones.
fn check_field_names(doc: &Document) -> DatastoreResult<()> {
    for (name, value) in doc {
        if name.starts_with('$') {
            return Err(DatastoreError::invalid_document(format!(
                "field names cannot begin with the $ character: {name}"
            )));
        }
        check_value(value)?;
    }
    Ok(())
}

fn check_value(value: &Value) -> DatastoreResult<()> {
    match value {
        Value::Object(fields) => check_field_names(fields),
        Value::Array(items) => items.iter().try_for_each(check_value),
        _ => Ok(()),
    }
}
