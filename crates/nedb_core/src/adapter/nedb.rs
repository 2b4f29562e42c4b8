//! NeDB-backed adapter.

use crate::adapter::{Entries, StorageAdapter};
use crate::config::Config;
use crate::datastore::{Query, RemoveOptions, Update, UpdateOptions};
use crate::document::{id_of, split_id, strip_id, with_id, Document, ID_FIELD};
use crate::error::{AdapterError, AdapterResult, DatastoreError};
use crate::handle::StoreHandle;
use std::path::Path;

/// Key-value adapter over one NeDB collection datafile.
///
/// The datafile lives at `<storage_root>/<name>` and is loaded on the first
/// operation. Keys map 1:1 to the engine's `_id`, which is injected on
/// write and stripped on read.
///
/// # Example
///
/// ```rust,no_run
/// use nedb_core::{NedbAdapter, StorageAdapter};
/// use serde_json::json;
///
/// let apps = NedbAdapter::new("apps");
/// let doc = json!({"image": "nginx", "port": 80});
/// apps.insert("app1", doc.as_object().cloned().unwrap())?;
/// assert_eq!(apps.get("app1")?["port"], json!(80));
/// # Ok::<(), nedb_core::AdapterError>(())
/// ```
#[derive(Debug)]
pub struct NedbAdapter {
    name: String,
    handle: StoreHandle,
}

impl NedbAdapter {
    /// Creates an adapter for `name` under the default storage root.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, &Config::default())
    }

    /// Creates an adapter for `name` using `config`.
    #[must_use]
    pub fn with_config(name: impl Into<String>, config: &Config) -> Self {
        let name = name.into();
        let handle = StoreHandle::new(
            config.collection_path(&name),
            config.load_retry,
            config.datastore_options(),
        );
        Self { name, handle }
    }

    /// Returns the datafile path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.handle.path()
    }

    /// Returns the store handle.
    #[must_use]
    pub fn handle(&self) -> &StoreHandle {
        &self.handle
    }
}

impl StorageAdapter for NedbAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn all(&self) -> AdapterResult<Entries> {
        let docs = self.handle.acquire()?.find(&Query::all())?;

        let mut entries = Entries::new();
        for doc in docs {
            if let (Some(key), doc) = split_id(doc) {
                entries.insert(key, doc);
            }
        }
        Ok(entries)
    }

    fn get(&self, key: &str) -> AdapterResult<Document> {
        let docs = self.handle.acquire()?.find(&Query::by_id(key))?;

        match docs.into_iter().next() {
            Some(doc) if id_of(&doc) == Some(key) => Ok(strip_id(doc)),
            _ => Err(AdapterError::not_found(key)),
        }
    }

    fn set(&self, key: &str, value: Document) -> AdapterResult<Document> {
        {
            let mut store = self.handle.acquire()?;
            store.update(
                &Query::by_id(key),
                &Update::Replace(with_id(key, value)),
                UpdateOptions::upsert(),
            )?;
        }
        self.get(key)
    }

    fn insert(&self, key: &str, value: Document) -> AdapterResult<Document> {
        let mut store = self.handle.acquire()?;
        match store.insert(with_id(key, value)) {
            Ok(doc) => Ok(strip_id(doc)),
            Err(DatastoreError::UniqueViolated { .. }) => Err(AdapterError::already_exists(key)),
            Err(err) => Err(err.into()),
        }
    }

    fn update(&self, key: &str, mut value: Document) -> AdapterResult<Document> {
        // A patch must never retarget the record.
        value.remove(ID_FIELD);

        let replaced = self.handle.acquire()?.update(
            &Query::by_id(key),
            &Update::Set(value),
            UpdateOptions::default(),
        )?;
        if replaced == 0 {
            return Err(AdapterError::not_found(key));
        }
        self.get(key)
    }

    fn remove(&self, key: &str) -> AdapterResult<()> {
        let removed = self
            .handle
            .acquire()?
            .remove(&Query::by_id(key), RemoveOptions::default())?;
        if removed == 0 {
            return Err(AdapterError::not_found(key));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoadRetry;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tempfile::{tempdir, TempDir};

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn adapter(name: &str) -> (TempDir, NedbAdapter) {
        let dir = tempdir().unwrap();
        let config = Config::new()
            .storage_root(dir.path())
            .load_retry(LoadRetry::new(Duration::from_millis(5)).with_max_attempts(3));
        let adapter = NedbAdapter::with_config(name, &config);
        (dir, adapter)
    }

    #[test]
    fn datafile_path_is_root_plus_name() {
        let (dir, apps) = adapter("apps");
        assert_eq!(apps.path(), dir.path().join("apps"));
        assert_eq!(apps.name(), "apps");
    }

    #[test]
    fn app_lifecycle() {
        let (_dir, apps) = adapter("apps");

        let inserted = apps
            .insert("app1", doc(json!({"image": "nginx", "port": 80})))
            .unwrap();
        assert_eq!(inserted, doc(json!({"image": "nginx", "port": 80})));
        assert_eq!(
            apps.get("app1").unwrap(),
            doc(json!({"image": "nginx", "port": 80}))
        );

        let updated = apps.update("app1", doc(json!({"port": 8080}))).unwrap();
        assert_eq!(updated, doc(json!({"image": "nginx", "port": 8080})));
        assert_eq!(apps.get("app1").unwrap(), updated);

        apps.remove("app1").unwrap();
        assert!(apps.get("app1").unwrap_err().is_not_found());
    }

    #[test]
    fn absent_keys_are_not_found() {
        let (_dir, apps) = adapter("apps");

        assert_eq!(apps.get("ghost").unwrap_err().code(), "ERR_NOT_FOUND");
        assert_eq!(
            apps.update("ghost", doc(json!({"x": 1}))).unwrap_err().code(),
            "ERR_NOT_FOUND"
        );
        assert_eq!(apps.remove("ghost").unwrap_err().code(), "ERR_NOT_FOUND");
        assert!(apps.all().unwrap().is_empty());
    }

    #[test]
    fn insert_existing_key_fails_and_keeps_document() {
        let (_dir, apps) = adapter("apps");
        apps.insert("app1", doc(json!({"port": 80}))).unwrap();

        let err = apps.insert("app1", doc(json!({"port": 1}))).unwrap_err();
        assert_eq!(err.code(), "ERR_ALREADY_EXISTS");
        assert_eq!(err.to_string(), "`app1` already exists.");
        assert_eq!(apps.get("app1").unwrap(), doc(json!({"port": 80})));
    }

    #[test]
    fn racing_inserts_have_one_winner() {
        use std::sync::{Arc, Barrier};
        use std::thread;

        let (_dir, apps) = adapter("apps");
        let apps = Arc::new(apps);
        let barrier = Arc::new(Barrier::new(2));

        let racers: Vec<_> = (0..2)
            .map(|racer| {
                let apps = Arc::clone(&apps);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    let value = doc(json!({"racer": racer}));
                    barrier.wait();
                    (value.clone(), apps.insert("app1", value))
                })
            })
            .collect();
        let results: Vec<_> = racers.into_iter().map(|racer| racer.join().unwrap()).collect();

        let losers = results
            .iter()
            .filter(|(_, result)| matches!(result, Err(err) if err.is_already_exists()))
            .count();
        assert_eq!(losers, 1);

        let (winner, _) = results
            .iter()
            .find(|(_, result)| result.is_ok())
            .unwrap();
        assert_eq!(&apps.get("app1").unwrap(), winner);
    }

    #[test]
    fn set_creates_then_fully_replaces() {
        let (_dir, apps) = adapter("apps");

        let created = apps.set("app1", doc(json!({"image": "nginx", "port": 80}))).unwrap();
        assert_eq!(created, doc(json!({"image": "nginx", "port": 80})));

        let replaced = apps.set("app1", doc(json!({"image": "redis"}))).unwrap();
        assert_eq!(replaced, doc(json!({"image": "redis"})));
        assert_eq!(apps.all().unwrap().len(), 1);
    }

    #[test]
    fn caller_identity_fields_are_ignored() {
        let (_dir, apps) = adapter("apps");

        apps.insert("app1", doc(json!({"_id": "other", "v": 1}))).unwrap();
        apps.set("app2", doc(json!({"_id": "other", "v": 2}))).unwrap();
        apps.update("app1", doc(json!({"_id": "other", "v": 3}))).unwrap();

        let entries = apps.all().unwrap();
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["app1", "app2"]);
        assert_eq!(entries["app1"], doc(json!({"v": 3})));
        assert!(apps.get("other").unwrap_err().is_not_found());
    }

    #[test]
    fn keys_match_exactly() {
        let (_dir, apps) = adapter("apps");
        apps.insert("app", doc(json!({}))).unwrap();

        assert!(apps.get("app").is_ok());
        assert!(apps.get("app1").unwrap_err().is_not_found());
        assert!(apps.get("ap").unwrap_err().is_not_found());
        assert!(apps.get("APP").unwrap_err().is_not_found());
    }

    #[test]
    fn iter_yields_every_entry() {
        let (_dir, apps) = adapter("apps");
        apps.insert("a", doc(json!({"n": 1}))).unwrap();
        apps.insert("b", doc(json!({"n": 2}))).unwrap();

        let keys: Vec<String> = apps.iter().unwrap().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["a", "b"]);

        // Each call re-scans.
        apps.remove("a").unwrap();
        assert_eq!(apps.iter().unwrap().count(), 1);
    }

    #[test]
    fn data_survives_a_new_adapter() {
        let dir = tempdir().unwrap();
        let config = Config::new().storage_root(dir.path());

        {
            let apps = NedbAdapter::with_config("apps", &config);
            apps.insert("app1", doc(json!({"port": 80}))).unwrap();
            apps.insert("app2", doc(json!({"port": 81}))).unwrap();
            apps.remove("app2").unwrap();
        }

        let apps = NedbAdapter::with_config("apps", &config);
        assert!(!apps.handle().is_loaded());
        assert_eq!(apps.get("app1").unwrap(), doc(json!({"port": 80})));
        assert!(apps.get("app2").unwrap_err().is_not_found());
    }
}
