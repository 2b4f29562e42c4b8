//! Test fixtures and store helpers.
//!
//! Provides temporary storage roots for both adapter backends, configured
//! with a short load retry so lock contention fails fast in tests.

use nedb_core::{Config, Document, FsAdapter, LoadRetry, NedbAdapter};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// A temporary storage root with automatic cleanup.
pub struct TestStore {
    /// Configuration for NeDB adapters under this root.
    pub config: Config,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestStore {
    /// Creates a new temporary storage root.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = Config::new()
            .storage_root(temp_dir.path().join("nedb"))
            .load_retry(fast_retry());
        Self {
            config,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the temporary root directory.
    pub fn root(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Returns the directory holding JSON file collections.
    pub fn fs_root(&self) -> PathBuf {
        self.root().join("fs")
    }

    /// Creates a NeDB adapter for `name`.
    pub fn nedb(&self, name: &str) -> NedbAdapter {
        NedbAdapter::with_config(name, &self.config)
    }

    /// Creates a JSON file adapter for `name`.
    pub fn fs(&self, name: &str) -> FsAdapter {
        FsAdapter::with_root(name, self.fs_root())
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Load retry used by fixtures: 5ms delay, 3 attempts.
pub fn fast_retry() -> LoadRetry {
    LoadRetry::new(Duration::from_millis(5)).with_max_attempts(3)
}

/// Converts a JSON object literal into a [`Document`].
///
/// # Panics
///
/// Panics if `value` is not an object.
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(fields) => fields,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Runs a test with a temporary storage root.
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&TestStore) -> R,
{
    let store = TestStore::new();
    f(&store)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use nedb_core::StorageAdapter;
    use serde_json::json;

    /// Fills `adapter` with `count` application documents keyed
    /// `app0..appN`.
    pub fn populate(adapter: &dyn StorageAdapter, count: usize) {
        for i in 0..count {
            adapter
                .set(
                    &format!("app{i}"),
                    doc(json!({"image": "nginx", "port": 8000 + i})),
                )
                .expect("Failed to populate collection");
        }
    }
}
