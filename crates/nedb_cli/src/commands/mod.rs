//! CLI command implementations.

pub mod export;
pub mod import;

use nedb_core::{register, ApiVersion, Config, FsAdapter, LoadRetry, StorageAdapter, StorageRegistry};
use std::path::{Path, PathBuf};

/// Storage locations shared by every command.
#[derive(Debug, Clone)]
pub struct StorageArgs {
    /// NeDB datafile directory.
    pub storage_root: PathBuf,
    /// JSON file collection directory.
    pub fs_root: PathBuf,
    /// Load attempts, 0 for unbounded.
    pub load_attempts: u32,
}

impl StorageArgs {
    fn config(&self) -> Config {
        let retry = if self.load_attempts == 0 {
            LoadRetry::unbounded()
        } else {
            LoadRetry::default().with_max_attempts(self.load_attempts)
        };
        Config::new()
            .storage_root(&self.storage_root)
            .load_retry(retry)
    }

    /// Resolves the NeDB adapter for `name` through the storage registry.
    pub fn store(&self, name: &str) -> Result<Box<dyn StorageAdapter>, Box<dyn std::error::Error>> {
        let mut registry = StorageRegistry::new(ApiVersion::CURRENT);
        register(&mut registry, self.config())?;
        Ok(registry.create(name))
    }

    /// Builds the JSON file adapter for `name`, stored at `<path>/<name>`
    /// when `path` is given.
    pub fn file(&self, name: &str, path: Option<&Path>) -> std::io::Result<FsAdapter> {
        let adapter = FsAdapter::with_root(name, &self.fs_root);
        match path {
            Some(path) => Ok(adapter.with_path(std::path::absolute(path)?.join(name))),
            None => Ok(adapter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(root: &Path) -> StorageArgs {
        StorageArgs {
            storage_root: root.join("nedb"),
            fs_root: root.to_path_buf(),
            load_attempts: 3,
        }
    }

    #[test]
    fn file_defaults_to_fs_root() {
        let dir = tempdir().unwrap();
        let file = args(dir.path()).file("apps", None).unwrap();
        assert_eq!(file.path(), dir.path().join("apps"));
    }

    #[test]
    fn file_path_resolves_under_given_directory() {
        let dir = tempdir().unwrap();
        let file = args(dir.path())
            .file("apps", Some(&dir.path().join("backup")))
            .unwrap();
        assert_eq!(file.path(), dir.path().join("backup").join("apps"));

        let relative = args(dir.path()).file("apps", Some(Path::new("out"))).unwrap();
        assert!(relative.path().is_absolute());
        assert!(relative.path().ends_with("out/apps"));
    }

    #[test]
    fn zero_attempts_means_unbounded() {
        let dir = tempdir().unwrap();
        let mut storage = args(dir.path());
        storage.load_attempts = 0;
        assert_eq!(storage.config().load_retry.max_attempts, None);

        storage.load_attempts = 7;
        assert_eq!(storage.config().load_retry.max_attempts, Some(7));
    }

    #[test]
    fn store_uses_storage_root() {
        let dir = tempdir().unwrap();
        let store = args(dir.path()).store("apps").unwrap();
        store.all().unwrap();
        assert!(dir.path().join("nedb").join("apps").exists());
    }
}
