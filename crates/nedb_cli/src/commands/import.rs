//! Import command implementation.

use super::StorageArgs;
use nedb_core::{transfer, StorageAdapter, TransferOutcome};
use std::path::Path;
use tracing::{info, warn};

/// Runs the import command: JSON file collection `name` into the store.
pub fn run(
    storage: &StorageArgs,
    name: &str,
    import_path: Option<&Path>,
) -> Result<TransferOutcome, Box<dyn std::error::Error>> {
    let store = storage.store(name)?;
    let file = storage.file(name, import_path)?;

    let outcome = transfer(&file, &store)?;
    match outcome {
        TransferOutcome::Empty => warn!("No data in `{}`", file.name()),
        TransferOutcome::Transferred(count) => info!(
            count,
            "Data from `{}` imported to `{}`",
            file.path().display(),
            store.name()
        ),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn args(root: &Path) -> StorageArgs {
        StorageArgs {
            storage_root: root.join("nedb"),
            fs_root: root.join("fs"),
            load_attempts: 3,
        }
    }

    #[test]
    fn imports_file_collection() {
        let dir = tempdir().unwrap();
        let storage = args(dir.path());
        fs::create_dir_all(&storage.fs_root).unwrap();
        fs::write(
            storage.fs_root.join("apps"),
            json!({"app1": {"port": 80}, "app2": {"port": 81}}).to_string(),
        )
        .unwrap();

        let outcome = run(&storage, "apps", None).unwrap();
        assert_eq!(outcome, TransferOutcome::Transferred(2));

        let store = storage.store("apps").unwrap();
        assert_eq!(store.get("app2").unwrap()["port"], json!(81));
    }

    #[test]
    fn imports_from_explicit_path() {
        let dir = tempdir().unwrap();
        let storage = args(dir.path());
        let backup = dir.path().join("backup");
        fs::create_dir_all(&backup).unwrap();
        fs::write(backup.join("apps"), r#"{"app1": {"image": "nginx"}}"#).unwrap();

        let outcome = run(&storage, "apps", Some(&backup)).unwrap();
        assert_eq!(outcome.count(), 1);
    }

    #[test]
    fn missing_source_is_empty() {
        let dir = tempdir().unwrap();
        let storage = args(dir.path());

        let outcome = run(&storage, "apps", None).unwrap();
        assert!(outcome.is_empty());
        assert!(storage.store("apps").unwrap().all().unwrap().is_empty());
    }
}
