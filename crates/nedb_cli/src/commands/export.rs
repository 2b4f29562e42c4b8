//! Export command implementation.

use super::StorageArgs;
use nedb_core::{transfer, StorageAdapter, TransferOutcome};
use std::path::Path;
use tracing::{info, warn};

/// Runs the export command: store collection `name` into a JSON file.
pub fn run(
    storage: &StorageArgs,
    name: &str,
    export_path: Option<&Path>,
) -> Result<TransferOutcome, Box<dyn std::error::Error>> {
    let store = storage.store(name)?;
    let file = storage.file(name, export_path)?;

    let outcome = transfer(&store, &file)?;
    match outcome {
        TransferOutcome::Empty => warn!("No data in `{}`", store.name()),
        TransferOutcome::Transferred(count) => info!(
            count,
            "Data from `{}` exported to `{}`",
            store.name(),
            file.path().display()
        ),
    }
    Ok(outcome)
}
