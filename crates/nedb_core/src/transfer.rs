//! Copying whole collections between adapters.

use crate::adapter::StorageAdapter;
use crate::error::AdapterResult;
use tracing::debug;

/// Result of a [`transfer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    /// The source had no entries; nothing was written.
    Empty,
    /// This many entries were written to the destination.
    Transferred(usize),
}

impl TransferOutcome {
    /// Returns how many entries were written.
    #[must_use]
    pub const fn count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Transferred(count) => *count,
        }
    }

    /// Returns true if the source was empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Copies every entry of `source` into `destination` with `set`.
///
/// Entries are written one at a time in key order. Keys already present in
/// the destination are overwritten; other destination keys are kept. The
/// source is never modified.
///
/// # Errors
///
/// Fails if reading the source fails, or with the error of the first
/// failing `set`. Entries written before the failure stay written.
pub fn transfer<S, D>(source: &S, destination: &D) -> AdapterResult<TransferOutcome>
where
    S: StorageAdapter + ?Sized,
    D: StorageAdapter + ?Sized,
{
    let entries = source.all()?;
    if entries.is_empty() {
        debug!(source = source.name(), "nothing to transfer");
        return Ok(TransferOutcome::Empty);
    }

    let count = entries.len();
    for (key, doc) in entries {
        destination.set(&key, doc)?;
    }

    debug!(
        source = source.name(),
        destination = destination.name(),
        count,
        "collection transferred"
    );
    Ok(TransferOutcome::Transferred(count))
}
