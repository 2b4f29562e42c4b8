//! Lazily loaded store handle.
//!
//! A [`StoreHandle`] owns the [`Datastore`] of one collection. The first
//! [`acquire`](StoreHandle::acquire) opens and loads the datafile,
//! retrying failed loads per the configured [`LoadRetry`]; later calls
//! return the already loaded engine without touching the file.
//!
//! All handles on one datafile path within a process share a single engine
//! slot. Loading compacts the datafile by renaming a new file into place, so
//! a second engine on the same path would keep appending to the unlinked
//! file. The slot lives as long as any handle on that path.
//!
//! The engine sits behind a mutex, so operations issued through any handle
//! are serialized and never observe a half-loaded store.

use crate::config::LoadRetry;
use crate::datastore::{Datastore, DatastoreOptions};
use crate::error::{AdapterError, AdapterResult, DatastoreResult};
use parking_lot::{const_mutex, MappedMutexGuard, Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use std::thread;
use tracing::{debug, warn};

type StoreSlot = Mutex<Option<Datastore>>;

/// Engine slots by absolute datafile path.
static OPEN_STORES: Mutex<BTreeMap<PathBuf, Weak<StoreSlot>>> = const_mutex(BTreeMap::new());

/// Returns the slot for `path`, creating it if no live handle holds one.
fn shared_slot(path: &Path) -> Arc<StoreSlot> {
    let key = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut stores = OPEN_STORES.lock();
    if let Some(slot) = stores.get(&key).and_then(Weak::upgrade) {
        return slot;
    }

    stores.retain(|_, slot| slot.strong_count() > 0);
    let slot = Arc::new(Mutex::new(None));
    stores.insert(key, Arc::downgrade(&slot));
    slot
}

/// Process-local handle to one loaded collection datafile.
///
/// Handles created for the same path share the loaded engine; the retry
/// policy and options of whichever handle loads first apply.
pub struct StoreHandle {
    path: PathBuf,
    retry: LoadRetry,
    options: DatastoreOptions,
    store: Arc<StoreSlot>,
}

impl StoreHandle {
    /// Creates an unloaded handle for the datafile at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, retry: LoadRetry, options: DatastoreOptions) -> Self {
        let path = path.into();
        let store = shared_slot(&path);
        Self {
            path,
            retry,
            options,
            store,
        }
    }

    /// Returns the datafile path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true once the datafile has been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.store.lock().is_some()
    }

    /// Returns the loaded engine, loading it first if needed.
    ///
    /// The returned guard holds the handle's lock; drop it before acquiring
    /// again from the same thread.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::LoadFailed`] when the retry policy is bounded
    /// and every attempt failed, or at once for a reserved datafile name.
    /// With an unbounded policy this otherwise blocks until a load succeeds.
    pub fn acquire(&self) -> AdapterResult<MappedMutexGuard<'_, Datastore>> {
        match MutexGuard::try_map(self.store.lock(), Option::as_mut) {
            Ok(store) => Ok(store),
            Err(slot) => {
                let store = self.load()?;
                Ok(MutexGuard::map(slot, |slot| slot.insert(store)))
            }
        }
    }

    fn load(&self) -> AdapterResult<Datastore> {
        let mut attempts: u32 = 0;
        loop {
            attempts = attempts.saturating_add(1);
            match self.try_load() {
                Ok(store) => {
                    debug!(path = %self.path.display(), attempts, "store handle loaded");
                    return Ok(store);
                }
                Err(source) if !source.is_retryable() || !self.retry.allows_retry(attempts) => {
                    return Err(AdapterError::LoadFailed {
                        path: self.path.clone(),
                        attempts,
                        source,
                    });
                }
                Err(err) => {
                    warn!(
                        path = %self.path.display(),
                        attempt = attempts,
                        error = %err,
                        "datafile load failed, retrying"
                    );
                    thread::sleep(self.retry.delay);
                }
            }
        }
    }

    fn try_load(&self) -> DatastoreResult<Datastore> {
        let mut store = Datastore::open(&self.path, self.options)?;
        store.load()?;
        Ok(store)
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandle")
            .field("path", &self.path)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
