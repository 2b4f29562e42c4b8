//! Load lock guard.

use fs2::FileExt;
use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Exclusive load lock on a datafile.
///
/// Returned by [`crate::StorageBackend::try_lock`]. The lock is released
/// when the guard is dropped.
#[derive(Debug)]
pub struct LoadLock {
    inner: LockInner,
}

#[derive(Debug)]
enum LockInner {
    /// Advisory `flock` held on a sibling lock file.
    File(File),
    /// Process-local flag for in-memory backends.
    Flag(Arc<AtomicBool>),
}

impl LoadLock {
    pub(crate) fn file(file: File) -> Self {
        Self {
            inner: LockInner::File(file),
        }
    }

    pub(crate) fn flag(flag: Arc<AtomicBool>) -> Self {
        Self {
            inner: LockInner::Flag(flag),
        }
    }
}

impl Drop for LoadLock {
    fn drop(&mut self) {
        match &self.inner {
            LockInner::File(file) => {
                // Closing the file releases the lock as well.
                let _ = FileExt::unlock(file);
            }
            LockInner::Flag(flag) => flag.store(false, Ordering::Release),
        }
    }
}
