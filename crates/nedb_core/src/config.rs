//! Adapter configuration.

use crate::datastore::DatastoreOptions;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root directory holding one datafile per collection.
pub const DEFAULT_STORAGE_ROOT: &str = "/var/lib/whaler/storage/nedb";

/// Retry policy for loading a collection datafile.
///
/// A failed load is retried after a fixed `delay`. With
/// `max_attempts: None` the handle retries forever; otherwise it gives up
/// after that many attempts and reports [`crate::AdapterError::LoadFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRetry {
    /// Fixed delay between attempts.
    pub delay: Duration,
    /// Maximum number of attempts, `None` for unbounded.
    pub max_attempts: Option<u32>,
}

impl LoadRetry {
    /// Delay between load attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);
    /// Attempts before giving up (about five seconds at the default delay).
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 50;

    /// Creates a bounded policy with the given delay.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_attempts: Some(Self::DEFAULT_MAX_ATTEMPTS),
        }
    }

    /// Creates a policy that retries until the load succeeds.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            delay: Self::DEFAULT_DELAY,
            max_attempts: None,
        }
    }

    /// Sets the attempt limit. `0` is treated as a single attempt.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets the delay between attempts.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns true if another attempt is allowed after `attempts` failures.
    #[must_use]
    pub const fn allows_retry(&self, attempts: u32) -> bool {
        match self.max_attempts {
            None => true,
            Some(0) => false,
            Some(max) => attempts < max,
        }
    }
}

impl Default for LoadRetry {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

/// Configuration for NeDB-backed adapters.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the collection datafiles.
    pub storage_root: PathBuf,

    /// How failed datafile loads are retried.
    pub load_retry: LoadRetry,

    /// Fraction of corrupt lines tolerated on load (0.0 - 1.0).
    pub corrupt_alert_threshold: f64,

    /// Whether to rewrite the datafile after loading it.
    pub compact_on_load: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            load_retry: LoadRetry::default(),
            corrupt_alert_threshold: 0.1,
            compact_on_load: true,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the storage root.
    #[must_use]
    pub fn storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    /// Sets the load retry policy.
    #[must_use]
    pub fn load_retry(mut self, retry: LoadRetry) -> Self {
        self.load_retry = retry;
        self
    }

    /// Sets the tolerated corrupt fraction.
    #[must_use]
    pub fn corrupt_alert_threshold(mut self, threshold: f64) -> Self {
        self.corrupt_alert_threshold = threshold;
        self
    }

    /// Sets whether to compact the datafile after loading.
    #[must_use]
    pub fn compact_on_load(mut self, value: bool) -> Self {
        self.compact_on_load = value;
        self
    }

    /// Returns the datafile path for a collection.
    #[must_use]
    pub fn collection_path(&self, name: &str) -> PathBuf {
        collection_path(&self.storage_root, name)
    }

    /// Returns the engine options derived from this configuration.
    #[must_use]
    pub const fn datastore_options(&self) -> DatastoreOptions {
        DatastoreOptions {
            corrupt_alert_threshold: self.corrupt_alert_threshold,
            compact_on_load: self.compact_on_load,
        }
    }
}

pub(crate) fn collection_path(root: &Path, name: &str) -> PathBuf {
    root.join(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.storage_root, PathBuf::from(DEFAULT_STORAGE_ROOT));
        assert_eq!(config.load_retry.delay, Duration::from_millis(100));
        assert_eq!(config.load_retry.max_attempts, Some(50));
        assert!(config.compact_on_load);
    }

    #[test]
    fn builder_pattern() {
        let config = Config::new()
            .storage_root("/tmp/nedb")
            .load_retry(LoadRetry::unbounded())
            .compact_on_load(false);

        assert_eq!(config.collection_path("apps"), PathBuf::from("/tmp/nedb/apps"));
        assert_eq!(config.load_retry.max_attempts, None);
        assert!(!config.datastore_options().compact_on_load);
    }

    #[test]
    fn retry_budget() {
        let retry = LoadRetry::default().with_max_attempts(3);
        assert!(retry.allows_retry(1));
        assert!(retry.allows_retry(2));
        assert!(!retry.allows_retry(3));

        assert!(!LoadRetry::default().with_max_attempts(0).allows_retry(1));
        assert!(LoadRetry::unbounded().allows_retry(u32::MAX));
    }
}
