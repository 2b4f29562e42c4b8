//! Host storage extension point.
//!
//! The host resolves collections through a [`StorageRegistry`]. Out of the
//! box it hands out [`FsAdapter`]s; [`register`] swaps in the NeDB factory
//! once the host API version is known to be compatible.

use crate::adapter::{FsAdapter, NedbAdapter, StorageAdapter, DEFAULT_FS_ROOT};
use crate::config::Config;
use crate::error::{AdapterError, AdapterResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Host storage API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApiVersion {
    /// Major version.
    pub major: u16,
    /// Minor version.
    pub minor: u16,
}

impl ApiVersion {
    /// Oldest host API the NeDB factory can be registered with.
    pub const MIN_SUPPORTED: Self = Self::new(0, 7);

    /// API version implemented by this crate.
    pub const CURRENT: Self = Self::new(0, 8);

    /// Creates a version.
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Builds adapters for named collections.
pub trait AdapterFactory: Send + Sync {
    /// Short backend identifier, e.g. `"nedb"`.
    fn backend(&self) -> &'static str;

    /// Creates an adapter for the collection `name`.
    fn create(&self, name: &str) -> Box<dyn StorageAdapter>;
}

/// Factory producing [`NedbAdapter`]s.
#[derive(Debug, Clone, Default)]
pub struct NedbFactory {
    config: Config,
}

impl NedbFactory {
    /// Creates a factory whose adapters share `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl AdapterFactory for NedbFactory {
    fn backend(&self) -> &'static str {
        "nedb"
    }

    fn create(&self, name: &str) -> Box<dyn StorageAdapter> {
        Box::new(NedbAdapter::with_config(name, &self.config))
    }
}

/// Factory producing [`FsAdapter`]s under one root directory.
#[derive(Debug, Clone)]
pub struct FsFactory {
    root: PathBuf,
}

impl FsFactory {
    /// Creates a factory rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for FsFactory {
    fn default() -> Self {
        Self::new(DEFAULT_FS_ROOT)
    }
}

impl AdapterFactory for FsFactory {
    fn backend(&self) -> &'static str {
        "fs"
    }

    fn create(&self, name: &str) -> Box<dyn StorageAdapter> {
        Box::new(FsAdapter::with_root(name, &self.root))
    }
}

/// The host's `storage` extension point.
pub struct StorageRegistry {
    version: ApiVersion,
    factory: Box<dyn AdapterFactory>,
}

impl StorageRegistry {
    /// Creates a registry for a host speaking `version`, serving the
    /// filesystem backend until another factory is installed.
    #[must_use]
    pub fn new(version: ApiVersion) -> Self {
        Self {
            version,
            factory: Box::new(FsFactory::default()),
        }
    }

    /// Returns the host API version.
    #[must_use]
    pub const fn version(&self) -> ApiVersion {
        self.version
    }

    /// Replaces the installed factory.
    pub fn set_factory(&mut self, factory: impl AdapterFactory + 'static) {
        self.factory = Box::new(factory);
    }

    /// Returns the installed backend identifier.
    #[must_use]
    pub fn backend(&self) -> &'static str {
        self.factory.backend()
    }

    /// Creates an adapter for `name` through the installed factory.
    #[must_use]
    pub fn create(&self, name: &str) -> Box<dyn StorageAdapter> {
        self.factory.create(name)
    }
}

impl Default for StorageRegistry {
    fn default() -> Self {
        Self::new(ApiVersion::CURRENT)
    }
}

impl fmt::Debug for StorageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageRegistry")
            .field("version", &self.version)
            .field("backend", &self.factory.backend())
            .finish()
    }
}

/// Installs the NeDB backend into `registry`.
///
/// # Errors
///
/// Returns [`AdapterError::UnsupportedHost`] if the host API is older than
/// [`ApiVersion::MIN_SUPPORTED`]. The registry is left unchanged.
pub fn register(registry: &mut StorageRegistry, config: Config) -> AdapterResult<()> {
    let found = registry.version();
    if found < ApiVersion::MIN_SUPPORTED {
        return Err(AdapterError::UnsupportedHost {
            required: ApiVersion::MIN_SUPPORTED,
            found,
        });
    }

    debug!(host = %found, root = %config.storage_root.display(), "registering nedb storage");
    registry.set_factory(NedbFactory::new(config));
    Ok(())
}
