//! # NeDB Core
//!
//! Key-value document storage backed by NeDB-format datafiles.
//!
//! This crate provides:
//! - An embedded document engine ([`Datastore`]) over an append-only
//!   newline-delimited JSON datafile
//! - A lazily loaded [`StoreHandle`] with a configurable load retry
//! - The [`StorageAdapter`] contract, implemented by [`NedbAdapter`] and
//!   the plain JSON [`FsAdapter`]
//! - The host [`StorageRegistry`] and [`register`] entry point
//! - Collection [`transfer`] between any two adapters
//!
//! ## Example
//!
//! ```rust,no_run
//! use nedb_core::{Config, NedbAdapter, StorageAdapter};
//! use serde_json::json;
//!
//! let config = Config::new().storage_root("/tmp/nedb");
//! let apps = NedbAdapter::with_config("apps", &config);
//!
//! let doc = json!({"image": "nginx"}).as_object().cloned().unwrap();
//! apps.set("app1", doc)?;
//! assert!(apps.remove("app2").unwrap_err().is_not_found());
//! # Ok::<(), nedb_core::AdapterError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod config;
mod datastore;
mod document;
mod error;
mod handle;
mod registry;
mod transfer;

pub use adapter::{Entries, FsAdapter, NedbAdapter, StorageAdapter, DEFAULT_FS_ROOT};
pub use config::{Config, LoadRetry, DEFAULT_STORAGE_ROOT};
pub use datastore::{Datastore, DatastoreOptions, Query, RemoveOptions, Update, UpdateOptions};
pub use document::{id_of, split_id, strip_id, with_id, Document, ID_FIELD};
pub use error::{AdapterError, AdapterResult, DatastoreError, DatastoreResult};
pub use handle::StoreHandle;
pub use registry::{register, AdapterFactory, ApiVersion, FsFactory, NedbFactory, StorageRegistry};
pub use transfer::{transfer, TransferOutcome};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
