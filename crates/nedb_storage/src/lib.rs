//! # NeDB Storage
//!
//! Datafile backends for the NeDB storage adapter.
//!
//! A backend owns exactly one datafile and treats it as an **opaque byte
//! store**. The document engine in `nedb_core` owns the line format; a
//! backend only reads, appends, atomically replaces, and locks.
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and ephemeral collections
//! - [`FileBackend`] - For persistent collections using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use nedb_storage::{StorageBackend, InMemoryBackend};
//!
//! let mut backend = InMemoryBackend::new();
//! backend.append(b"{\"_id\":\"a\"}\n").unwrap();
//! backend.replace(b"").unwrap();
//! assert!(backend.read_all().unwrap().is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod lock;
mod memory;

pub use backend::StorageBackend;
pub use error::{StorageError, StorageResult};
pub use file::{is_reserved_name, replace_file, FileBackend};
pub use lock::LoadLock;
pub use memory::InMemoryBackend;
