//! # NeDB Testkit
//!
//! Test utilities for the NeDB storage adapter.
//!
//! This crate provides:
//! - Temporary store fixtures for both adapter backends
//! - Property-based test generators using proptest
//! - A model harness that checks an adapter against a reference map
//!
//! ## Usage
//!
//! ```rust
//! use nedb_testkit::prelude::*;
//! use nedb_core::StorageAdapter;
//!
//! with_temp_store(|store| {
//!     let apps = store.nedb("apps");
//!     apps.set("app1", doc(serde_json::json!({"port": 80}))).unwrap();
//!     assert_eq!(apps.all().unwrap().len(), 1);
//! });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod harness;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::harness::*;
}

pub use fixtures::*;
pub use generators::*;
pub use harness::*;
