//! Public document shape and identity field bookkeeping.
//!
//! Adapters expose documents exactly as callers supplied them. The engine
//! indexes every stored document by the reserved [`ID_FIELD`]; the helpers
//! here inject it on write and strip it on read so it never leaks into the
//! public shape.

use serde_json::{Map, Value};

/// A stored record: field name to JSON value, no fixed schema.
pub type Document = Map<String, Value>;

/// The engine's reserved identity field.
pub const ID_FIELD: &str = "_id";

/// Returns the identity of an engine document, if it has a string `_id`.
#[must_use]
pub fn id_of(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

/// Returns `doc` with its `_id` set to `key`, overwriting any caller value.
#[must_use]
pub fn with_id(key: &str, mut doc: Document) -> Document {
    doc.insert(ID_FIELD.to_string(), Value::String(key.to_string()));
    doc
}

/// Removes the identity field and returns it alongside the public document.
#[must_use]
pub fn split_id(mut doc: Document) -> (Option<String>, Document) {
    let id = match doc.remove(ID_FIELD) {
        Some(Value::String(id)) => Some(id),
        _ => None,
    };
    (id, doc)
}

/// Removes the identity field.
#[must_use]
pub fn strip_id(doc: Document) -> Document {
    split_id(doc).1
}
