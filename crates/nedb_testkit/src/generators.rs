//! Property-based test generators using proptest.
//!
//! Generated documents never contain the reserved `_id` field or field
//! names starting with `$`, so every value is storable by both adapters.

use nedb_core::{Document, Entries};
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for generating collection keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9][a-zA-Z0-9_.-]{0,15}").expect("Invalid regex")
}

/// Strategy for generating collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for generating document field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-zA-Z0-9_]{0,9}").expect("Invalid regex")
}

/// Strategy for generating JSON values up to a small nesting depth.
///
/// Numbers are integers so values survive a JSON round trip unchanged.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(field_name_strategy(), inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect())),
        ]
    })
}

/// Strategy for generating documents.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    prop::collection::btree_map(field_name_strategy(), value_strategy(), 0..6)
        .prop_map(|fields| fields.into_iter().collect())
}

/// Strategy for generating whole collections.
pub fn entries_strategy(max_len: usize) -> impl Strategy<Value = Entries> {
    prop::collection::btree_map(key_strategy(), document_strategy(), 0..max_len)
}

/// A single adapter operation.
#[derive(Debug, Clone)]
pub enum AdapterOperation {
    /// Upsert a full document
    Set {
        /// Key
        key: String,
        /// Document
        value: Document,
    },
    /// Create a document
    Insert {
        /// Key
        key: String,
        /// Document
        value: Document,
    },
    /// Patch named fields
    Update {
        /// Key
        key: String,
        /// Patch
        patch: Document,
    },
    /// Delete a document
    Remove {
        /// Key
        key: String,
    },
    /// Read a document
    Get {
        /// Key
        key: String,
    },
}

/// Strategy for generating a single operation over a small key space, so
/// sequences revisit keys and hit both present and absent cases.
pub fn operation_strategy() -> impl Strategy<Value = AdapterOperation> {
    let key = prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(String::from);
    prop_oneof![
        (key.clone(), document_strategy())
            .prop_map(|(key, value)| AdapterOperation::Set { key, value }),
        (key.clone(), document_strategy())
            .prop_map(|(key, value)| AdapterOperation::Insert { key, value }),
        (key.clone(), document_strategy())
            .prop_map(|(key, patch)| AdapterOperation::Update { key, patch }),
        key.clone().prop_map(|key| AdapterOperation::Remove { key }),
        key.prop_map(|key| AdapterOperation::Get { key }),
    ]
}

/// Strategy for generating operation sequences.
pub fn operations_strategy(max_len: usize) -> impl Strategy<Value = Vec<AdapterOperation>> {
    prop::collection::vec(operation_strategy(), 0..max_len)
}
