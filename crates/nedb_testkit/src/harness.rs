//! Model-based adapter checking.
//!
//! [`ModelHarness`] applies operations to an adapter and to a plain
//! [`Entries`] map side by side, asserting after each step that the adapter
//! returned what the model predicts.

use crate::generators::AdapterOperation;
use nedb_core::{AdapterError, Document, Entries, StorageAdapter, ID_FIELD};

/// Pairs an adapter with a reference model of its contents.
pub struct ModelHarness<'a, A: StorageAdapter + ?Sized> {
    adapter: &'a A,
    model: Entries,
}

impl<'a, A: StorageAdapter + ?Sized> ModelHarness<'a, A> {
    /// Creates a harness over an empty adapter.
    pub fn new(adapter: &'a A) -> Self {
        Self {
            adapter,
            model: Entries::new(),
        }
    }

    /// Returns the reference model.
    pub fn model(&self) -> &Entries {
        &self.model
    }

    /// Applies one operation to both sides and checks the outcome.
    ///
    /// # Panics
    ///
    /// Panics if the adapter disagrees with the model.
    pub fn apply(&mut self, op: &AdapterOperation) {
        match op {
            AdapterOperation::Set { key, value } => {
                let stored = self.adapter.set(key, value.clone()).expect("set failed");
                assert_eq!(&stored, value, "set returned a different document for {key}");
                self.model.insert(key.clone(), value.clone());
            }
            AdapterOperation::Insert { key, value } => {
                let result = self.adapter.insert(key, value.clone());
                if self.model.contains_key(key) {
                    expect_already_exists(result, key);
                } else {
                    assert_eq!(&result.expect("insert failed"), value);
                    self.model.insert(key.clone(), value.clone());
                }
            }
            AdapterOperation::Update { key, patch } => {
                let result = self.adapter.update(key, patch.clone());
                match self.model.get_mut(key) {
                    Some(current) => {
                        for (name, field) in patch {
                            if name != ID_FIELD {
                                current.insert(name.clone(), field.clone());
                            }
                        }
                        assert_eq!(&result.expect("update failed"), current);
                    }
                    None => expect_not_found(result, key),
                }
            }
            AdapterOperation::Remove { key } => {
                let result = self.adapter.remove(key);
                match self.model.remove(key) {
                    Some(_) => result.expect("remove failed"),
                    None => expect_not_found(result, key),
                }
            }
            AdapterOperation::Get { key } => {
                let result = self.adapter.get(key);
                match self.model.get(key) {
                    Some(expected) => assert_eq!(&result.expect("get failed"), expected),
                    None => expect_not_found(result, key),
                }
            }
        }
    }

    /// Applies every operation, then checks the full contents.
    pub fn run(&mut self, ops: &[AdapterOperation]) {
        for op in ops {
            self.apply(op);
        }
        self.verify();
    }

    /// Checks that `all()` equals the model.
    ///
    /// # Panics
    ///
    /// Panics if the contents differ.
    pub fn verify(&self) {
        let actual = self.adapter.all().expect("all failed");
        assert_eq!(actual, self.model, "adapter contents diverged from model");
    }
}

fn expect_not_found<T: std::fmt::Debug>(result: Result<T, AdapterError>, key: &str) {
    match result {
        Err(AdapterError::NotFound { key: missing }) => assert_eq!(missing, key),
        other => panic!("expected NotFound for {key}, got {other:?}"),
    }
}

fn expect_already_exists(result: Result<Document, AdapterError>, key: &str) {
    match result {
        Err(AdapterError::AlreadyExists { key: existing }) => assert_eq!(existing, key),
        other => panic!("expected AlreadyExists for {key}, got {other:?}"),
    }
}
