//! Update descriptions and operation options.

use crate::datastore::Query;
use crate::document::{id_of, Document, ID_FIELD};
use crate::error::{DatastoreError, DatastoreResult};

/// How an update changes matched documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Replace every field except `_id`.
    Replace(Document),
    /// `$set`: change only the named fields, keep the rest.
    Set(Document),
}

impl Update {
    /// Computes the new version of `current`.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::IdModification`] if the update names a
    /// different `_id` than the document has.
    pub(crate) fn apply(&self, current: &Document) -> DatastoreResult<Document> {
        let fields = self.fields();
        if let Some(id) = fields.get(ID_FIELD) {
            if current.get(ID_FIELD) != Some(id) {
                return Err(DatastoreError::IdModification);
            }
        }

        let mut next = match self {
            Self::Replace(replacement) => replacement.clone(),
            Self::Set(patch) => {
                let mut next = current.clone();
                for (name, value) in patch {
                    next.insert(name.clone(), value.clone());
                }
                next
            }
        };

        if let Some(id) = current.get(ID_FIELD) {
            next.insert(ID_FIELD.to_string(), id.clone());
        }
        Ok(next)
    }

    /// Builds the document inserted by an upsert that matched nothing.
    pub(crate) fn upsert_document(&self, query: &Query) -> Document {
        match self {
            Self::Replace(replacement) => {
                let mut doc = replacement.clone();
                if id_of(&doc).is_none() {
                    if let Some(id) = query.id() {
                        doc.insert(ID_FIELD.to_string(), id.into());
                    }
                }
                doc
            }
            Self::Set(patch) => {
                let mut doc = query.fields().clone();
                for (name, value) in patch {
                    doc.insert(name.clone(), value.clone());
                }
                doc
            }
        }
    }

    fn fields(&self) -> &Document {
        match self {
            Self::Replace(fields) | Self::Set(fields) => fields,
        }
    }
}

/// Options for [`crate::Datastore::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Insert a document when nothing matches.
    pub upsert: bool,
    /// Update every match instead of the first.
    pub multi: bool,
}

impl UpdateOptions {
    /// Options with `upsert` enabled.
    #[must_use]
    pub const fn upsert() -> Self {
        Self {
            upsert: true,
            multi: false,
        }
    }

    /// Sets whether every match is updated.
    #[must_use]
    pub const fn multi(mut self, value: bool) -> Self {
        self.multi = value;
        self
    }
}

/// Options for [`crate::Datastore::remove`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Remove every match instead of the first.
    pub multi: bool,
}

impl RemoveOptions {
    /// Options removing every match.
    #[must_use]
    pub const fn multi() -> Self {
        Self { multi: true }
    }
}
