//! Exact-match queries.

use crate::document::{Document, ID_FIELD};
use serde_json::Value;

/// A conjunction of exact field equalities.
///
/// An empty query matches every document.
///
/// ```rust
/// use nedb_core::Query;
/// use serde_json::json;
///
/// let query = Query::all().field("image", "nginx").field("port", 80);
/// let doc = json!({"_id": "app1", "image": "nginx", "port": 80});
/// assert!(query.matches(doc.as_object().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    fields: Document,
}

impl Query {
    /// Creates a query matching every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Creates a query matching the document with the given `_id`.
    #[must_use]
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::all().field(ID_FIELD, id.into())
    }

    /// Adds a field equality.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Returns true if this query matches every document.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the `_id` this query pins, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.fields.get(ID_FIELD).and_then(Value::as_str)
    }

    /// Returns true if every query field equals the document's field.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        self.fields
            .iter()
            .all(|(name, expected)| doc.get(name) == Some(expected))
    }

    pub(crate) fn fields(&self) -> &Document {
        &self.fields
    }
}

impl From<Document> for Query {
    fn from(fields: Document) -> Self {
        Self { fields }
    }
}
