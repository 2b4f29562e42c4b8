//! Datafile line format.
//!
//! The datafile is newline-delimited JSON:
//!
//! ```text
//! {"_id":"app1","image":"nginx","port":80}
//! {"_id":"app1","image":"nginx","port":8080}
//! {"$$deleted":true,"_id":"app1"}
//! ```
//!
//! Every line is a full document. A later line for the same `_id`
//! supersedes earlier ones, and a `$$deleted` line removes it.

use crate::document::{id_of, Document, ID_FIELD};
use crate::error::DatastoreResult;
use serde_json::Value;
use std::collections::BTreeMap;

/// Marker field of a tombstone line.
pub(crate) const DELETED_FLAG: &str = "$$deleted";

/// Result of replaying a datafile.
#[derive(Debug, Default)]
pub(crate) struct ReplayedLog {
    /// Live documents by `_id`.
    pub docs: BTreeMap<String, Document>,
    /// Non-blank lines seen.
    pub total: usize,
    /// Lines that were not a document with a string `_id`.
    pub corrupt: usize,
}

impl ReplayedLog {
    /// Returns true if the corrupt fraction exceeds `threshold`.
    pub fn exceeds(&self, threshold: f64) -> bool {
        self.total > 0 && (self.corrupt as f64 / self.total as f64) > threshold
    }
}

/// Replays a datafile into its live documents.
pub(crate) fn replay(data: &[u8]) -> ReplayedLog {
    let mut log = ReplayedLog::default();

    for line in data.split(|b| *b == b'\n') {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        log.total += 1;

        let doc = match serde_json::from_slice::<Value>(line) {
            Ok(Value::Object(doc)) => doc,
            _ => {
                log.corrupt += 1;
                continue;
            }
        };

        let Some(id) = id_of(&doc).map(str::to_owned) else {
            log.corrupt += 1;
            continue;
        };

        if doc.get(DELETED_FLAG) == Some(&Value::Bool(true)) {
            log.docs.remove(&id);
        } else {
            log.docs.insert(id, doc);
        }
    }

    log
}

/// Encodes one document line.
pub(crate) fn document_line(doc: &Document) -> DatastoreResult<Vec<u8>> {
    let mut line = serde_json::to_vec(doc)?;
    line.push(b'\n');
    Ok(line)
}

/// Encodes one tombstone line.
pub(crate) fn tombstone_line(id: &str) -> DatastoreResult<Vec<u8>> {
    let mut tombstone = Document::new();
    tombstone.insert(DELETED_FLAG.to_string(), Value::Bool(true));
    tombstone.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    document_line(&tombstone)
}

/// Encodes the compacted datafile: one line per live document.
pub(crate) fn snapshot<'a>(
    docs: impl IntoIterator<Item = &'a Document>,
) -> DatastoreResult<Vec<u8>> {
    let mut out = Vec::new();
    for doc in docs {
        out.extend_from_slice(&document_line(doc)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_lines_supersede_earlier_ones() {
        let data = b"{\"_id\":\"a\",\"v\":1}\n{\"_id\":\"b\",\"v\":1}\n{\"_id\":\"a\",\"v\":2}\n";
        let log = replay(data);

        assert_eq!(log.total, 3);
        assert_eq!(log.corrupt, 0);
        assert_eq!(log.docs.len(), 2);
        assert_eq!(log.docs["a"]["v"], Value::from(2));
    }

    #[test]
    fn tombstones_remove_documents() {
        let mut data = b"{\"_id\":\"a\",\"v\":1}\n".to_vec();
        data.extend_from_slice(&tombstone_line("a").unwrap());

        let log = replay(&data);
        assert!(log.docs.is_empty());
        assert_eq!(log.total, 2);
    }

    #[test]
    fn blank_lines_are_ignored() {
        let log = replay(b"\n\n{\"_id\":\"a\"}\n   \n");
        assert_eq!(log.total, 1);
        assert_eq!(log.docs.len(), 1);
    }

    #[test]
    fn corrupt_lines_are_counted() {
        let log = replay(b"{\"_id\":\"a\"}\nnot json\n[1,2]\n{\"no_id\":true}\n{\"_id\":5}\n");
        assert_eq!(log.total, 5);
        assert_eq!(log.corrupt, 4);
        assert_eq!(log.docs.len(), 1);
        assert!(log.exceeds(0.1));
        assert!(!log.exceeds(0.8));
    }

    #[test]
    fn empty_file_never_exceeds() {
        assert!(!replay(b"").exceeds(0.0));
    }
}
