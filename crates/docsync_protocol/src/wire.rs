//! Wire field names and lookup helpers shared by the event codecs.
//!
//! Field names match the remote service's own change stream documents and
//! must not change.

use crate::error::{ProtocolError, ProtocolResult};
use docsync_codec::{Document, Value};

pub(crate) const ID: &str = "_id";
pub(crate) const OPERATION_TYPE: &str = "operationType";
pub(crate) const FULL_DOCUMENT: &str = "fullDocument";
pub(crate) const DOCUMENT_KEY: &str = "documentKey";
pub(crate) const NS: &str = "ns";
pub(crate) const NS_DB: &str = "db";
pub(crate) const NS_COLL: &str = "coll";
pub(crate) const UPDATE_DESCRIPTION: &str = "updateDescription";
pub(crate) const UPDATED_FIELDS: &str = "updatedFields";
pub(crate) const REMOVED_FIELDS: &str = "removedFields";
pub(crate) const WRITE_PENDING: &str = "writePending";

/// Joins a parent path and a field name for error reporting.
pub(crate) fn path(parent: Option<&str>, field: &str) -> String {
    match parent {
        Some(parent) => format!("{parent}.{field}"),
        None => field.to_string(),
    }
}

pub(crate) fn required<'a>(
    document: &'a Document,
    parent: Option<&str>,
    field: &str,
) -> ProtocolResult<&'a Value> {
    document
        .get(field)
        .ok_or_else(|| ProtocolError::missing_field(path(parent, field)))
}

pub(crate) fn required_document<'a>(
    document: &'a Document,
    parent: Option<&str>,
    field: &str,
) -> ProtocolResult<&'a Document> {
    required(document, parent, field)?
        .as_document()
        .ok_or_else(|| ProtocolError::invalid_field(path(parent, field), "document"))
}

pub(crate) fn required_text<'a>(
    document: &'a Document,
    parent: Option<&str>,
    field: &str,
) -> ProtocolResult<&'a str> {
    required(document, parent, field)?
        .as_text()
        .ok_or_else(|| ProtocolError::invalid_field(path(parent, field), "text"))
}

/// Reads `writePending`, defaulting to `false` when absent.
pub(crate) fn write_pending(document: &Document) -> ProtocolResult<bool> {
    match document.get(WRITE_PENDING) {
        None => Ok(false),
        Some(value) => value
            .as_bool()
            .ok_or_else(|| ProtocolError::invalid_field(WRITE_PENDING, "bool")),
    }
}

/// Reads `fullDocument`; a non-document value is treated as absent.
pub(crate) fn full_document(document: &Document) -> Option<Document> {
    document
        .get(FULL_DOCUMENT)
        .and_then(Value::as_document)
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_codec::doc;

    #[test]
    fn nested_paths_in_errors() {
        let document = doc! { "ns" => doc! { "db" => 1 } };
        let ns = required_document(&document, None, NS).unwrap();

        assert_eq!(
            required_text(ns, Some(NS), NS_DB),
            Err(ProtocolError::invalid_field("ns.db", "text"))
        );
        assert_eq!(
            required_text(ns, Some(NS), NS_COLL),
            Err(ProtocolError::missing_field("ns.coll"))
        );
    }

    #[test]
    fn write_pending_defaults_to_false() {
        assert_eq!(write_pending(&doc! {}), Ok(false));
        assert_eq!(write_pending(&doc! { "writePending" => true }), Ok(true));
        assert!(write_pending(&doc! { "writePending" => "yes" }).is_err());
    }

    #[test]
    fn non_document_full_document_is_absent() {
        assert_eq!(full_document(&doc! { "fullDocument" => 5 }), None);
        assert_eq!(
            full_document(&doc! { "fullDocument" => doc! { "a" => 1 } }),
            Some(doc! { "a" => 1 })
        );
    }
}
