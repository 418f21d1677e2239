//! Field-level deltas attached to update events.

use crate::error::{ProtocolError, ProtocolResult};
use crate::wire;
use docsync_codec::{Document, Value};
use std::collections::BTreeSet;

/// The fields an update changed.
///
/// `updated_fields` maps dotted field paths to their new values in the
/// order they were recorded; `removed_fields` is the set of dotted paths
/// that were unset. A path never appears in both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateDescription {
    updated_fields: Document,
    removed_fields: BTreeSet<String>,
}

impl UpdateDescription {
    /// Creates a description from updated and removed paths.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ConflictingFieldPath`] if a path is both
    /// updated and removed.
    pub fn new<I, S>(updated_fields: Document, removed_fields: I) -> ProtocolResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let removed_fields: BTreeSet<String> = removed_fields.into_iter().map(Into::into).collect();
        if let Some(path) = removed_fields
            .iter()
            .find(|path| updated_fields.contains_key(path))
        {
            return Err(ProtocolError::ConflictingFieldPath { path: path.clone() });
        }
        Ok(Self {
            updated_fields,
            removed_fields,
        })
    }

    /// Records a new value for a path, clearing any removal of it.
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        let path = path.into();
        self.removed_fields.remove(&path);
        self.updated_fields.insert(path, value);
        self
    }

    /// Records a removal of a path, clearing any new value for it.
    pub fn unset(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.updated_fields.remove(&path);
        self.removed_fields.insert(path);
        self
    }

    /// Updated paths and their new values.
    pub fn updated_fields(&self) -> &Document {
        &self.updated_fields
    }

    /// Removed paths.
    pub fn removed_fields(&self) -> &BTreeSet<String> {
        &self.removed_fields
    }

    /// Returns true if nothing was updated or removed.
    pub fn is_empty(&self) -> bool {
        self.updated_fields.is_empty() && self.removed_fields.is_empty()
    }

    /// Applies a later delta on top of this one.
    ///
    /// A later set or unset of a path replaces anything recorded for that
    /// path or for paths nested under it.
    pub fn merge(&self, later: &UpdateDescription) -> Self {
        let mut merged = self.clone();
        for (path, value) in later.updated_fields.iter() {
            merged.drop_nested(path);
            merged = merged.set(path, value.clone());
        }
        for path in &later.removed_fields {
            merged.drop_nested(path);
            merged = merged.unset(path.clone());
        }
        merged
    }

    fn drop_nested(&mut self, parent: &str) {
        let prefix = format!("{parent}.");
        let nested: Vec<String> = self
            .updated_fields
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .map(str::to_string)
            .collect();
        for key in nested {
            self.updated_fields.remove(&key);
        }
        self.removed_fields.retain(|key| !key.starts_with(&prefix));
    }

    /// Computes the delta that turns `before` into `after`.
    ///
    /// Nested documents present on both sides are compared field by field
    /// and reported with dotted paths; any other differing value is
    /// reported whole.
    pub fn diff(before: &Document, after: &Document) -> Self {
        let mut description = Self::default();
        description.diff_into(None, before, after);
        description
    }

    fn diff_into(&mut self, prefix: Option<&str>, before: &Document, after: &Document) {
        for (key, old) in before.iter() {
            let path = wire::path(prefix, key);
            match (after.get(key), old) {
                (None, _) => {
                    self.removed_fields.insert(path);
                }
                (Some(Value::Document(new)), Value::Document(old)) => {
                    self.diff_into(Some(&path), old, new);
                }
                (Some(new), old) if new != old => {
                    self.updated_fields.insert(path, new.clone());
                }
                _ => {}
            }
        }
        for (key, new) in after.iter() {
            if !before.contains_key(key) {
                self.updated_fields.insert(wire::path(prefix, key), new.clone());
            }
        }
    }

    /// Renders as an update document with `$set` and `$unset` sections.
    /// Empty sections are omitted.
    pub fn to_update_document(&self) -> Document {
        let mut update = Document::new();
        if !self.updated_fields.is_empty() {
            update.insert("$set", self.updated_fields.clone());
        }
        if !self.removed_fields.is_empty() {
            let unset: Document = self
                .removed_fields
                .iter()
                .map(|path| (path.as_str(), true))
                .collect();
            update.insert("$unset", unset);
        }
        update
    }

    /// Serializes to `{updatedFields, removedFields}`.
    pub fn to_document(&self) -> Document {
        let removed: Vec<Value> = self
            .removed_fields
            .iter()
            .map(|path| Value::from(path.as_str()))
            .collect();
        let mut document = Document::new();
        document.insert(wire::UPDATED_FIELDS, self.updated_fields.clone());
        document.insert(wire::REMOVED_FIELDS, removed);
        document
    }

    /// Deserializes from `{updatedFields, removedFields}`.
    ///
    /// # Errors
    ///
    /// Fails if either key is missing or malformed, or if a path is both
    /// updated and removed.
    pub fn from_document(document: &Document) -> ProtocolResult<Self> {
        Self::from_document_at(document, None)
    }

    pub(crate) fn from_document_at(document: &Document, parent: Option<&str>) -> ProtocolResult<Self> {
        let updated = wire::required_document(document, parent, wire::UPDATED_FIELDS)?;
        let removed_path = wire::path(parent, wire::REMOVED_FIELDS);
        let removed = wire::required(document, parent, wire::REMOVED_FIELDS)?
            .as_array()
            .ok_or_else(|| ProtocolError::invalid_field(removed_path.as_str(), "array"))?
            .iter()
            .map(|value| {
                value
                    .as_text()
                    .ok_or_else(|| ProtocolError::invalid_field(removed_path.as_str(), "array of text"))
            })
            .collect::<ProtocolResult<Vec<_>>>()?;
        Self::new(updated.clone(), removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_codec::doc;

    #[test]
    fn new_rejects_overlap() {
        let result = UpdateDescription::new(doc! { "a" => 1 }, ["a"]);
        assert_eq!(
            result,
            Err(ProtocolError::ConflictingFieldPath { path: "a".into() })
        );
        assert!(UpdateDescription::new(doc! { "a" => 1 }, ["b"]).is_ok());
    }

    #[test]
    fn set_and_unset_keep_paths_disjoint() {
        let description = UpdateDescription::default()
            .set("name", "A")
            .unset("name")
            .set("age", 3)
            .unset("tags")
            .set("tags", Value::Array(vec![]));

        assert_eq!(description.updated_fields(), &doc! { "age" => 3, "tags" => Value::Array(vec![]) });
        assert_eq!(
            description.removed_fields().iter().collect::<Vec<_>>(),
            vec!["name"]
        );
    }

    #[test]
    fn empty_is_distinct_from_populated() {
        assert!(UpdateDescription::default().is_empty());
        assert!(!UpdateDescription::default().unset("a").is_empty());
    }

    #[test]
    fn merge_later_wins() {
        let earlier = UpdateDescription::default()
            .set("a", 1)
            .set("b.c", 2)
            .unset("d");
        let later = UpdateDescription::default().unset("a").set("b", doc! {}).set("d", 4);

        let merged = earlier.merge(&later);
        assert_eq!(merged.updated_fields(), &doc! { "b" => doc! {}, "d" => 4 });
        assert_eq!(
            merged.removed_fields().iter().collect::<Vec<_>>(),
            vec!["a"]
        );
    }

    #[test]
    fn diff_reports_nested_paths() {
        let before = doc! {
            "_id" => 1,
            "name" => "A",
            "address" => doc! { "city" => "Arusha", "zip" => "23100" },
            "legacy" => true,
        };
        let after = doc! {
            "_id" => 1,
            "name" => "B",
            "address" => doc! { "city" => "Moshi", "zip" => "23100" },
            "tags" => vec![Value::from("new")],
        };

        let description = UpdateDescription::diff(&before, &after);
        assert_eq!(
            description.updated_fields(),
            &doc! {
                "name" => "B",
                "address.city" => "Moshi",
                "tags" => vec![Value::from("new")],
            }
        );
        assert_eq!(
            description.removed_fields().iter().collect::<Vec<_>>(),
            vec!["legacy"]
        );
    }

    #[test]
    fn diff_of_equal_documents_is_empty() {
        let document = doc! { "a" => 1, "b" => doc! { "c" => 2 } };
        assert!(UpdateDescription::diff(&document, &document).is_empty());
    }

    #[test]
    fn diff_replaces_type_changes_whole() {
        let before = doc! { "a" => doc! { "b" => 1 } };
        let after = doc! { "a" => 5 };
        let description = UpdateDescription::diff(&before, &after);
        assert_eq!(description.updated_fields(), &doc! { "a" => 5 });
        assert!(description.removed_fields().is_empty());
    }

    #[test]
    fn update_document_sections() {
        let description = UpdateDescription::default().set("a", 1).unset("b");
        assert_eq!(
            description.to_update_document(),
            doc! {
                "$set" => doc! { "a" => 1 },
                "$unset" => doc! { "b" => true },
            }
        );

        let only_set = UpdateDescription::default().set("a", 1);
        assert!(!only_set.to_update_document().contains_key("$unset"));
        assert!(UpdateDescription::default().to_update_document().is_empty());
    }

    #[test]
    fn document_roundtrip() {
        let description = UpdateDescription::default().set("x.y", "z").unset("w");
        let document = description.to_document();
        assert_eq!(
            document,
            doc! {
                "updatedFields" => doc! { "x.y" => "z" },
                "removedFields" => vec![Value::from("w")],
            }
        );
        assert_eq!(UpdateDescription::from_document(&document).unwrap(), description);
    }

    #[test]
    fn from_document_requires_both_keys() {
        assert_eq!(
            UpdateDescription::from_document(&doc! { "removedFields" => Vec::<Value>::new() }),
            Err(ProtocolError::missing_field("updatedFields"))
        );
        assert_eq!(
            UpdateDescription::from_document(&doc! { "updatedFields" => doc! {} }),
            Err(ProtocolError::missing_field("removedFields"))
        );
    }

    #[test]
    fn from_document_rejects_bad_shapes() {
        let document = doc! {
            "updatedFields" => doc! {},
            "removedFields" => vec![Value::Integer(1)],
        };
        assert_eq!(
            UpdateDescription::from_document(&document),
            Err(ProtocolError::invalid_field("removedFields", "array of text"))
        );

        let document = doc! { "updatedFields" => 1, "removedFields" => Vec::<Value>::new() };
        assert_eq!(
            UpdateDescription::from_document(&document),
            Err(ProtocolError::invalid_field("updatedFields", "document"))
        );
    }

    #[test]
    fn from_document_rejects_overlap() {
        let document = doc! {
            "updatedFields" => doc! { "a" => 1 },
            "removedFields" => vec![Value::from("a")],
        };
        assert!(matches!(
            UpdateDescription::from_document(&document),
            Err(ProtocolError::ConflictingFieldPath { .. })
        ));
    }
}
