//! Property-based test generators using proptest.
//!
//! Every strategy here produces values that survive a trip through the
//! document wire form: doubles are finite, update descriptions keep their
//! updated and removed paths disjoint, and namespaces have non-empty parts.

use docsync_codec::{Document, Value};
use docsync_protocol::{
    ChangeEvent, CompactChangeEvent, Namespace, OperationType, UpdateDescription,
};
use proptest::prelude::*;

/// Strategy for field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9_]{0,11}"
}

/// Strategy for dotted field paths of one to three segments.
pub fn field_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(field_name_strategy(), 1..=3).prop_map(|segments| segments.join("."))
}

/// Strategy for leaf values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Integer),
        (-1.0e12..1.0e12f64).prop_map(Value::Double),
        "\\PC{0,16}".prop_map(Value::Text),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
    ]
}

/// Strategy for values nested up to three levels deep.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((field_name_strategy(), inner), 0..4)
                .prop_map(|pairs| Value::Document(pairs.into_iter().collect())),
        ]
    })
}

/// Strategy for documents with up to six top-level fields.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    prop::collection::vec((field_name_strategy(), value_strategy()), 0..6)
        .prop_map(|pairs| pairs.into_iter().collect())
}

/// Strategy for `_id` values.
pub fn document_id_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Integer),
        "[0-9a-f]{24}".prop_map(Value::Text),
    ]
}

/// Strategy for document keys carrying an `_id`.
pub fn document_key_strategy() -> impl Strategy<Value = Document> {
    document_id_strategy().prop_map(|id| Document::from_pairs([("_id", id)]))
}

/// Strategy for stream resume tokens.
pub fn resume_token_strategy() -> impl Strategy<Value = Document> {
    "[0-9A-F]{8,32}".prop_map(|data| Document::from_pairs([("_data", data)]))
}

/// Strategy for namespaces.
pub fn namespace_strategy() -> impl Strategy<Value = Namespace> {
    ("[a-z][a-z0-9_]{0,7}", "[a-z][a-z0-9_]{0,11}")
        .prop_map(|(database, collection)| Namespace::new(database, collection))
}

/// Strategy for operation types, including [`OperationType::Unknown`].
pub fn operation_type_strategy() -> impl Strategy<Value = OperationType> {
    prop_oneof![
        3 => Just(OperationType::Insert),
        3 => Just(OperationType::Update),
        2 => Just(OperationType::Replace),
        2 => Just(OperationType::Delete),
        1 => Just(OperationType::Unknown),
    ]
}

/// Strategy for update descriptions.
pub fn update_description_strategy() -> impl Strategy<Value = UpdateDescription> {
    let set = (field_path_strategy(), value_strategy()).prop_map(|(path, value)| (path, Some(value)));
    let unset = field_path_strategy().prop_map(|path| (path, None));
    prop::collection::vec(prop_oneof![set, unset], 0..6).prop_map(|steps| {
        steps
            .into_iter()
            .fold(UpdateDescription::default(), |description, (path, value)| match value {
                Some(value) => description.set(path, value),
                None => description.unset(path),
            })
    })
}

/// Strategy for change events whose optional fields follow their operation
/// type: deletes carry no post image and only updates carry a delta.
pub fn change_event_strategy() -> impl Strategy<Value = ChangeEvent> {
    (
        resume_token_strategy(),
        operation_type_strategy(),
        document_strategy(),
        namespace_strategy(),
        document_key_strategy(),
        update_description_strategy(),
        any::<bool>(),
    )
        .prop_map(|(id, operation_type, body, namespace, key, description, pending)| {
            let full_document = (!operation_type.is_delete()).then(|| with_key(body, &key));
            let update_description = (operation_type == OperationType::Update).then_some(description);
            ChangeEvent::new(
                id,
                operation_type,
                full_document,
                namespace,
                key,
                update_description,
                pending,
            )
        })
}

/// Strategy for change events with no constraint between fields.
pub fn any_change_event_strategy() -> impl Strategy<Value = ChangeEvent> {
    (
        resume_token_strategy(),
        operation_type_strategy(),
        prop::option::of(document_strategy()),
        namespace_strategy(),
        document_key_strategy(),
        prop::option::of(update_description_strategy()),
        any::<bool>(),
    )
        .prop_map(|(id, operation_type, full_document, namespace, key, description, pending)| {
            ChangeEvent::new(id, operation_type, full_document, namespace, key, description, pending)
        })
}

/// Strategy for compact change events.
pub fn compact_change_event_strategy() -> impl Strategy<Value = CompactChangeEvent> {
    change_event_strategy().prop_map(CompactChangeEvent::from)
}

fn with_key(body: Document, key: &Document) -> Document {
    let mut document: Document = key.iter().map(|(k, v)| (k, v.clone())).collect();
    for (field, value) in body {
        if !key.contains_key(&field) {
            document.insert(field, value);
        }
    }
    document
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl PropTestConfig {
    /// Fewer cases, for strategies that build whole change events.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 64,
            max_shrink_iters: 200,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn field_paths_have_no_empty_segments(path in field_path_strategy()) {
            prop_assert!(path.split('.').all(|segment| !segment.is_empty()));
        }

        #[test]
        fn update_descriptions_are_disjoint(description in update_description_strategy()) {
            for path in description.removed_fields() {
                prop_assert!(!description.updated_fields().contains_key(path));
            }
        }

        #[test]
        fn events_follow_their_operation(event in change_event_strategy()) {
            if event.operation_type().is_delete() {
                prop_assert!(event.full_document().is_none());
            } else {
                let full_document = event.full_document().unwrap();
                prop_assert_eq!(full_document.get("_id"), event.document_id());
            }
            prop_assert_eq!(
                event.update_description().is_some(),
                event.operation_type() == OperationType::Update
            );
        }

        #[test]
        fn namespaces_render_with_one_dot(namespace in namespace_strategy()) {
            prop_assert_eq!(namespace.to_string().matches('.').count(), 1);
        }
    }
}
