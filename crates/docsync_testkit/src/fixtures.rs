//! Canned change events for the common conflict scenarios.
//!
//! All fixtures target document `{_id: 1}` in namespace `foo.bar`.

use docsync_codec::{doc, Document, Value};
use docsync_protocol::{
    ChangeEvent, CompactChangeEvent, Conflict, Namespace, OperationType, UpdateDescription,
};

/// The namespace every fixture uses.
pub fn namespace() -> Namespace {
    Namespace::new("foo", "bar")
}

/// The `_id` every fixture uses.
pub fn document_id() -> Value {
    Value::Integer(1)
}

/// Key of the fixture document.
pub fn document_key() -> Document {
    doc! { "_id" => 1 }
}

/// The fixture document with the given name.
pub fn named(name: &str) -> Document {
    doc! { "_id" => 1, "name" => name }
}

/// A local, unconfirmed update setting `name`.
pub fn local_update(name: &str) -> ChangeEvent {
    ChangeEvent::update(
        doc! { "_data" => "L1" },
        namespace(),
        document_key(),
        UpdateDescription::default().set("name", name),
        Some(named(name)),
        true,
    )
}

/// A local, unconfirmed delete.
pub fn local_delete() -> ChangeEvent {
    ChangeEvent::delete(doc! { "_data" => "L2" }, namespace(), document_key(), true)
}

/// A confirmed remote update setting `name`.
pub fn remote_update(name: &str) -> CompactChangeEvent {
    CompactChangeEvent::new(
        OperationType::Update,
        Some(named(name)),
        document_key(),
        Some(UpdateDescription::default().set("name", name)),
        false,
    )
}

/// A confirmed remote delete.
pub fn remote_delete() -> CompactChangeEvent {
    CompactChangeEvent::new(OperationType::Delete, None, document_key(), None, false)
}

/// A freshly detected conflict between a local and a remote name change.
///
/// # Panics
///
/// Panics if `local` and `remote` are equal, since no conflict exists then.
pub fn name_conflict(local: &str, remote: &str) -> Conflict {
    match Conflict::detect(namespace(), local_update(local), remote_update(remote)) {
        Some(conflict) => conflict,
        None => panic!("names {local:?} and {remote:?} do not conflict"),
    }
}
