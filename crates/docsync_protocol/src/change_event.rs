//! Change events and their document wire form.

use crate::compact::CompactChangeEvent;
use crate::error::{ProtocolError, ProtocolResult};
use crate::namespace::Namespace;
use crate::operation::OperationType;
use crate::update_description::UpdateDescription;
use crate::wire;
use docsync_codec::{from_cbor, to_cbor, Document, Value};

/// A post image that may or may not be document-shaped.
///
/// Only document-shaped post images are written to the wire. A payload for
/// which [`FullDocument::to_document`] returns `None` is dropped when the
/// event is serialized and comes back as an absent `fullDocument`.
pub trait FullDocument {
    /// Returns this post image as a document, or `None` if it is not one.
    fn to_document(&self) -> Option<Document>;
}

impl FullDocument for Document {
    fn to_document(&self) -> Option<Document> {
        Some(self.clone())
    }
}

impl FullDocument for Value {
    fn to_document(&self) -> Option<Document> {
        self.as_document().cloned()
    }
}

/// One observed mutation of one document.
///
/// Change events are immutable. The only transformation is
/// [`ChangeEvent::without_uncommitted_writes`], which yields a new event.
///
/// # Fields
///
/// - `id`: resume token of the stream event, passed through untouched
/// - `operation_type`: what kind of mutation this was
/// - `full_document`: post image; absent for deletes
/// - `namespace`: database and collection of the document
/// - `document_key`: identifies the document, at least its `_id`
/// - `update_description`: field delta, for updates only
/// - `has_uncommitted_writes`: local write not yet confirmed remotely
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent<T = Document> {
    id: Document,
    operation_type: OperationType,
    full_document: Option<T>,
    namespace: Namespace,
    document_key: Document,
    update_description: Option<UpdateDescription>,
    has_uncommitted_writes: bool,
}

impl<T> ChangeEvent<T> {
    /// Creates a change event from all of its parts.
    pub fn new(
        id: Document,
        operation_type: OperationType,
        full_document: Option<T>,
        namespace: Namespace,
        document_key: Document,
        update_description: Option<UpdateDescription>,
        has_uncommitted_writes: bool,
    ) -> Self {
        Self {
            id,
            operation_type,
            full_document,
            namespace,
            document_key,
            update_description,
            has_uncommitted_writes,
        }
    }

    /// Creates an insert event.
    pub fn insert(
        id: Document,
        namespace: Namespace,
        document_key: Document,
        full_document: T,
        has_uncommitted_writes: bool,
    ) -> Self {
        Self::new(
            id,
            OperationType::Insert,
            Some(full_document),
            namespace,
            document_key,
            None,
            has_uncommitted_writes,
        )
    }

    /// Creates an update event.
    pub fn update(
        id: Document,
        namespace: Namespace,
        document_key: Document,
        update_description: UpdateDescription,
        full_document: Option<T>,
        has_uncommitted_writes: bool,
    ) -> Self {
        Self::new(
            id,
            OperationType::Update,
            full_document,
            namespace,
            document_key,
            Some(update_description),
            has_uncommitted_writes,
        )
    }

    /// Creates a replace event.
    pub fn replace(
        id: Document,
        namespace: Namespace,
        document_key: Document,
        full_document: T,
        has_uncommitted_writes: bool,
    ) -> Self {
        Self::new(
            id,
            OperationType::Replace,
            Some(full_document),
            namespace,
            document_key,
            None,
            has_uncommitted_writes,
        )
    }

    /// Creates a delete event.
    pub fn delete(
        id: Document,
        namespace: Namespace,
        document_key: Document,
        has_uncommitted_writes: bool,
    ) -> Self {
        Self::new(
            id,
            OperationType::Delete,
            None,
            namespace,
            document_key,
            None,
            has_uncommitted_writes,
        )
    }

    /// Resume token of this event.
    pub fn id(&self) -> &Document {
        &self.id
    }

    /// Operation type.
    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    /// Post image, if any.
    pub fn full_document(&self) -> Option<&T> {
        self.full_document.as_ref()
    }

    /// Namespace of the changed document.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Key of the changed document.
    pub fn document_key(&self) -> &Document {
        &self.document_key
    }

    /// The `_id` entry of the document key.
    pub fn document_id(&self) -> Option<&Value> {
        self.document_key.get(wire::ID)
    }

    /// Field delta, present only on updates that carried one.
    pub fn update_description(&self) -> Option<&UpdateDescription> {
        self.update_description.as_ref()
    }

    /// Whether this is a local write not yet confirmed by the remote store.
    pub fn has_uncommitted_writes(&self) -> bool {
        self.has_uncommitted_writes
    }

    /// Converts the post image, keeping every other field.
    pub fn map_full_document<U>(self, f: impl FnOnce(T) -> U) -> ChangeEvent<U> {
        ChangeEvent {
            id: self.id,
            operation_type: self.operation_type,
            full_document: self.full_document.map(f),
            namespace: self.namespace,
            document_key: self.document_key,
            update_description: self.update_description,
            has_uncommitted_writes: self.has_uncommitted_writes,
        }
    }
}

impl<T: Clone> ChangeEvent<T> {
    /// Returns a copy of this event marked as confirmed.
    pub fn without_uncommitted_writes(&self) -> Self {
        Self {
            has_uncommitted_writes: false,
            ..self.clone()
        }
    }

    /// Returns the compact form of this event, dropping id and namespace.
    pub fn to_compact(&self) -> CompactChangeEvent<T> {
        self.clone().into()
    }
}

impl<T> From<ChangeEvent<T>> for CompactChangeEvent<T> {
    fn from(event: ChangeEvent<T>) -> Self {
        CompactChangeEvent::new(
            event.operation_type,
            event.full_document,
            event.document_key,
            event.update_description,
            event.has_uncommitted_writes,
        )
    }
}

impl<T: FullDocument> ChangeEvent<T> {
    /// Serializes this event to its wire document.
    ///
    /// `fullDocument` is written only when the post image is
    /// document-shaped; `updateDescription` only when present.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert(wire::ID, self.id.clone());
        document.insert(wire::OPERATION_TYPE, self.operation_type.to_remote());
        document.insert(wire::NS, self.namespace.to_document());
        document.insert(wire::DOCUMENT_KEY, self.document_key.clone());
        if let Some(full_document) = self.full_document.as_ref().and_then(T::to_document) {
            document.insert(wire::FULL_DOCUMENT, full_document);
        }
        if let Some(update_description) = &self.update_description {
            document.insert(wire::UPDATE_DESCRIPTION, update_description.to_document());
        }
        document.insert(wire::WRITE_PENDING, self.has_uncommitted_writes);
        document
    }

    /// Encodes this event to CBOR bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(to_cbor(&self.to_document())?)
    }
}

impl ChangeEvent<Document> {
    /// Deserializes an event from its wire document.
    ///
    /// # Errors
    ///
    /// - [`MissingField`](crate::ProtocolError::MissingField) if `_id`,
    ///   `operationType`, `ns` or `documentKey` is absent
    /// - [`InvalidField`](crate::ProtocolError::InvalidField) if one of them,
    ///   `updateDescription` or `writePending` has the wrong shape
    ///
    /// An unrecognized `operationType` is not an error and decodes as
    /// [`OperationType::Unknown`]. A missing `writePending` decodes as
    /// `false`.
    pub fn from_document(document: &Document) -> ProtocolResult<Self> {
        let id = wire::required_document(document, None, wire::ID)?.clone();
        let operation_type = wire::required_text(document, None, wire::OPERATION_TYPE)?;
        let ns = wire::required_document(document, None, wire::NS)?;
        let document_key = wire::required_document(document, None, wire::DOCUMENT_KEY)?.clone();

        let update_description = match document.get(wire::UPDATE_DESCRIPTION) {
            Some(value) => {
                let description = value.as_document().ok_or_else(|| {
                    ProtocolError::invalid_field(wire::UPDATE_DESCRIPTION, "document")
                })?;
                Some(UpdateDescription::from_document_at(
                    description,
                    Some(wire::UPDATE_DESCRIPTION),
                )?)
            }
            None => None,
        };

        Ok(Self {
            id,
            operation_type: OperationType::from_remote(operation_type),
            full_document: wire::full_document(document),
            namespace: Namespace::from_document(ns, wire::NS)?,
            document_key,
            update_description,
            has_uncommitted_writes: wire::write_pending(document)?,
        })
    }

    /// Decodes an event from CBOR bytes.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Self::from_document(&from_cbor(bytes)?)
    }
}
