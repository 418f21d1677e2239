//! Compact change events.

use crate::change_event::FullDocument;
use crate::error::{ProtocolError, ProtocolResult};
use crate::operation::OperationType;
use crate::update_description::UpdateDescription;
use crate::wire;
use docsync_codec::{from_cbor, to_cbor, Document, Value};

/// A change event without its resume token and namespace.
///
/// Used for the remote side of a conflict, where the namespace and the
/// document are already known from the local event being compared.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactChangeEvent<T = Document> {
    operation_type: OperationType,
    full_document: Option<T>,
    document_key: Document,
    update_description: Option<UpdateDescription>,
    has_uncommitted_writes: bool,
}

impl<T> CompactChangeEvent<T> {
    /// Creates a compact change event.
    pub fn new(
        operation_type: OperationType,
        full_document: Option<T>,
        document_key: Document,
        update_description: Option<UpdateDescription>,
        has_uncommitted_writes: bool,
    ) -> Self {
        Self {
            operation_type,
            full_document,
            document_key,
            update_description,
            has_uncommitted_writes,
        }
    }

    /// Operation type.
    pub fn operation_type(&self) -> OperationType {
        self.operation_type
    }

    /// Post image, if any.
    pub fn full_document(&self) -> Option<&T> {
        self.full_document.as_ref()
    }

    /// Key of the changed document.
    pub fn document_key(&self) -> &Document {
        &self.document_key
    }

    /// The `_id` entry of the document key.
    pub fn document_id(&self) -> Option<&Value> {
        self.document_key.get(wire::ID)
    }

    /// Field delta, if any.
    pub fn update_description(&self) -> Option<&UpdateDescription> {
        self.update_description.as_ref()
    }

    /// Whether this is a write not yet confirmed by the remote store.
    pub fn has_uncommitted_writes(&self) -> bool {
        self.has_uncommitted_writes
    }
}

impl<T: Clone> CompactChangeEvent<T> {
    /// Returns a copy of this event marked as confirmed.
    pub fn without_uncommitted_writes(&self) -> Self {
        Self {
            has_uncommitted_writes: false,
            ..self.clone()
        }
    }
}

impl<T: FullDocument> CompactChangeEvent<T> {
    /// Serializes to the wire document, without `_id` and `ns`.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        document.insert(wire::OPERATION_TYPE, self.operation_type.to_remote());
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

    /// Encodes to CBOR bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(to_cbor(&self.to_document())?)
    }
}

impl CompactChangeEvent<Document> {
    /// Deserializes from the wire document.
    ///
    /// # Errors
    ///
    /// Fails with [`ProtocolError::MissingField`] if `operationType` or
    /// `documentKey` is absent, and with [`ProtocolError::InvalidField`] on
    /// malformed fields.
    pub fn from_document(document: &Document) -> ProtocolResult<Self> {
        let operation_type = wire::required_text(document, None, wire::OPERATION_TYPE)?;
        let document_key = wire::required_document(document, None, wire::DOCUMENT_KEY)?.clone();
        let update_description = match document.get(wire::UPDATE_DESCRIPTION) {
            Some(Value::Document(description)) => Some(UpdateDescription::from_document_at(
                description,
                Some(wire::UPDATE_DESCRIPTION),
            )?),
            Some(_) => {
                return Err(ProtocolError::invalid_field(
                    wire::UPDATE_DESCRIPTION,
                    "document",
                ))
            }
            None => None,
        };

        Ok(Self {
            operation_type: OperationType::from_remote(operation_type),
            full_document: wire::full_document(document),
            document_key,
            update_description,
            has_uncommitted_writes: wire::write_pending(document)?,
        })
    }

    /// Decodes from CBOR bytes.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Self::from_document(&from_cbor(bytes)?)
    }
}
