//! CBOR byte encoding for documents.
//!
//! Documents are written as CBOR maps with text keys in insertion order.
//! Decoding goes through [`ciborium::Value`] and rejects anything that
//! is not a document: non-map top level, non-text keys, and integers
//! outside the i64 range.

use crate::document::Document;
use crate::error::{CodecError, CodecResult};
use crate::value::Value;
use ciborium::value::Value as CborValue;

/// Encode a document to CBOR bytes.
///
/// # Errors
///
/// Returns an error if the underlying writer fails.
pub fn to_cbor(document: &Document) -> CodecResult<Vec<u8>> {
    let mut buffer = Vec::new();
    ciborium::ser::into_writer(document, &mut buffer)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buffer)
}

/// Decode a document from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not valid CBOR, if the top-level item
/// is not a map, or if any nested item cannot be represented as a
/// [`Value`].
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Document> {
    let raw: CborValue = ciborium::de::from_reader(bytes)
        .map_err(|e| CodecError::decoding_failed(e.to_string()))?;

    match convert(raw)? {
        Value::Document(document) => Ok(document),
        other => Err(CodecError::invalid_structure(format!(
            "expected map at top level, found {}",
            other.type_name()
        ))),
    }
}

fn convert(raw: CborValue) -> CodecResult<Value> {
    match raw {
        CborValue::Null => Ok(Value::Null),
        CborValue::Bool(b) => Ok(Value::Bool(b)),
        CborValue::Integer(n) => i64::try_from(n)
            .map(Value::Integer)
            .map_err(|_| CodecError::IntegerOverflow),
        CborValue::Float(d) => Ok(Value::Double(d)),
        CborValue::Text(s) => Ok(Value::Text(s)),
        CborValue::Bytes(b) => Ok(Value::Bytes(b)),
        // Tags carry no meaning for documents; keep the payload.
        CborValue::Tag(_, inner) => convert(*inner),
        CborValue::Array(items) => items
            .into_iter()
            .map(convert)
            .collect::<CodecResult<Vec<_>>>()
            .map(Value::Array),
        CborValue::Map(pairs) => {
            let mut document = Document::new();
            for (key, value) in pairs {
                let CborValue::Text(key) = key else {
                    return Err(CodecError::invalid_structure(
                        "document keys must be text strings",
                    ));
                };
                if document.insert(key, convert(value)?).is_some() {
                    return Err(CodecError::invalid_structure("duplicate document key"));
                }
            }
            Ok(Value::Document(document))
        }
        other => Err(CodecError::unsupported_type(format!("{other:?}"))),
    }
}
