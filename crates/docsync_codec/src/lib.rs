//! # docsync Codec
//!
//! Structured document model and CBOR encoding for docsync.
//!
//! This crate provides:
//! - [`Value`], the closed set of shapes a field can hold
//! - [`Document`], an insertion-ordered field map
//! - [`to_cbor`] / [`from_cbor`] for moving documents over the wire
//!
//! ## Usage
//!
//! ```
//! use docsync_codec::{doc, from_cbor, to_cbor};
//!
//! let document = doc! { "_id" => 1, "name" => "A" };
//! let bytes = to_cbor(&document).unwrap();
//!
//! assert_eq!(from_cbor(&bytes).unwrap(), document);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cbor;
mod document;
mod error;
mod value;

pub use cbor::{from_cbor, to_cbor};
pub use document::Document;
pub use error::{CodecError, CodecResult};
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            (-1.0e9f64..1.0e9).prop_map(Value::Double),
            "[a-zA-Z0-9 ]{0,16}".prop_map(Value::Text),
            prop::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        leaf().prop_recursive(3, 32, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::vec(("[a-z]{1,6}", inner), 0..4)
                    .prop_map(|pairs| Value::Document(Document::from_pairs(pairs))),
            ]
        })
    }

    proptest! {
        #[test]
        fn any_document_roundtrips(pairs in prop::collection::vec(("[a-z_]{1,8}", value()), 0..6)) {
            let document = Document::from_pairs(pairs);
            let bytes = to_cbor(&document).unwrap();
            prop_assert_eq!(from_cbor(&bytes).unwrap(), document);
        }
    }
}
