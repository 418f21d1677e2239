//! Error types for the protocol crate.

use crate::state::ConflictState;
use docsync_codec::CodecError;
use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while decoding change events or driving a
/// conflict through its states.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A required field is absent from a serialized document.
    #[error("missing required field: {field}")]
    MissingField {
        /// Dotted path of the missing field.
        field: String,
    },

    /// A field is present but has the wrong shape.
    #[error("invalid field {field}: expected {expected}")]
    InvalidField {
        /// Dotted path of the offending field.
        field: String,
        /// Shape the field should have had.
        expected: &'static str,
    },

    /// A field path is listed as both updated and removed.
    #[error("field path {path} is both updated and removed")]
    ConflictingFieldPath {
        /// The offending path.
        path: String,
    },

    /// A namespace string could not be parsed.
    #[error("invalid namespace: {0}")]
    InvalidNamespace(String),

    /// A conflict was driven through its states out of order.
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidStateTransition {
        /// Current state.
        from: ConflictState,
        /// Attempted target state.
        to: ConflictState,
    },

    /// Byte-level codec error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl ProtocolError {
    /// Creates a missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an invalid field error.
    pub fn invalid_field(field: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidField {
            field: field.into(),
            expected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::missing_field("documentKey");
        assert_eq!(err.to_string(), "missing required field: documentKey");

        let err = ProtocolError::invalid_field("ns.db", "text");
        assert_eq!(err.to_string(), "invalid field ns.db: expected text");

        let err = ProtocolError::InvalidStateTransition {
            from: ConflictState::Idle,
            to: ConflictState::Resolved,
        };
        assert!(err.to_string().contains("Idle"));
        assert!(err.to_string().contains("Resolved"));
    }

    #[test]
    fn codec_errors_convert() {
        let err: ProtocolError = CodecError::IntegerOverflow.into();
        assert!(matches!(err, ProtocolError::Codec(CodecError::IntegerOverflow)));
    }
}
