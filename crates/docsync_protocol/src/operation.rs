//! Change event operation types.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// The kind of mutation a change event describes.
///
/// Each variant has a fixed lowercase wire token. Tokens this version does
/// not know about decode as [`OperationType::Unknown`] instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Document was inserted.
    Insert,
    /// Document was updated in place.
    Update,
    /// Document was replaced wholesale.
    Replace,
    /// Document was deleted.
    Delete,
    /// Operation kind not recognized by this version.
    #[serde(other)]
    Unknown,
}

impl OperationType {
    /// Converts to the wire token.
    pub fn to_remote(&self) -> &'static str {
        match self {
            OperationType::Insert => "insert",
            OperationType::Update => "update",
            OperationType::Replace => "replace",
            OperationType::Delete => "delete",
            OperationType::Unknown => "unknown",
        }
    }

    /// Converts from a wire token. Never fails.
    pub fn from_remote(token: &str) -> Self {
        match token {
            "insert" => OperationType::Insert,
            "update" => OperationType::Update,
            "replace" => OperationType::Replace,
            "delete" => OperationType::Delete,
            _ => OperationType::Unknown,
        }
    }

    /// Returns true if events of this kind must carry a full document.
    pub fn requires_full_document(&self) -> bool {
        matches!(self, OperationType::Insert | OperationType::Replace)
    }

    /// Returns true for deletes.
    pub fn is_delete(&self) -> bool {
        matches!(self, OperationType::Delete)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_remote())
    }
}

impl FromStr for OperationType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_remote(s))
    }
}
