//! Database and collection identity.

use crate::error::{ProtocolError, ProtocolResult};
use crate::wire;
use docsync_codec::{doc, Document};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where a change occurred: a database and a collection within it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    #[serde(rename = "db")]
    database: String,
    #[serde(rename = "coll")]
    collection: String,
}

impl Namespace {
    /// Creates a namespace.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Database name.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Collection name.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Serializes to `{db, coll}`.
    pub fn to_document(&self) -> Document {
        doc! {
            wire::NS_DB => self.database.as_str(),
            wire::NS_COLL => self.collection.as_str(),
        }
    }

    pub(crate) fn from_document(document: &Document, parent: &str) -> ProtocolResult<Self> {
        let database = wire::required_text(document, Some(parent), wire::NS_DB)?;
        let collection = wire::required_text(document, Some(parent), wire::NS_COLL)?;
        Ok(Self::new(database, collection))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

impl FromStr for Namespace {
    type Err = ProtocolError;

    /// Parses `db.coll`, splitting on the first dot. Collection names may
    /// themselves contain dots.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((database, collection)) if !database.is_empty() && !collection.is_empty() => {
                Ok(Self::new(database, collection))
            }
            _ => Err(ProtocolError::InvalidNamespace(s.to_string())),
        }
    }
}
