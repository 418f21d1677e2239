//! Conflict resolution protocol and default policies.

use crate::change_event::ChangeEvent;
use crate::compact::CompactChangeEvent;
use docsync_codec::{Document, Value};
use serde::{Deserialize, Serialize};

/// Outcome of resolving one conflict.
#[derive(Debug, Clone, PartialEq)]
pub enum ConflictResolution<T = Document> {
    /// The remote side's state wins, including a remote delete.
    UseRemote,
    /// The local side's state wins.
    UseLocal,
    /// A document built by the policy becomes the new state.
    Merged(T),
}

impl<T> ConflictResolution<T> {
    /// Resolution using a policy-built document.
    pub fn merged(document: T) -> Self {
        ConflictResolution::Merged(document)
    }

    /// Stable name of the outcome, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ConflictResolution::UseRemote => "use_remote",
            ConflictResolution::UseLocal => "use_local",
            ConflictResolution::Merged(_) => "merged",
        }
    }

    /// Returns true for [`ConflictResolution::Merged`].
    pub fn is_merged(&self) -> bool {
        matches!(self, ConflictResolution::Merged(_))
    }
}

impl<T: Clone> ConflictResolution<T> {
    /// The document state this resolution leads to.
    ///
    /// `None` means the document should not exist, e.g. when the winning
    /// side is a delete.
    pub fn winning_document(
        &self,
        local: &ChangeEvent<T>,
        remote: &CompactChangeEvent<T>,
    ) -> Option<T> {
        match self {
            ConflictResolution::UseRemote => remote.full_document().cloned(),
            ConflictResolution::UseLocal => local.full_document().cloned(),
            ConflictResolution::Merged(document) => Some(document.clone()),
        }
    }
}

/// Decides which state wins when a local pending write and a remote event
/// disagree about one document.
///
/// Implementations must be pure and deterministic: the same three inputs
/// always give the same resolution, so a retried reconciliation pass gets
/// the same answer. They must not assume either side has a full document.
/// There is no failure path; a handler that cannot decide returns one of
/// the three outcomes anyway.
///
/// Any `Fn(&Value, &ChangeEvent<T>, &CompactChangeEvent<T>) ->
/// ConflictResolution<T>` closure that is `Send + Sync` is a handler.
pub trait ConflictHandler<T>: Send + Sync {
    /// Resolves a conflict for the document identified by `document_id`.
    fn resolve_conflict(
        &self,
        document_id: &Value,
        local: &ChangeEvent<T>,
        remote: &CompactChangeEvent<T>,
    ) -> ConflictResolution<T>;
}

impl<T, F> ConflictHandler<T> for F
where
    F: Fn(&Value, &ChangeEvent<T>, &CompactChangeEvent<T>) -> ConflictResolution<T> + Send + Sync,
{
    fn resolve_conflict(
        &self,
        document_id: &Value,
        local: &ChangeEvent<T>,
        remote: &CompactChangeEvent<T>,
    ) -> ConflictResolution<T> {
        self(document_id, local, remote)
    }
}

/// Content-independent policies.
///
/// Both ignore their inputs entirely and never fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Remote store is authoritative.
    #[default]
    RemoteWins,
    /// Local pending write is kept.
    LocalWins,
}

impl ConflictPolicy {
    /// Converts to a code.
    pub fn to_code(&self) -> u8 {
        match self {
            ConflictPolicy::RemoteWins => 1,
            ConflictPolicy::LocalWins => 2,
        }
    }

    /// Converts from a code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ConflictPolicy::RemoteWins),
            2 => Some(ConflictPolicy::LocalWins),
            _ => None,
        }
    }
}

impl<T> ConflictHandler<T> for ConflictPolicy {
    fn resolve_conflict(
        &self,
        _document_id: &Value,
        _local: &ChangeEvent<T>,
        _remote: &CompactChangeEvent<T>,
    ) -> ConflictResolution<T> {
        match self {
            ConflictPolicy::RemoteWins => ConflictResolution::UseRemote,
            ConflictPolicy::LocalWins => ConflictResolution::UseLocal,
        }
    }
}

/// The remote event decides the next state of the document.
pub fn remote_wins() -> ConflictPolicy {
    ConflictPolicy::RemoteWins
}

/// The local event decides the next state of the document.
pub fn local_wins() -> ConflictPolicy {
    ConflictPolicy::LocalWins
}
