//! Per-document conflict state machine.
//!
//! ```text
//! Idle -> Conflicted -> Resolving -> Resolved -> Idle
//! ```
//!
//! Detection (`Idle -> Conflicted`) and application (`Resolved -> Idle`)
//! belong to the synchronization driver. This crate computes the
//! `Resolving -> Resolved` step.

use crate::change_event::ChangeEvent;
use crate::compact::CompactChangeEvent;
use crate::conflict::{ConflictHandler, ConflictResolution};
use crate::error::{ProtocolError, ProtocolResult};
use crate::namespace::Namespace;
use docsync_codec::{Document, Value};
use tracing::trace;

/// Where a document is in its conflict cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictState {
    /// No divergence known.
    Idle,
    /// A local pending write and a remote event disagree.
    Conflicted,
    /// A handler is computing the outcome.
    Resolving,
    /// An outcome exists and awaits application.
    Resolved,
}

impl ConflictState {
    /// Returns true if `next` directly follows this state.
    pub fn can_transition_to(&self, next: ConflictState) -> bool {
        matches!(
            (self, next),
            (ConflictState::Idle, ConflictState::Conflicted)
                | (ConflictState::Conflicted, ConflictState::Resolving)
                | (ConflictState::Resolving, ConflictState::Resolved)
                | (ConflictState::Resolved, ConflictState::Idle)
        )
    }

    /// Returns true while a resolution is pending or in flight.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ConflictState::Conflicted | ConflictState::Resolving | ConflictState::Resolved
        )
    }
}

/// One document's divergence between a local pending write and the latest
/// remote event.
///
/// The driver must keep at most one `Conflict` in flight per document.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict<T = Document> {
    namespace: Namespace,
    document_id: Value,
    local: ChangeEvent<T>,
    remote: CompactChangeEvent<T>,
    state: ConflictState,
    resolution: Option<ConflictResolution<T>>,
}

impl<T> Conflict<T> {
    /// Creates a conflict already in the [`ConflictState::Conflicted`] state.
    pub fn new(
        namespace: Namespace,
        document_id: Value,
        local: ChangeEvent<T>,
        remote: CompactChangeEvent<T>,
    ) -> Self {
        Self {
            namespace,
            document_id,
            local,
            remote,
            state: ConflictState::Conflicted,
            resolution: None,
        }
    }

    /// Namespace of the document.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Identity of the document.
    pub fn document_id(&self) -> &Value {
        &self.document_id
    }

    /// Local side.
    pub fn local(&self) -> &ChangeEvent<T> {
        &self.local
    }

    /// Remote side.
    pub fn remote(&self) -> &CompactChangeEvent<T> {
        &self.remote
    }

    /// Current state.
    pub fn state(&self) -> ConflictState {
        self.state
    }

    /// The outcome, once resolved.
    pub fn resolution(&self) -> Option<&ConflictResolution<T>> {
        self.resolution.as_ref()
    }

    /// Returns true once an outcome has been computed.
    pub fn is_resolved(&self) -> bool {
        self.state == ConflictState::Resolved
    }

    fn transition(&mut self, next: ConflictState) -> ProtocolResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(ProtocolError::InvalidStateTransition {
                from: self.state,
                to: next,
            });
        }
        trace!(
            namespace = %self.namespace,
            document_id = ?self.document_id,
            from = ?self.state,
            to = ?next,
            "conflict state transition"
        );
        self.state = next;
        Ok(())
    }

    /// `Conflicted -> Resolving`.
    pub fn begin_resolving(&mut self) -> ProtocolResult<()> {
        self.transition(ConflictState::Resolving)
    }

    /// `Resolving -> Resolved`: runs the handler and stores its outcome.
    pub fn resolve_with<H>(&mut self, handler: &H) -> ProtocolResult<&ConflictResolution<T>>
    where
        H: ConflictHandler<T> + ?Sized,
    {
        if self.state != ConflictState::Resolving {
            return Err(ProtocolError::InvalidStateTransition {
                from: self.state,
                to: ConflictState::Resolved,
            });
        }
        let resolution = handler.resolve_conflict(&self.document_id, &self.local, &self.remote);
        self.transition(ConflictState::Resolved)?;
        Ok(&*self.resolution.insert(resolution))
    }

    /// `Resolved -> Idle`: hands the outcome to the driver once it has been
    /// applied and acknowledged.
    pub fn acknowledge(&mut self) -> ProtocolResult<ConflictResolution<T>> {
        self.transition(ConflictState::Idle)?;
        self.resolution.take().ok_or(ProtocolError::InvalidStateTransition {
            from: ConflictState::Resolved,
            to: ConflictState::Idle,
        })
    }
}

impl<T: Clone> Conflict<T> {
    /// The document state the stored resolution leads to. `None` if the
    /// conflict is not resolved or the winning side is a delete.
    pub fn winning_document(&self) -> Option<T> {
        self.resolution
            .as_ref()
            .and_then(|resolution| resolution.winning_document(&self.local, &self.remote))
    }
}

impl<T: PartialEq> Conflict<T> {
    /// Detects a conflict between a local event and a remote event.
    ///
    /// Returns `Some` only when the local event is an unconfirmed write,
    /// both events name the same document, and they disagree on whether the
    /// document exists or on its content. Content is the post image; when
    /// either side has none, the update descriptions are compared as well.
    ///
    /// Document keys match when they hold the same fields, in any order.
    /// Values nested inside a key are still compared in field order.
    ///
    /// The document id is the key's `_id`, or the whole key when it has
    /// none.
    pub fn detect(
        namespace: Namespace,
        local: ChangeEvent<T>,
        remote: CompactChangeEvent<T>,
    ) -> Option<Self> {
        if !local.has_uncommitted_writes()
            || !same_key(local.document_key(), remote.document_key())
        {
            return None;
        }

        let existence_differs =
            local.operation_type().is_delete() != remote.operation_type().is_delete();
        let image_differs = local.full_document() != remote.full_document();
        let delta_differs = (local.full_document().is_none() || remote.full_document().is_none())
            && local.update_description() != remote.update_description();
        if !existence_differs && !image_differs && !delta_differs {
            return None;
        }

        let document_id = local
            .document_id()
            .cloned()
            .unwrap_or_else(|| Value::Document(local.document_key().clone()));

        let conflict = Self::new(namespace, document_id, local, remote);
        trace!(
            namespace = %conflict.namespace,
            document_id = ?conflict.document_id,
            "conflict detected"
        );
        Some(conflict)
    }
}

fn same_key(a: &Document, b: &Document) -> bool {
    a.len() == b.len() && a.iter().all(|(field, value)| b.get(field) == Some(value))
}
