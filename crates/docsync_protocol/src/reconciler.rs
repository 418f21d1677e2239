//! Per-namespace handler selection.

use crate::change_event::ChangeEvent;
use crate::compact::CompactChangeEvent;
use crate::conflict::{ConflictHandler, ConflictPolicy, ConflictResolution};
use crate::error::{ProtocolError, ProtocolResult};
use crate::namespace::Namespace;
use crate::state::{Conflict, ConflictState};
use docsync_codec::{Document, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A shared conflict handler.
pub type SharedHandler<T = Document> = Arc<dyn ConflictHandler<T>>;

/// Which handler resolves conflicts in which namespace.
///
/// Namespaces without an override use the default handler, which is
/// [`ConflictPolicy::RemoteWins`] unless replaced.
pub struct ReconcilerConfig<T = Document> {
    default_handler: SharedHandler<T>,
    namespace_handlers: HashMap<Namespace, SharedHandler<T>>,
}

impl<T: 'static> ReconcilerConfig<T> {
    /// Creates a configuration with the remote-wins default and no overrides.
    pub fn new() -> Self {
        Self {
            default_handler: Arc::new(ConflictPolicy::RemoteWins),
            namespace_handlers: HashMap::new(),
        }
    }

    /// Sets the handler used for namespaces without an override.
    pub fn with_default_handler<H>(mut self, handler: H) -> Self
    where
        H: ConflictHandler<T> + 'static,
    {
        self.default_handler = Arc::new(handler);
        self
    }

    /// Sets an already shared handler as the default.
    pub fn with_shared_default_handler(mut self, handler: SharedHandler<T>) -> Self {
        self.default_handler = handler;
        self
    }

    /// Overrides the handler for one namespace. A later override for the
    /// same namespace replaces the earlier one.
    pub fn with_namespace_handler<H>(mut self, namespace: Namespace, handler: H) -> Self
    where
        H: ConflictHandler<T> + 'static,
    {
        self.namespace_handlers.insert(namespace, Arc::new(handler));
        self
    }

    /// Namespaces with an override.
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespace_handlers.keys()
    }

    /// Builds the reconciler.
    pub fn build(self) -> Reconciler<T> {
        Reconciler {
            config: Arc::new(self),
        }
    }
}

impl<T: 'static> Default for ReconcilerConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ReconcilerConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut namespaces: Vec<_> = self.namespace_handlers.keys().collect();
        namespaces.sort();
        f.debug_struct("ReconcilerConfig")
            .field("namespace_handlers", &namespaces)
            .finish_non_exhaustive()
    }
}

/// Resolves conflicts with the handler configured for their namespace.
///
/// Cloning is cheap; clones share the same configuration.
pub struct Reconciler<T = Document> {
    config: Arc<ReconcilerConfig<T>>,
}

impl<T> Clone for Reconciler<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

impl<T> fmt::Debug for Reconciler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish()
    }
}

impl<T: 'static> Default for Reconciler<T> {
    fn default() -> Self {
        ReconcilerConfig::new().build()
    }
}

impl<T> Reconciler<T> {
    /// The handler responsible for `namespace`.
    pub fn handler_for(&self, namespace: &Namespace) -> &SharedHandler<T> {
        self.config
            .namespace_handlers
            .get(namespace)
            .unwrap_or(&self.config.default_handler)
    }

    /// Resolves one conflict without tracking its state.
    pub fn resolve(
        &self,
        namespace: &Namespace,
        document_id: &Value,
        local: &ChangeEvent<T>,
        remote: &CompactChangeEvent<T>,
    ) -> ConflictResolution<T> {
        let resolution = self
            .handler_for(namespace)
            .resolve_conflict(document_id, local, remote);
        debug!(
            namespace = %namespace,
            document_id = ?document_id,
            local_op = %local.operation_type(),
            remote_op = %remote.operation_type(),
            resolution = resolution.kind(),
            "resolved conflict"
        );
        resolution
    }

    /// Drives a conflict from `Conflicted` (or `Resolving`, on a retried
    /// pass) to `Resolved` and returns the stored outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidStateTransition`] if the conflict is
    /// idle or already resolved.
    pub fn reconcile<'c>(
        &self,
        conflict: &'c mut Conflict<T>,
    ) -> ProtocolResult<&'c ConflictResolution<T>> {
        let handler = self.handler_for(conflict.namespace());
        if conflict.state() == ConflictState::Conflicted {
            conflict.begin_resolving()?;
        }
        let kind = conflict.resolve_with(handler.as_ref())?.kind();
        debug!(
            namespace = %conflict.namespace(),
            document_id = ?conflict.document_id(),
            resolution = kind,
            "reconciled conflict"
        );
        let state = conflict.state();
        conflict
            .resolution()
            .ok_or(ProtocolError::InvalidStateTransition {
                from: state,
                to: ConflictState::Resolved,
            })
    }
}
