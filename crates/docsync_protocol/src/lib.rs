//! # docsync Protocol
//!
//! Change events and conflict resolution for offline-first document sync.
//!
//! This crate provides:
//! - [`ChangeEvent`] and [`CompactChangeEvent`], one observed mutation of one
//!   document, with their document wire form
//! - [`UpdateDescription`] for field-level deltas
//! - [`ConflictHandler`] with the [`remote_wins`] and [`local_wins`] policies
//! - [`Conflict`], the per-document `Idle -> Conflicted -> Resolving ->
//!   Resolved -> Idle` state machine
//! - [`Reconciler`] for picking a handler per namespace
//!
//! This is a pure protocol crate with no I/O operations.
//!
//! ## Usage
//!
//! ```
//! use docsync_codec::doc;
//! use docsync_protocol::{
//!     ChangeEvent, CompactChangeEvent, Conflict, ConflictResolution, Namespace,
//!     OperationType, Reconciler,
//! };
//!
//! let ns = Namespace::new("foo", "bar");
//! let local = ChangeEvent::replace(
//!     doc! { "_data" => "01" },
//!     ns.clone(),
//!     doc! { "_id" => 1 },
//!     doc! { "_id" => 1, "name" => "A" },
//!     true,
//! );
//! let remote = CompactChangeEvent::new(
//!     OperationType::Replace,
//!     Some(doc! { "_id" => 1, "name" => "B" }),
//!     doc! { "_id" => 1 },
//!     None,
//!     false,
//! );
//!
//! let mut conflict = Conflict::detect(ns, local, remote).unwrap();
//! let reconciler: Reconciler = Reconciler::default();
//! assert_eq!(
//!     reconciler.reconcile(&mut conflict).unwrap(),
//!     &ConflictResolution::UseRemote
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod change_event;
mod compact;
mod conflict;
mod error;
mod namespace;
mod operation;
mod reconciler;
mod state;
mod update_description;
mod wire;

pub use change_event::{ChangeEvent, FullDocument};
pub use compact::CompactChangeEvent;
pub use conflict::{local_wins, remote_wins, ConflictHandler, ConflictPolicy, ConflictResolution};
pub use error::{ProtocolError, ProtocolResult};
pub use namespace::Namespace;
pub use operation::OperationType;
pub use reconciler::{Reconciler, ReconcilerConfig, SharedHandler};
pub use state::{Conflict, ConflictState};
pub use update_description::UpdateDescription;
