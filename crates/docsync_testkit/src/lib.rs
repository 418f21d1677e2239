//! # docsync Testkit
//!
//! Test utilities for docsync.
//!
//! This crate provides:
//! - Property-based test generators using proptest
//! - Canned change events for the common conflict scenarios
//!
//! ## Usage
//!
//! ```rust,ignore
//! use docsync_testkit::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn roundtrip(event in change_event_strategy()) {
//!         let decoded = ChangeEvent::from_document(&event.to_document()).unwrap();
//!         prop_assert_eq!(decoded, event);
//!     }
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures;
    pub use crate::generators::*;
    pub use proptest::prelude::*;
}

pub use generators::*;
