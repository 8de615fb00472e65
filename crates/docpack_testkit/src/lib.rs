//! # DocPack Testkit
//!
//! Test utilities for DocPack.
//!
//! This crate provides:
//! - Sample documents, an update document builder and temp-file helpers
//! - Property-based test generators using proptest
//! - Invariant checks for committed and pending documents
//! - Fuzz testing harnesses
//! - Wire-format test vectors
//!
//! ## Usage
//!
//! ```rust
//! use docpack_testkit::prelude::*;
//! use docpack_codec::Value;
//!
//! let mut doc = document_from(&person());
//! doc.update(&UpdateSpec::new().inc("age", Value::Unsigned(1)).build())
//!     .unwrap();
//! doc.commit().unwrap();
//! assert_committed(&doc);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod invariants;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use crate::invariants::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use invariants::*;
pub use vectors::*;
