//! Field-level updates.
//!
//! An update document maps operator names to blocks of `path → operand`:
//!
//! ```text
//! { "$set": { "name": "Bob", "tags.0": "x" }, "$inc": { "visits": 1 } }
//! ```
//!
//! Fields are processed in document order. Each one reports a
//! [`FieldOutcome`]; a field that cannot be applied is skipped with a
//! [`SkipReason`] and never aborts the others. Unless
//! [`DocumentConfig::apply_all_fields`](crate::DocumentConfig::apply_all_fields)
//! is set, the first field that changes ends the update.

mod engine;
mod operator;
mod outcome;

pub(crate) use engine::apply_update;
pub use operator::UpdateOperator;
pub use outcome::{FieldOutcome, FieldReport, SkipReason, UpdateReport};
