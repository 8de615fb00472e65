//! Per-field update outcomes.

use std::fmt;

/// Why a field of an update was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The operator is not one of `$set`, `$inc`, `$unset`.
    UnsupportedOperator,
    /// `$inc` on a field that is not a number.
    NonNumericTarget,
    /// `$inc` with an operand that is not a number.
    NonNumericOperand,
    /// A segment of the path runs into a leaf, or addresses an array with
    /// something other than a decimal position.
    PathConflict,
    /// The path addresses the root.
    EmptyPath,
    /// The write would nest deeper than the configured limit.
    PathTooDeep,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnsupportedOperator => "unsupported operator",
            Self::NonNumericTarget => "target is not numeric",
            Self::NonNumericOperand => "operand is not numeric",
            Self::PathConflict => "path runs through a scalar",
            Self::EmptyPath => "empty path",
            Self::PathTooDeep => "path too deep",
        })
    }
}

/// What happened to one field of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOutcome {
    /// The field now holds a different value.
    Changed,
    /// The field already held the requested value.
    Unchanged,
    /// The field was left alone.
    Skipped {
        /// Why.
        reason: SkipReason,
    },
}

impl FieldOutcome {
    /// Shorthand for a skip.
    #[must_use]
    pub const fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    /// Whether the field was changed.
    #[must_use]
    pub const fn is_changed(&self) -> bool {
        matches!(self, Self::Changed)
    }
}

impl fmt::Display for FieldOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Changed => f.write_str("changed"),
            Self::Unchanged => f.write_str("unchanged"),
            Self::Skipped { reason } => write!(f, "skipped ({reason})"),
        }
    }
}

/// Outcome of one `(operator, path)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldReport {
    /// Operator name as written in the update document.
    pub operator: String,
    /// Field path as written in the update document.
    pub path: String,
    /// What happened.
    pub outcome: FieldOutcome,
}

/// Result of applying an update document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Whether any field changed.
    pub changed: bool,
    /// Outcomes of the fields that were processed, in update order.
    pub fields: Vec<FieldReport>,
    /// Whether fields were left unprocessed because the first change ended
    /// the update.
    pub stopped_early: bool,
}

impl UpdateReport {
    /// Outcome for `path`, if it was processed.
    #[must_use]
    pub fn outcome(&self, path: &str) -> Option<FieldOutcome> {
        self.fields
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.outcome)
    }

    /// Number of processed fields that changed.
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.fields.iter().filter(|f| f.outcome.is_changed()).count()
    }

    /// Processed fields that were skipped.
    pub fn skipped(&self) -> impl Iterator<Item = &FieldReport> {
        self.fields
            .iter()
            .filter(|f| matches!(f.outcome, FieldOutcome::Skipped { .. }))
    }
}
