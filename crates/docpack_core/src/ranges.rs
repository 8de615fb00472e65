//! Dead byte range tracking.
//!
//! Every time a value is superseded, the bytes it occupied in the value
//! buffer are recorded here until the next commit reclaims them.
//!
//! ## Merge rule
//!
//! Only exact adjacency merges: `[0, 9]` and `[10, 19]` become `[0, 19]`.
//! Ranges are compared against the range being added, not against the
//! result of earlier merges in the same call, and overlapping ranges are
//! never unioned.

use std::fmt;
use tracing::trace;

/// An inclusive byte range `[start, end]` in the value buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DataRange {
    /// First byte of the range.
    pub start: usize,
    /// Last byte of the range (inclusive).
    pub end: usize,
}

impl DataRange {
    /// Creates a range covering `start..=end`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `end < start`.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "range end before start");
        Self { start, end }
    }

    /// Creates the range covered by `size` bytes at `offset`.
    ///
    /// Returns `None` for an empty span.
    #[must_use]
    pub fn from_span(offset: usize, size: usize) -> Option<Self> {
        if size == 0 {
            return None;
        }
        Some(Self::new(offset, offset + size - 1))
    }

    /// Number of bytes covered, never zero.
    #[must_use]
    pub fn bytes(&self) -> usize {
        self.end - self.start + 1
    }

    /// Whether `other` starts right after this range ends, or ends right
    /// before it starts.
    #[must_use]
    pub fn is_adjacent(&self, other: &DataRange) -> bool {
        self.start == other.end + 1 || other.start == self.end + 1
    }

    /// Whether the two ranges share at least one byte.
    #[must_use]
    pub fn overlaps(&self, other: &DataRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    fn union(&self, other: &DataRange) -> DataRange {
        DataRange::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for DataRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// The set of dead ranges pending reclamation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRanges {
    ranges: Vec<DataRange>,
}

impl DataRanges {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a dead range, merging it with every existing range adjacent
    /// to it.
    pub fn add_range(&mut self, range: DataRange) {
        let mut merged = range;
        self.ranges.retain(|existing| {
            if existing.is_adjacent(&range) {
                merged = merged.union(existing);
                false
            } else {
                true
            }
        });
        if merged != range {
            trace!(%range, %merged, "merged adjacent dead ranges");
        }
        self.ranges.push(merged);
    }

    /// Orders ranges by ascending start.
    pub fn sort(&mut self) {
        self.ranges.sort_by_key(|r| r.start);
    }

    /// Orders ranges by descending start.
    pub fn reverse_sort(&mut self) {
        self.ranges.sort_by(|a, b| b.start.cmp(&a.start));
    }

    /// Forgets every range.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Whether no range is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of distinct ranges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Read-only view of the ranges in their current order.
    #[must_use]
    pub fn ranges(&self) -> &[DataRange] {
        &self.ranges
    }

    /// Total number of dead bytes.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        self.ranges.iter().map(DataRange::bytes).sum()
    }
}
