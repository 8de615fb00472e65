//! Buffer compaction.
//!
//! Updates never rewrite bytes in place: a superseded value stays in the
//! buffer and its span is recorded as a dead range. Committing removes
//! those spans and shifts every later leaf down so that the buffer holds
//! exactly the live values again.
//!
//! ## Invariants
//!
//! - Compaction **MUST NOT** change logical state
//! - After a commit the buffer length equals the sum of live leaf sizes
//! - Every leaf is in bounds after a commit
//! - A second commit without intervening updates is a no-op

use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::ranges::DataRange;
use tracing::{debug, warn};

/// Result of a commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactionResult {
    /// Number of dead ranges removed.
    pub ranges_reclaimed: usize,
    /// Bytes removed from the buffer.
    pub bytes_reclaimed: usize,
    /// Leaves whose offset changed.
    pub leaves_moved: usize,
    /// Buffer length before the commit.
    pub buffer_len_before: usize,
    /// Buffer length after the commit.
    pub buffer_len_after: usize,
}

impl CompactionResult {
    /// Whether the commit had nothing to do.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.ranges_reclaimed == 0
    }
}

/// Commits or discards the pending dead ranges of a document.
///
/// ## Example
///
/// ```ignore
/// use docpack_core::compaction::Compactor;
///
/// let result = Compactor::new(&mut doc).commit()?;
/// assert_eq!(doc.buffer().len(), result.buffer_len_after);
/// ```
pub struct Compactor<'d> {
    doc: &'d mut Document,
}

impl<'d> Compactor<'d> {
    /// Creates a compactor over `doc`.
    pub fn new(doc: &'d mut Document) -> Self {
        Self { doc }
    }

    /// Removes every dead range from the buffer.
    ///
    /// Ranges are validated before anything is touched, so a failed commit
    /// leaves the document as it was.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corruption`] if a dead range lies outside the
    /// buffer or overlaps a live leaf or another dead range.
    pub fn commit(self) -> CoreResult<CompactionResult> {
        let doc = self.doc;
        let buffer_len_before = doc.buffer.len();
        if doc.dead.is_empty() {
            return Ok(CompactionResult {
                buffer_len_before,
                buffer_len_after: buffer_len_before,
                ..CompactionResult::default()
            });
        }

        // Drop detached subtrees first so the flat reindex pass below only
        // sees reachable leaves.
        doc.structure.compact_arena();

        let mut live: Vec<DataRange> = doc
            .structure
            .live_leaves()
            .iter()
            .filter_map(|leaf| leaf.range())
            .collect();
        live.sort_by_key(|r| r.start);
        doc.dead.sort();
        check_dead_ranges(doc.dead.ranges(), &live, buffer_len_before)?;

        let first_end = doc.dead.ranges().first().map_or(usize::MAX, |r| r.end);
        let leaves_moved = live.iter().filter(|r| r.start >= first_end).count();

        // Reindex from the back so each shift sees offsets that earlier
        // (higher) ranges have not moved yet.
        doc.dead.reverse_sort();
        for range in doc.dead.ranges() {
            let delta = range.bytes();
            for leaf in doc.structure.leaves_mut() {
                if leaf.offset >= range.end {
                    leaf.offset -= delta;
                }
            }
        }

        doc.dead.sort();
        let bytes_reclaimed = doc.dead.total_bytes();
        let mut compacted = Vec::with_capacity(buffer_len_before - bytes_reclaimed);
        let mut cursor = 0;
        for range in doc.dead.ranges() {
            compacted.extend_from_slice(&doc.buffer[cursor..range.start]);
            cursor = range.end + 1;
        }
        compacted.extend_from_slice(&doc.buffer[cursor..]);

        let result = CompactionResult {
            ranges_reclaimed: doc.dead.len(),
            bytes_reclaimed,
            leaves_moved,
            buffer_len_before,
            buffer_len_after: compacted.len(),
        };
        doc.buffer = compacted;
        doc.dead.clear();

        debug!(
            ranges = result.ranges_reclaimed,
            bytes = result.bytes_reclaimed,
            leaves_moved = result.leaves_moved,
            buffer_len = result.buffer_len_after,
            "committed document"
        );
        Ok(result)
    }

    /// Forgets the pending dead ranges; returns how many were dropped.
    ///
    /// Applied writes are kept, and the superseded bytes become
    /// unreachable until the document is rebuilt.
    pub fn rollback(self) -> usize {
        let dropped = self.doc.dead.len();
        self.doc.dead.clear();
        if dropped > 0 {
            debug!(ranges = dropped, "rolled back pending dead ranges");
        }
        dropped
    }
}

/// Validates sorted dead ranges against the sorted live spans and the
/// buffer length.
pub(crate) fn check_dead_ranges(
    dead: &[DataRange],
    live: &[DataRange],
    buffer_len: usize,
) -> CoreResult<()> {
    for (i, range) in dead.iter().enumerate() {
        if range.end >= buffer_len {
            warn!(%range, buffer_len, "dead range outside buffer");
            return Err(CoreError::corruption(format!(
                "dead range {range} outside buffer of {buffer_len} bytes"
            )));
        }
        if let Some(next) = dead.get(i + 1) {
            if range.overlaps(next) {
                warn!(first = %range, second = %next, "overlapping dead ranges");
                return Err(CoreError::corruption(format!(
                    "dead ranges {range} and {next} overlap"
                )));
            }
        }
        let idx = live.partition_point(|span| span.end < range.start);
        if let Some(span) = live.get(idx).filter(|span| span.overlaps(range)) {
            warn!(%range, live = %span, "dead range covers a live value");
            return Err(CoreError::corruption(format!(
                "dead range {range} overlaps live value {span}"
            )));
        }
    }
    Ok(())
}
