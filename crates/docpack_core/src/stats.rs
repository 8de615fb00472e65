//! Document size and liveness statistics.
//!
//! # Usage
//!
//! ```rust,ignore
//! use docpack_core::Document;
//!
//! let doc = Document::make_document(&value)?;
//! let stats = doc.stats();
//! println!("live: {} / {}", stats.live_bytes, stats.buffer_len);
//! ```

use std::fmt;

/// A point-in-time snapshot of a document's storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentStats {
    /// Length of the value buffer.
    pub buffer_len: usize,
    /// Bytes referenced by live leaves.
    pub live_bytes: usize,
    /// Bytes covered by pending dead ranges.
    pub dead_bytes: usize,
    /// Reachable leaves.
    pub leaf_count: usize,
    /// Reachable dicts, root included.
    pub dict_count: usize,
    /// Reachable arrays, root included.
    pub array_count: usize,
    /// Pending dead ranges.
    pub pending_ranges: usize,
}

impl DocumentStats {
    /// Reachable containers of either kind.
    #[must_use]
    pub const fn container_count(&self) -> usize {
        self.dict_count + self.array_count
    }

    /// Bytes neither live nor pending reclamation. Non-zero only after a
    /// rollback left superseded values behind.
    #[must_use]
    pub const fn orphaned_bytes(&self) -> usize {
        self.buffer_len
            .saturating_sub(self.live_bytes)
            .saturating_sub(self.dead_bytes)
    }

    /// Fraction of the buffer held by live values (1.0 for an empty buffer).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn live_ratio(&self) -> f64 {
        if self.buffer_len == 0 {
            return 1.0;
        }
        self.live_bytes as f64 / self.buffer_len as f64
    }
}

impl fmt::Display for DocumentStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} leaves, {} containers, {}/{} live bytes, {} dead in {} ranges",
            self.leaf_count,
            self.container_count(),
            self.live_bytes,
            self.buffer_len,
            self.dead_bytes,
            self.pending_ranges
        )
    }
}
