//! Field path resolution.
//!
//! A field path is a sequence of segments joined by a separator (`.` by
//! default), e.g. `items.3.price`. Whether a segment addresses a dict key or
//! an array position is decided by the container it is applied to; when a
//! container has to be created, [`looks_like_array_index`] decides from the
//! segment's syntax alone.

use crate::structure::{Node, NodeId, Structure};

/// Whether a path segment should create an array when the container it
/// addresses does not exist yet: non-empty and ASCII digits only.
#[must_use]
pub fn looks_like_array_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Parses a segment as an array position. Signs, whitespace and values
/// that overflow `usize` yield `None`.
#[must_use]
pub fn parse_array_index(segment: &str) -> Option<usize> {
    if !looks_like_array_index(segment) {
        return None;
    }
    segment.parse().ok()
}

/// Splits a path into segments. The empty path has no segments and
/// addresses the root.
#[must_use]
pub fn split_path(path: &str, separator: char) -> Vec<&str> {
    if path.is_empty() {
        return Vec::new();
    }
    path.split(separator).collect()
}

/// Resolves `path` starting at `from`.
///
/// Returns `None` when any link is missing, when a segment is applied to a
/// leaf, or when an array is addressed with a segment that is not a
/// decimal position. Nothing is allocated.
#[must_use]
pub fn resolve(structure: &Structure, from: NodeId, path: &str, separator: char) -> Option<NodeId> {
    resolve_segments(structure, from, &split_path(path, separator))
}

/// Resolves pre-split segments starting at `from`.
#[must_use]
pub fn resolve_segments(structure: &Structure, from: NodeId, segments: &[&str]) -> Option<NodeId> {
    segments
        .iter()
        .try_fold(from, |current, segment| match structure.node(current)? {
            Node::Dict(_) => structure.dict_get(current, segment),
            Node::Array(_) => structure.array_get(current, parse_array_index(segment)?),
            Node::Leaf(_) | Node::Vacant => None,
        })
}
