//! Structure index nodes.

use crate::ranges::DataRange;
use docpack_codec::WireType;
use std::fmt;

/// Position of a node in a [`Structure`](super::Structure) arena.
///
/// Ids are only meaningful for the structure that issued them and are
/// renumbered when a commit drops vacant slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// A leaf of the structure index: where a scalar's bytes live in the
/// value buffer.
///
/// Serialized as `[type_tag, offset, size]`, or `[type_tag, offset, size,
/// version]` when a version is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexNode {
    /// Wire type of the scalar.
    pub wire_type: WireType,
    /// First byte of the value in the buffer.
    pub offset: usize,
    /// Number of bytes of the encoded value.
    pub size: usize,
    /// Optional version slot. Updates never touch it.
    pub version: Option<u64>,
}

impl IndexNode {
    /// Creates an unversioned index node.
    #[must_use]
    pub const fn new(wire_type: WireType, offset: usize, size: usize) -> Self {
        Self {
            wire_type,
            offset,
            size,
            version: None,
        }
    }

    /// Sets the version slot.
    #[must_use]
    pub const fn with_version(mut self, version: u64) -> Self {
        self.version = Some(version);
        self
    }

    /// The inclusive byte range this node points at.
    #[must_use]
    pub fn range(&self) -> Option<DataRange> {
        DataRange::from_span(self.offset, self.size)
    }

    /// One past the last byte of the value.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// An arena slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Object: keys in insertion order.
    Dict(Vec<(String, NodeId)>),
    /// Array: children by position.
    Array(Vec<NodeId>),
    /// Scalar stored in the value buffer.
    Leaf(IndexNode),
    /// Detached slot waiting for the next commit.
    Vacant,
}

impl Node {
    /// The kind of a live node; `None` for vacant slots.
    #[must_use]
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            Node::Dict(_) => Some(NodeKind::Dict),
            Node::Array(_) => Some(NodeKind::Array),
            Node::Leaf(leaf) => Some(NodeKind::Leaf(leaf.wire_type)),
            Node::Vacant => None,
        }
    }
}

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A nested object.
    Dict,
    /// A nested array.
    Array,
    /// A scalar of the given wire type.
    Leaf(WireType),
}

impl NodeKind {
    /// Whether the node holds children.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, NodeKind::Dict | NodeKind::Array)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Dict => f.write_str("dict"),
            NodeKind::Array => f.write_str("array"),
            NodeKind::Leaf(wire_type) => write!(f, "{wire_type}"),
        }
    }
}
