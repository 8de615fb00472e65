//! The structure index.
//!
//! A document's shape is kept apart from its values: dicts and arrays form
//! a tree whose leaves are [`IndexNode`]s pointing into the value buffer.
//! The tree is stored as an arena so that offset renumbering during a
//! commit is a flat pass over the arena instead of a recursive descent.

mod arena;
mod node;

pub use arena::Structure;
pub use node::{IndexNode, Node, NodeId, NodeKind};
