//! Arena-backed structure tree.

use super::node::{IndexNode, Node, NodeId, NodeKind};

/// The dict/array skeleton of a document.
///
/// Nodes live in a flat arena and refer to their children by [`NodeId`].
/// The tree is acyclic by construction: a node is only ever attached to the
/// parent that created it, or moved into the slot of the node it replaces.
/// Detached subtrees stay in the arena as [`Node::Vacant`] until
/// [`Structure::compact_arena`] drops them.
#[derive(Debug, Clone)]
pub struct Structure {
    nodes: Vec<Node>,
    root: NodeId,
    vacant: usize,
}

impl Structure {
    /// Creates a structure whose root is an empty dict.
    #[must_use]
    pub fn new_dict() -> Self {
        Self {
            nodes: vec![Node::Dict(Vec::new())],
            root: NodeId(0),
            vacant: 0,
        }
    }

    /// Creates a structure whose root is an empty array.
    #[must_use]
    pub fn new_array() -> Self {
        Self {
            nodes: vec![Node::Array(Vec::new())],
            root: NodeId(0),
            vacant: 0,
        }
    }

    /// The root container.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns a node, or `None` for an id this arena never issued.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// The kind of a live node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).and_then(Node::kind)
    }

    /// The index node of a leaf.
    #[must_use]
    pub fn leaf(&self, id: NodeId) -> Option<&IndexNode> {
        match self.node(id) {
            Some(Node::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    /// Mutable access to the index node of a leaf.
    pub fn leaf_mut(&mut self, id: NodeId) -> Option<&mut IndexNode> {
        match self.nodes.get_mut(id.0) {
            Some(Node::Leaf(leaf)) => Some(leaf),
            _ => None,
        }
    }

    /// Adds a detached node and returns its id.
    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Looks up a key of a dict node.
    #[must_use]
    pub fn dict_get(&self, dict: NodeId, key: &str) -> Option<NodeId> {
        match self.node(dict)? {
            Node::Dict(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, id)| *id),
            _ => None,
        }
    }

    /// Looks up a position of an array node.
    #[must_use]
    pub fn array_get(&self, array: NodeId, index: usize) -> Option<NodeId> {
        match self.node(array)? {
            Node::Array(items) => items.get(index).copied(),
            _ => None,
        }
    }

    /// Number of children of a container; `None` for leaves.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> Option<usize> {
        match self.node(id)? {
            Node::Dict(entries) => Some(entries.len()),
            Node::Array(items) => Some(items.len()),
            Node::Leaf(_) | Node::Vacant => None,
        }
    }

    /// Children of a container in order; empty for leaves.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match self.node(id) {
            Some(Node::Dict(entries)) => entries.iter().map(|(_, child)| *child).collect(),
            Some(Node::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Attaches `child` under `key`. Returns `false` if `dict` is not a dict.
    pub(crate) fn dict_insert(&mut self, dict: NodeId, key: &str, child: NodeId) -> bool {
        match self.nodes.get_mut(dict.0) {
            Some(Node::Dict(entries)) => {
                match entries.iter_mut().find(|(k, _)| k == key) {
                    Some((_, slot)) => *slot = child,
                    None => entries.push((key.to_string(), child)),
                }
                true
            }
            _ => false,
        }
    }

    /// Appends `child`. Returns `false` if `array` is not an array.
    pub(crate) fn array_push(&mut self, array: NodeId, child: NodeId) -> bool {
        match self.nodes.get_mut(array.0) {
            Some(Node::Array(items)) => {
                items.push(child);
                true
            }
            _ => false,
        }
    }

    /// Replaces the children list of a freshly pushed container.
    pub(crate) fn set_dict_entries(&mut self, dict: NodeId, entries: Vec<(String, NodeId)>) {
        if let Some(slot) = self.nodes.get_mut(dict.0) {
            *slot = Node::Dict(entries);
        }
    }

    /// Replaces the children list of a freshly pushed array.
    pub(crate) fn set_array_items(&mut self, array: NodeId, items: Vec<NodeId>) {
        if let Some(slot) = self.nodes.get_mut(array.0) {
            *slot = Node::Array(items);
        }
    }

    /// Detaches the child addressed by `key` (a dict key, or a decimal
    /// position for arrays) and returns it. Later array elements shift
    /// down by one.
    pub(crate) fn remove_child(&mut self, parent: NodeId, key: &str) -> Option<NodeId> {
        match self.nodes.get_mut(parent.0)? {
            Node::Dict(entries) => {
                let pos = entries.iter().position(|(k, _)| k == key)?;
                Some(entries.remove(pos).1)
            }
            Node::Array(items) => {
                let index = crate::path::parse_array_index(key)?;
                (index < items.len()).then(|| items.remove(index))
            }
            Node::Leaf(_) | Node::Vacant => None,
        }
    }

    /// Moves the node at `replacement` into the slot of `target`, so every
    /// parent pointing at `target` now sees the new subtree. The old
    /// subtree's leaves are returned; both the old descendants and the
    /// `replacement` slot become vacant.
    pub(crate) fn replace_in_place(&mut self, target: NodeId, replacement: NodeId) -> Vec<IndexNode> {
        let mut dropped = Vec::new();
        for child in self.children(target) {
            self.vacate(child, &mut dropped);
        }
        if let Some(Node::Leaf(leaf)) = self.node(target) {
            dropped.push(*leaf);
        }
        let moved = std::mem::replace(&mut self.nodes[replacement.0], Node::Vacant);
        self.vacant += 1;
        self.nodes[target.0] = moved;
        dropped
    }

    /// Marks a detached subtree vacant, collecting its leaves.
    pub(crate) fn vacate(&mut self, id: NodeId, dropped: &mut Vec<IndexNode>) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(slot) = self.nodes.get_mut(current.0) else {
                continue;
            };
            match std::mem::replace(slot, Node::Vacant) {
                Node::Dict(entries) => stack.extend(entries.into_iter().map(|(_, c)| c)),
                Node::Array(items) => stack.extend(items),
                Node::Leaf(leaf) => dropped.push(leaf),
                Node::Vacant => continue,
            }
            self.vacant += 1;
        }
    }

    /// Every leaf slot of the arena, reachable or not.
    ///
    /// Vacant slots are skipped, so after a commit this is exactly the set
    /// of live leaves.
    pub(crate) fn leaves_mut(&mut self) -> impl Iterator<Item = &mut IndexNode> {
        self.nodes.iter_mut().filter_map(|node| match node {
            Node::Leaf(leaf) => Some(leaf),
            _ => None,
        })
    }

    /// Leaves reachable from the root, in document order.
    #[must_use]
    pub fn live_leaves(&self) -> Vec<IndexNode> {
        let mut leaves = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match self.node(id) {
                Some(Node::Leaf(leaf)) => leaves.push(*leaf),
                Some(Node::Dict(entries)) => stack.extend(entries.iter().rev().map(|(_, c)| *c)),
                Some(Node::Array(items)) => stack.extend(items.iter().rev()),
                _ => {}
            }
        }
        leaves
    }

    /// Counts reachable `(dicts, arrays, leaves)`.
    #[must_use]
    pub fn census(&self) -> (usize, usize, usize) {
        let (mut dicts, mut arrays, mut leaves) = (0, 0, 0);
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            match self.node(id) {
                Some(Node::Dict(entries)) => {
                    dicts += 1;
                    stack.extend(entries.iter().map(|(_, c)| *c));
                }
                Some(Node::Array(items)) => {
                    arrays += 1;
                    stack.extend(items.iter().copied());
                }
                Some(Node::Leaf(_)) => leaves += 1,
                _ => {}
            }
        }
        (dicts, arrays, leaves)
    }

    /// Number of arena slots, live and vacant.
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Number of vacant slots.
    #[must_use]
    pub fn vacant_count(&self) -> usize {
        self.vacant
    }

    /// Rebuilds the arena with only the nodes reachable from the root,
    /// in depth-first order. Node ids change.
    pub fn compact_arena(&mut self) {
        let mut nodes = Vec::with_capacity(self.nodes.len() - self.vacant);
        let root = self.copy_subtree(self.root, &mut nodes);
        self.nodes = nodes;
        self.root = root;
        self.vacant = 0;
    }

    fn copy_subtree(&self, id: NodeId, out: &mut Vec<Node>) -> NodeId {
        let new_id = NodeId(out.len());
        out.push(Node::Vacant);
        let node = match &self.nodes[id.0] {
            Node::Dict(entries) => Node::Dict(
                entries
                    .iter()
                    .map(|(key, child)| (key.clone(), self.copy_subtree(*child, out)))
                    .collect(),
            ),
            Node::Array(items) => Node::Array(
                items
                    .iter()
                    .map(|child| self.copy_subtree(*child, out))
                    .collect(),
            ),
            other => other.clone(),
        };
        out[new_id.0] = node;
        new_id
    }

    /// Compares the subtrees at `a` (in `self`) and `b` (in `other`)
    /// ignoring arena layout.
    fn same_subtree(&self, a: NodeId, other: &Structure, b: NodeId) -> bool {
        match (self.node(a), other.node(b)) {
            (Some(Node::Leaf(x)), Some(Node::Leaf(y))) => x == y,
            (Some(Node::Dict(xs)), Some(Node::Dict(ys))) => {
                xs.len() == ys.len()
                    && xs.iter().zip(ys).all(|((kx, cx), (ky, cy))| {
                        kx == ky && self.same_subtree(*cx, other, *cy)
                    })
            }
            (Some(Node::Array(xs)), Some(Node::Array(ys))) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .zip(ys)
                        .all(|(cx, cy)| self.same_subtree(*cx, other, *cy))
            }
            _ => false,
        }
    }
}

impl Default for Structure {
    fn default() -> Self {
        Self::new_dict()
    }
}

/// Structural equality: same shape, same keys in the same order, same
/// index nodes. Arena layout and vacant slots are ignored.
impl PartialEq for Structure {
    fn eq(&self, other: &Self) -> bool {
        self.same_subtree(self.root, other, other.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpack_codec::WireType;

    fn leaf(offset: usize, size: usize) -> Node {
        Node::Leaf(IndexNode::new(WireType::Unsigned, offset, size))
    }

    #[test]
    fn dict_insert_and_get() {
        let mut s = Structure::new_dict();
        let root = s.root();
        let a = s.push(leaf(0, 1));
        assert!(s.dict_insert(root, "a", a));
        assert_eq!(s.dict_get(root, "a"), Some(a));
        assert_eq!(s.dict_get(root, "b"), None);
        assert_eq!(s.child_count(root), Some(1));
        assert!(!s.dict_insert(a, "x", a));
    }

    #[test]
    fn array_push_and_get() {
        let mut s = Structure::new_array();
        let root = s.root();
        let first = s.push(leaf(0, 1));
        assert!(s.array_push(root, first));
        assert_eq!(s.array_get(root, 0), Some(first));
        assert_eq!(s.array_get(root, 1), None);
        assert_eq!(s.kind(root), Some(NodeKind::Array));
    }

    #[test]
    fn remove_child_shifts_array() {
        let mut s = Structure::new_array();
        let root = s.root();
        let ids: Vec<NodeId> = (0..3).map(|i| s.push(leaf(i, 1))).collect();
        for id in &ids {
            s.array_push(root, *id);
        }
        assert_eq!(s.remove_child(root, "1"), Some(ids[1]));
        assert_eq!(s.array_get(root, 1), Some(ids[2]));
        assert_eq!(s.remove_child(root, "7"), None);
        assert_eq!(s.remove_child(root, "x"), None);
    }

    #[test]
    fn replace_in_place_collects_old_leaves() {
        let mut s = Structure::new_dict();
        let root = s.root();
        let inner = s.push(Node::Dict(vec![]));
        let x = s.push(leaf(0, 2));
        let y = s.push(leaf(2, 3));
        s.dict_insert(inner, "x", x);
        s.dict_insert(inner, "y", y);
        s.dict_insert(root, "inner", inner);

        let replacement = s.push(leaf(5, 1));
        let dropped = s.replace_in_place(inner, replacement);

        assert_eq!(dropped.len(), 2);
        assert_eq!(s.kind(inner), Some(NodeKind::Leaf(WireType::Unsigned)));
        assert_eq!(s.leaf(inner).unwrap().offset, 5);
        assert_eq!(s.vacant_count(), 3);
        assert_eq!(s.live_leaves().len(), 1);
    }

    #[test]
    fn compact_arena_drops_vacant_slots() {
        let mut s = Structure::new_dict();
        let root = s.root();
        let a = s.push(leaf(0, 1));
        let b = s.push(leaf(1, 1));
        s.dict_insert(root, "a", a);
        s.dict_insert(root, "b", b);
        let detached = s.remove_child(root, "a").unwrap();
        let mut dropped = Vec::new();
        s.vacate(detached, &mut dropped);
        let before = s.clone();

        s.compact_arena();

        assert_eq!(s.arena_len(), 2);
        assert_eq!(s.vacant_count(), 0);
        assert_eq!(s, before);
        assert_eq!(s.leaf(s.dict_get(s.root(), "b").unwrap()).unwrap().offset, 1);
    }

    #[test]
    fn equality_ignores_layout() {
        let mut left = Structure::new_dict();
        let l_root = left.root();
        let l_leaf = left.push(leaf(0, 1));
        left.dict_insert(l_root, "k", l_leaf);

        let mut right = Structure::new_dict();
        let _unused = right.push(Node::Vacant);
        let r_root = right.root();
        let r_leaf = right.push(leaf(0, 1));
        right.dict_insert(r_root, "k", r_leaf);

        assert_eq!(left, right);

        let other = right.push(leaf(1, 1));
        right.dict_insert(r_root, "j", other);
        assert_ne!(left, right);
    }

    #[test]
    fn census_counts_reachable_nodes() {
        let mut s = Structure::new_dict();
        let root = s.root();
        let arr = s.push(Node::Array(vec![]));
        let l = s.push(leaf(0, 1));
        s.array_push(arr, l);
        s.dict_insert(root, "arr", arr);
        let _orphan = s.push(leaf(1, 1));
        assert_eq!(s.census(), (1, 1, 1));
    }
}
