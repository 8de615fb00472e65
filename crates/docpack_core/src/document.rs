//! Documents: a structure index over a packed value buffer.
//!
//! ## Lifecycle
//!
//! A document is created empty or built from a fully materialized
//! [`Value`], mutated by [`Document::update`], and finalized by
//! [`Document::commit`] (reclaim superseded bytes) or
//! [`Document::rollback`] (forget them) before it is serialized.
//!
//! ## Invariants
//!
//! - Every live leaf points inside the buffer
//! - A leaf always points at the most recent bytes of its field
//! - Superseded bytes are reachable only through the pending dead ranges
//! - The pending dead ranges are empty right after a commit

use crate::compaction::{CompactionResult, Compactor};
use crate::config::DocumentConfig;
use crate::error::{CoreError, CoreResult};
use crate::path;
use crate::ranges::{DataRange, DataRanges};
use crate::stats::DocumentStats;
use crate::structure::{IndexNode, Node, NodeId, NodeKind, Structure};
use crate::update::{self, UpdateReport};
use crate::wire;
use docpack_codec::{from_msgpack, to_msgpack, Value};
use std::collections::HashMap;
use tracing::warn;

/// A semi-structured document stored as a structure index plus a value
/// buffer.
///
/// A document is single-writer: every mutation takes `&mut self`, and no
/// state is shared with other documents.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) structure: Structure,
    pub(crate) buffer: Vec<u8>,
    pub(crate) dead: DataRanges,
    pub(crate) config: DocumentConfig,
}

impl Document {
    /// Creates an empty document (empty root dict, empty buffer).
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DocumentConfig::default())
    }

    /// Creates an empty document with the given configuration.
    #[must_use]
    pub fn with_config(config: DocumentConfig) -> Self {
        Self {
            structure: Structure::new_dict(),
            buffer: Vec::new(),
            dead: DataRanges::new(),
            config,
        }
    }

    /// Builds a document from a materialized value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `input` is not a map or an
    /// array, or nests deeper than the configured limit.
    pub fn make_document(input: &Value) -> CoreResult<Self> {
        Self::make_document_with_config(input, DocumentConfig::default())
    }

    /// Builds a document from a materialized value with the given
    /// configuration.
    ///
    /// # Errors
    ///
    /// See [`Document::make_document`].
    pub fn make_document_with_config(input: &Value, config: DocumentConfig) -> CoreResult<Self> {
        let structure = match input {
            Value::Map(_) => Structure::new_dict(),
            Value::Array(_) => Structure::new_array(),
            other => {
                return Err(CoreError::invalid_input(format!(
                    "document root must be a map or an array, got {}",
                    other.wire_type().map_or("container", |t| t.name())
                )))
            }
        };
        let mut doc = Self {
            structure,
            buffer: Vec::new(),
            dead: DataRanges::new(),
            config,
        };
        let root = doc.structure.root();
        match input {
            Value::Map(pairs) => {
                for (key, value) in last_value_per_key(pairs) {
                    let child = doc.insert_value(value, 1)?;
                    doc.structure.dict_insert(root, key, child);
                }
            }
            Value::Array(items) => {
                for value in items {
                    let child = doc.insert_value(value, 1)?;
                    doc.structure.array_push(root, child);
                }
            }
            _ => {}
        }
        Ok(doc)
    }

    /// Reconstructs a document from bytes produced by
    /// [`Document::serialize`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidFormat`] if the bytes do not describe a
    /// consistent document.
    pub fn deserialize(bytes: &[u8]) -> CoreResult<Self> {
        wire::deserialize_document_with_config(bytes, DocumentConfig::default())
    }

    /// Encodes the document as `[buffer_bytes, structure_tree]`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] while dead ranges are
    /// pending; commit or roll back first.
    pub fn serialize(&self) -> CoreResult<Vec<u8>> {
        wire::serialize_document(self)
    }

    /// Applies an update document; returns whether any field changed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidUpdate`] if `spec` is not a map of
    /// operator blocks, and [`CoreError::Corruption`] if a value the update
    /// has to read is unreadable.
    pub fn update(&mut self, spec: &Value) -> CoreResult<bool> {
        self.update_with_report(spec).map(|report| report.changed)
    }

    /// Applies an update document and reports the outcome of every
    /// processed field.
    ///
    /// # Errors
    ///
    /// See [`Document::update`].
    pub fn update_with_report(&mut self, spec: &Value) -> CoreResult<UpdateReport> {
        update::apply_update(self, spec)
    }

    /// Physically reclaims every pending dead range.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corruption`] if a dead range lies outside the
    /// buffer or overlaps a live value. The document must then be
    /// discarded.
    pub fn commit(&mut self) -> CoreResult<CompactionResult> {
        Compactor::new(self).commit()
    }

    /// Forgets the pending dead ranges and returns how many there were.
    ///
    /// Values written by updates since the last commit are **not**
    /// reverted: their new bytes stay in the buffer and the index keeps
    /// pointing at them. Only the bookkeeping needed to reclaim the old
    /// bytes is dropped, so those bytes stay in the buffer unreferenced
    /// until the document is rebuilt.
    pub fn rollback(&mut self) -> usize {
        Compactor::new(self).rollback()
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// The packed value buffer.
    #[must_use]
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The structure index.
    #[must_use]
    pub fn structure(&self) -> &Structure {
        &self.structure
    }

    /// Dead ranges waiting for a commit.
    #[must_use]
    pub fn pending_ranges(&self) -> &DataRanges {
        &self.dead
    }

    /// Whether updates left bytes to reclaim.
    #[must_use]
    pub fn has_pending_changes(&self) -> bool {
        !self.dead.is_empty()
    }

    /// Resolves a path to its node id.
    #[must_use]
    pub fn resolve(&self, field: &str) -> Option<NodeId> {
        path::resolve(
            &self.structure,
            self.structure.root(),
            field,
            self.config.path_separator,
        )
    }

    /// The index node at `field`, if it is a leaf.
    #[must_use]
    pub fn index_node(&self, field: &str) -> Option<&IndexNode> {
        self.structure.leaf(self.resolve(field)?)
    }

    /// Whether `field` exists.
    #[must_use]
    pub fn exists(&self, field: &str) -> bool {
        self.resolve(field).is_some()
    }

    /// What `field` holds.
    #[must_use]
    pub fn type_of(&self, field: &str) -> Option<NodeKind> {
        self.structure.kind(self.resolve(field)?)
    }

    /// Number of children of the container at `field`; `None` for leaves
    /// and missing fields. The empty path addresses the root.
    #[must_use]
    pub fn count(&self, field: &str) -> Option<usize> {
        self.structure.child_count(self.resolve(field)?)
    }

    /// Reads the value at `field`, materializing containers.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corruption`] if an index node points outside
    /// the buffer or at bytes that do not decode.
    pub fn get_value(&self, field: &str) -> CoreResult<Option<Value>> {
        match self.resolve(field) {
            Some(id) => self.materialize(id).map(Some),
            None => Ok(None),
        }
    }

    /// Materializes the whole document.
    ///
    /// # Errors
    ///
    /// See [`Document::get_value`].
    pub fn to_value(&self) -> CoreResult<Value> {
        self.materialize(self.structure.root())
    }

    /// Size and liveness figures.
    #[must_use]
    pub fn stats(&self) -> DocumentStats {
        let (dict_count, array_count, leaf_count) = self.structure.census();
        let live_bytes = self.structure.live_leaves().iter().map(|l| l.size).sum();
        DocumentStats {
            buffer_len: self.buffer.len(),
            live_bytes,
            dead_bytes: self.dead.total_bytes(),
            leaf_count,
            dict_count,
            array_count,
            pending_ranges: self.dead.len(),
        }
    }

    /// Checks the buffer/index invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Corruption`] if a live leaf points outside the
    /// buffer, two live leaves share bytes, or a dead range lies outside
    /// the buffer or overlaps a live leaf or another dead range.
    pub fn verify(&self) -> CoreResult<()> {
        let mut spans: Vec<DataRange> = Vec::new();
        for leaf in self.structure.live_leaves() {
            let range = self.checked_range(&leaf)?;
            spans.push(range);
        }
        spans.sort_by_key(|r| r.start);
        if let Some(pair) = spans.windows(2).find(|w| w[0].overlaps(&w[1])) {
            warn!(first = %pair[0], second = %pair[1], "live values share bytes");
            return Err(CoreError::corruption(format!(
                "live values {} and {} share bytes",
                pair[0], pair[1]
            )));
        }

        let mut dead = self.dead.clone();
        dead.sort();
        crate::compaction::check_dead_ranges(dead.ranges(), &spans, self.buffer.len())
    }

    /// Bytes of a leaf, bounds-checked.
    pub(crate) fn leaf_bytes(&self, leaf: &IndexNode) -> CoreResult<&[u8]> {
        self.checked_range(leaf)?;
        Ok(&self.buffer[leaf.offset..leaf.end()])
    }

    /// Decodes the scalar a leaf points at.
    pub(crate) fn read_leaf(&self, leaf: &IndexNode) -> CoreResult<Value> {
        let bytes = self.leaf_bytes(leaf)?;
        from_msgpack(bytes).map_err(|e| {
            warn!(offset = leaf.offset, size = leaf.size, error = %e, "undecodable value");
            CoreError::corruption(format!(
                "value at offset {} ({} bytes) does not decode: {e}",
                leaf.offset, leaf.size
            ))
        })
    }

    fn checked_range(&self, leaf: &IndexNode) -> CoreResult<DataRange> {
        match leaf.range() {
            Some(range) if range.end < self.buffer.len() => Ok(range),
            _ => {
                warn!(
                    offset = leaf.offset,
                    size = leaf.size,
                    buffer_len = self.buffer.len(),
                    "index node outside buffer"
                );
                Err(CoreError::corruption(format!(
                    "index node [{}, {}) outside buffer of {} bytes",
                    leaf.offset,
                    leaf.end(),
                    self.buffer.len()
                )))
            }
        }
    }

    /// Materializes the subtree at `id`.
    pub(crate) fn materialize(&self, id: NodeId) -> CoreResult<Value> {
        match self.structure.node(id) {
            Some(Node::Leaf(leaf)) => self.read_leaf(leaf),
            Some(Node::Dict(entries)) => entries
                .iter()
                .map(|(key, child)| Ok((key.clone(), self.materialize(*child)?)))
                .collect::<CoreResult<Vec<_>>>()
                .map(Value::Map),
            Some(Node::Array(items)) => items
                .iter()
                .map(|child| self.materialize(*child))
                .collect::<CoreResult<Vec<_>>>()
                .map(Value::Array),
            Some(Node::Vacant) | None => Err(CoreError::corruption(format!(
                "{id} is not a live node"
            ))),
        }
    }

    /// Appends a scalar's encoding to the buffer and returns its index node.
    pub(crate) fn append_scalar(&mut self, value: &Value) -> CoreResult<IndexNode> {
        let wire_type = value
            .wire_type()
            .ok_or_else(|| CoreError::invalid_input("containers are not scalars"))?;
        let bytes = to_msgpack(value)?;
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(&bytes);
        Ok(IndexNode::new(wire_type, offset, bytes.len()))
    }

    /// Builds a detached subtree for `value`, appending every scalar to the
    /// buffer in document order.
    pub(crate) fn insert_value(&mut self, value: &Value, depth: usize) -> CoreResult<NodeId> {
        if depth > self.config.max_depth {
            return Err(CoreError::invalid_input(format!(
                "document nests deeper than {} levels",
                self.config.max_depth
            )));
        }
        match value {
            Value::Map(pairs) => {
                let id = self.structure.push(Node::Dict(Vec::new()));
                let pairs = last_value_per_key(pairs);
                let mut entries: Vec<(String, NodeId)> = Vec::with_capacity(pairs.len());
                for (key, child) in pairs {
                    let child_id = self.insert_value(child, depth + 1)?;
                    entries.push((key.to_string(), child_id));
                }
                self.structure.set_dict_entries(id, entries);
                Ok(id)
            }
            Value::Array(items) => {
                let id = self.structure.push(Node::Array(Vec::new()));
                let children = items
                    .iter()
                    .map(|item| self.insert_value(item, depth + 1))
                    .collect::<CoreResult<Vec<_>>>()?;
                self.structure.set_array_items(id, children);
                Ok(id)
            }
            scalar => {
                let leaf = self.append_scalar(scalar)?;
                Ok(self.structure.push(Node::Leaf(leaf)))
            }
        }
    }

    /// Records the bytes of superseded leaves as dead.
    pub(crate) fn mark_dead(&mut self, leaves: &[IndexNode]) {
        for range in leaves.iter().filter_map(IndexNode::range) {
            self.dead.add_range(range);
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Structure, buffer and pending ranges are compared; configuration is not.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.structure == other.structure
            && self.buffer == other.buffer
            && self.dead == other.dead
    }
}

/// Collapses repeated keys before any bytes are written: first position,
/// last value.
fn last_value_per_key(pairs: &[(String, Value)]) -> Vec<(&str, &Value)> {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(pairs.len());
    let mut out: Vec<(&str, &Value)> = Vec::with_capacity(pairs.len());
    for (key, value) in pairs {
        match positions.get(key.as_str()) {
            Some(&at) => out[at].1 = value,
            None => {
                positions.insert(key.as_str(), out.len());
                out.push((key.as_str(), value));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpack_codec::WireType;

    fn sample() -> Value {
        Value::map([
            ("name", Value::from("Alice")),
            ("age", Value::Unsigned(30)),
            (
                "tags",
                Value::Array(vec![Value::from("a"), Value::from("b")]),
            ),
            ("address", Value::map([("city", Value::from("Oslo"))])),
        ])
    }

    #[test]
    fn new_document_is_empty() {
        let doc = Document::new();
        assert!(doc.buffer().is_empty());
        assert_eq!(doc.count(""), Some(0));
        assert!(!doc.has_pending_changes());
        assert_eq!(doc.to_value().unwrap(), Value::empty_map());
    }

    #[test]
    fn make_document_packs_scalars_in_order() {
        let doc = Document::make_document(&sample()).unwrap();

        let name = doc.index_node("name").unwrap();
        assert_eq!(name.wire_type, WireType::Text);
        assert_eq!(name.offset, 0);
        assert_eq!(name.size, 6);

        let age = doc.index_node("age").unwrap();
        assert_eq!(age.offset, 6);
        assert_eq!(age.size, 1);

        assert_eq!(doc.buffer().len(), doc.stats().live_bytes);
        assert_eq!(doc.to_value().unwrap(), sample());
    }

    #[test]
    fn reads_by_path() {
        let doc = Document::make_document(&sample()).unwrap();
        assert_eq!(doc.get_value("tags.1").unwrap(), Some(Value::from("b")));
        assert_eq!(
            doc.get_value("address").unwrap(),
            Some(Value::map([("city", Value::from("Oslo"))]))
        );
        assert_eq!(doc.get_value("address.zip").unwrap(), None);
        assert_eq!(doc.type_of("tags"), Some(NodeKind::Array));
        assert_eq!(doc.type_of("age"), Some(NodeKind::Leaf(WireType::Unsigned)));
        assert_eq!(doc.count("tags"), Some(2));
        assert_eq!(doc.count("age"), None);
        assert!(doc.exists("address.city"));
        assert!(!doc.exists("address.city.x"));
    }

    #[test]
    fn array_root() {
        let doc = Document::make_document(&Value::Array(vec![
            Value::Integer(-1),
            Value::map([("k", Value::Null)]),
        ]))
        .unwrap();
        assert_eq!(doc.type_of(""), Some(NodeKind::Array));
        assert_eq!(doc.get_value("0").unwrap(), Some(Value::Integer(-1)));
        assert_eq!(doc.get_value("1.k").unwrap(), Some(Value::Null));
    }

    #[test]
    fn scalar_root_rejected() {
        assert!(matches!(
            Document::make_document(&Value::Unsigned(1)),
            Err(CoreError::InvalidInput { .. })
        ));
    }

    #[test]
    fn depth_limit() {
        let mut value = Value::Unsigned(1);
        for _ in 0..5 {
            value = Value::map([("n", value)]);
        }
        let config = DocumentConfig::new().max_depth(3);
        assert!(matches!(
            Document::make_document_with_config(&value, config),
            Err(CoreError::InvalidInput { .. })
        ));
        assert!(Document::make_document(&value).is_ok());
    }

    #[test]
    fn verify_detects_out_of_bounds_leaf() {
        let mut doc = Document::make_document(&sample()).unwrap();
        let id = doc.resolve("age").unwrap();
        doc.structure.leaf_mut(id).unwrap().offset = 10_000;

        let err = doc.verify().unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            doc.get_value("age"),
            Err(CoreError::Corruption { .. })
        ));
    }

    #[test]
    fn verify_detects_dead_range_over_live_value() {
        let mut doc = Document::make_document(&sample()).unwrap();
        doc.dead.add_range(DataRange::new(0, 2));
        assert!(matches!(doc.verify(), Err(CoreError::Corruption { .. })));
    }

    #[test]
    fn verify_accepts_consistent_document() {
        let doc = Document::make_document(&sample()).unwrap();
        doc.verify().unwrap();
    }

    #[test]
    fn duplicate_keys_keep_first_position_and_last_value() {
        let input = Value::Map(vec![
            ("a".into(), Value::from("first-value")),
            (
                "b".into(),
                Value::Map(vec![
                    ("k".into(), Value::from("aaaaaaaa")),
                    ("k".into(), Value::Unsigned(2)),
                ]),
            ),
            ("a".into(), Value::Unsigned(2)),
        ]);
        let mut doc = Document::make_document(&input).unwrap();

        assert_eq!(doc.stats().leaf_count, 2);
        assert_eq!(doc.buffer().len(), doc.stats().live_bytes);
        assert_eq!(doc.get_value("a").unwrap(), Some(Value::Unsigned(2)));
        assert_eq!(doc.get_value("b.k").unwrap(), Some(Value::Unsigned(2)));
        let keys: Vec<String> = doc
            .to_value()
            .unwrap()
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect();
        assert_eq!(keys, ["a", "b"]);

        assert!(doc.commit().unwrap().is_noop());
        assert_eq!(doc.buffer().len(), doc.stats().live_bytes);
    }
}
