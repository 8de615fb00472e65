//! Serialized document format.
//!
//! A document is written as a MessagePack 2-array:
//!
//! ```text
//! [ bin(buffer), structure_tree ]
//! ```
//!
//! In the structure tree dicts are maps, arrays are arrays, and leaves are
//! integer arrays `[type_tag, offset, size]` or `[type_tag, offset, size,
//! version]`. An array whose first element is an integer is therefore a
//! leaf; a container array's elements are always maps or arrays.
//!
//! The buffer is written verbatim, so a round trip is byte-for-byte exact.

use crate::config::DocumentConfig;
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::ranges::DataRanges;
use crate::structure::{IndexNode, Node, NodeId, Structure};
use docpack_codec::{from_msgpack_with_max_depth, to_msgpack, Value, WireType};
use tracing::debug;

/// Serializes a committed document.
///
/// # Errors
///
/// Returns [`CoreError::InvalidOperation`] if dead ranges are pending.
pub fn serialize_document(doc: &Document) -> CoreResult<Vec<u8>> {
    if !doc.dead.is_empty() {
        return Err(CoreError::invalid_operation(format!(
            "{} dead ranges pending; commit or roll back before serializing",
            doc.dead.len()
        )));
    }
    let tree = encode_node(&doc.structure, doc.structure.root())?;
    let bytes = to_msgpack(&Value::Array(vec![Value::Bytes(doc.buffer.clone()), tree]))?;
    debug!(
        buffer_len = doc.buffer.len(),
        encoded_len = bytes.len(),
        "serialized document"
    );
    Ok(bytes)
}

/// Deserializes a document with the default configuration.
///
/// # Errors
///
/// See [`deserialize_document_with_config`].
pub fn deserialize_document(bytes: &[u8]) -> CoreResult<Document> {
    deserialize_document_with_config(bytes, DocumentConfig::default())
}

/// Deserializes a document.
///
/// # Errors
///
/// Returns [`CoreError::InvalidFormat`] if the bytes are not a
/// `[bin, tree]` pair, the root is not a container, the tree nests deeper
/// than `config.max_depth`, a leaf is malformed, or a leaf points outside
/// the buffer or at bytes another leaf already uses.
pub fn deserialize_document_with_config(
    bytes: &[u8],
    config: DocumentConfig,
) -> CoreResult<Document> {
    // The outer pair and each leaf's array sit around the structure levels.
    let decoded = from_msgpack_with_max_depth(bytes, config.max_depth.saturating_add(2))
        .map_err(|e| CoreError::invalid_format(format!("not a MessagePack value: {e}")))?;
    let Value::Array(mut parts) = decoded else {
        return Err(CoreError::invalid_format("expected a [buffer, structure] array"));
    };
    if parts.len() != 2 {
        return Err(CoreError::invalid_format(format!(
            "expected 2 top-level elements, found {}",
            parts.len()
        )));
    }
    let tree = parts.pop().unwrap_or(Value::Null);
    let Some(Value::Bytes(buffer)) = parts.pop() else {
        return Err(CoreError::invalid_format("first element must be binary"));
    };

    let mut structure = match &tree {
        Value::Map(_) => Structure::new_dict(),
        Value::Array(items) if !is_leaf(items) => Structure::new_array(),
        _ => return Err(CoreError::invalid_format("root must be a dict or an array")),
    };
    let mut builder = TreeBuilder {
        structure: &mut structure,
        buffer_len: buffer.len(),
        max_depth: config.max_depth,
    };
    let root = builder.structure.root();
    builder.fill(root, &tree, 1)?;

    let doc = Document {
        structure,
        buffer,
        dead: DataRanges::new(),
        config,
    };
    doc.verify().map_err(|e| match e {
        CoreError::Corruption { message } => CoreError::invalid_format(message),
        other => other,
    })?;
    debug!(buffer_len = doc.buffer.len(), "deserialized document");
    Ok(doc)
}

fn encode_node(structure: &Structure, id: NodeId) -> CoreResult<Value> {
    match structure.node(id) {
        Some(Node::Dict(entries)) => entries
            .iter()
            .map(|(key, child)| Ok((key.clone(), encode_node(structure, *child)?)))
            .collect::<CoreResult<Vec<_>>>()
            .map(Value::Map),
        Some(Node::Array(items)) => items
            .iter()
            .map(|child| encode_node(structure, *child))
            .collect::<CoreResult<Vec<_>>>()
            .map(Value::Array),
        Some(Node::Leaf(leaf)) => Ok(encode_leaf(leaf)),
        Some(Node::Vacant) | None => Err(CoreError::corruption(format!(
            "{id} is attached but not live"
        ))),
    }
}

fn encode_leaf(leaf: &IndexNode) -> Value {
    let mut fields = vec![
        Value::Unsigned(u64::from(leaf.wire_type.tag())),
        Value::Unsigned(leaf.offset as u64),
        Value::Unsigned(leaf.size as u64),
    ];
    if let Some(version) = leaf.version {
        fields.push(Value::Unsigned(version));
    }
    Value::Array(fields)
}

fn is_leaf(items: &[Value]) -> bool {
    matches!(items.first(), Some(Value::Unsigned(_) | Value::Integer(_)))
}

struct TreeBuilder<'s> {
    structure: &'s mut Structure,
    buffer_len: usize,
    max_depth: usize,
}

impl TreeBuilder<'_> {
    /// Populates the already allocated container `id` from `value`.
    fn fill(&mut self, id: NodeId, value: &Value, depth: usize) -> CoreResult<()> {
        if depth > self.max_depth {
            return Err(CoreError::invalid_format(format!(
                "structure nests deeper than {} levels",
                self.max_depth
            )));
        }
        match value {
            Value::Map(pairs) => {
                let mut entries: Vec<(String, NodeId)> = Vec::with_capacity(pairs.len());
                for (key, child) in pairs {
                    if entries.iter().any(|(k, _)| k == key) {
                        return Err(CoreError::invalid_format(format!(
                            "duplicate key {key:?} in structure"
                        )));
                    }
                    let child_id = self.node(child, depth + 1)?;
                    entries.push((key.clone(), child_id));
                }
                self.structure.set_dict_entries(id, entries);
            }
            Value::Array(items) => {
                let children = items
                    .iter()
                    .map(|child| self.node(child, depth + 1))
                    .collect::<CoreResult<Vec<_>>>()?;
                self.structure.set_array_items(id, children);
            }
            _ => return Err(CoreError::invalid_format("expected a container")),
        }
        Ok(())
    }

    fn node(&mut self, value: &Value, depth: usize) -> CoreResult<NodeId> {
        match value {
            Value::Array(items) if is_leaf(items) => {
                let leaf = self.leaf(items)?;
                Ok(self.structure.push(Node::Leaf(leaf)))
            }
            Value::Map(_) => {
                let id = self.structure.push(Node::Dict(Vec::new()));
                self.fill(id, value, depth)?;
                Ok(id)
            }
            Value::Array(_) => {
                let id = self.structure.push(Node::Array(Vec::new()));
                self.fill(id, value, depth)?;
                Ok(id)
            }
            other => Err(CoreError::invalid_format(format!(
                "unexpected {} in structure",
                other.wire_type().map_or("value", WireType::name)
            ))),
        }
    }

    fn leaf(&self, items: &[Value]) -> CoreResult<IndexNode> {
        if !(3..=4).contains(&items.len()) {
            return Err(CoreError::invalid_format(format!(
                "leaf must have 3 or 4 elements, found {}",
                items.len()
            )));
        }
        let field = |i: usize, name: &str| {
            items[i]
                .as_unsigned()
                .ok_or_else(|| CoreError::invalid_format(format!("leaf {name} must be unsigned")))
        };
        let tag = field(0, "type tag")?;
        let wire_type = WireType::from_tag(tag)
            .ok_or_else(|| CoreError::invalid_format(format!("unknown type tag {tag}")))?;
        let offset = usize::try_from(field(1, "offset")?)
            .map_err(|_| CoreError::invalid_format("leaf offset overflows"))?;
        let size = usize::try_from(field(2, "size")?)
            .map_err(|_| CoreError::invalid_format("leaf size overflows"))?;
        if size == 0 || offset.checked_add(size).map_or(true, |end| end > self.buffer_len) {
            return Err(CoreError::invalid_format(format!(
                "leaf [{offset}, +{size}) outside buffer of {} bytes",
                self.buffer_len
            )));
        }
        let mut leaf = IndexNode::new(wire_type, offset, size);
        if items.len() == 4 {
            leaf = leaf.with_version(field(3, "version")?);
        }
        Ok(leaf)
    }
}
