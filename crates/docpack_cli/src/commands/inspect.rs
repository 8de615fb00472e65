//! Inspect command implementation.

use super::{format_size, load_document};
use docpack_core::{Document, Node, NodeId};
use serde::Serialize;
use std::path::Path;

/// Document inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Document path.
    pub path: String,
    /// Serialized file size in bytes.
    pub file_size: u64,
    /// Value buffer length in bytes.
    pub buffer_len: usize,
    /// Bytes referenced by live leaves.
    pub live_bytes: usize,
    /// Number of leaves.
    pub leaf_count: usize,
    /// Number of dicts.
    pub dict_count: usize,
    /// Number of arrays.
    pub array_count: usize,
    /// Top-level fields.
    pub fields: Vec<FieldSummary>,
    /// Every leaf with its location (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaves: Option<Vec<LeafSummary>>,
}

/// Summary of one top-level field.
#[derive(Debug, Serialize)]
pub struct FieldSummary {
    /// Field name or array position.
    pub name: String,
    /// `dict`, `array` or the scalar's wire type.
    pub kind: String,
    /// Children of a container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<usize>,
}

/// Location of one leaf in the value buffer.
#[derive(Debug, Serialize)]
pub struct LeafSummary {
    /// Full field path.
    pub path: String,
    /// Wire type name.
    pub kind: String,
    /// Buffer offset.
    pub offset: usize,
    /// Encoded size.
    pub size: usize,
}

/// Runs the inspect command.
pub fn run(path: &Path, show_leaves: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let file_size = std::fs::metadata(path)?.len();
    let doc = load_document(path)?;
    let stats = doc.stats();
    let structure = doc.structure();
    let root = structure.root();

    let fields = match structure.node(root) {
        Some(Node::Dict(entries)) => entries
            .iter()
            .map(|(key, id)| summarize(&doc, key.clone(), *id))
            .collect(),
        Some(Node::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, id)| summarize(&doc, i.to_string(), *id))
            .collect(),
        _ => Vec::new(),
    };

    let leaves = show_leaves.then(|| {
        let mut out = Vec::new();
        collect_leaves(&doc, root, String::new(), &mut out);
        out
    });

    let result = InspectResult {
        path: path.display().to_string(),
        file_size,
        buffer_len: stats.buffer_len,
        live_bytes: stats.live_bytes,
        leaf_count: stats.leaf_count,
        dict_count: stats.dict_count,
        array_count: stats.array_count,
        fields,
        leaves,
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn summarize(doc: &Document, name: String, id: NodeId) -> FieldSummary {
    FieldSummary {
        name,
        kind: doc
            .structure()
            .kind(id)
            .map_or_else(|| "vacant".to_string(), |k| k.to_string()),
        children: doc.structure().child_count(id),
    }
}

fn collect_leaves(doc: &Document, id: NodeId, prefix: String, out: &mut Vec<LeafSummary>) {
    let separator = doc.config().path_separator;
    let join = |segment: &str| {
        if prefix.is_empty() {
            segment.to_string()
        } else {
            format!("{prefix}{separator}{segment}")
        }
    };
    match doc.structure().node(id) {
        Some(Node::Leaf(leaf)) => out.push(LeafSummary {
            path: prefix.clone(),
            kind: leaf.wire_type.to_string(),
            offset: leaf.offset,
            size: leaf.size,
        }),
        Some(Node::Dict(entries)) => {
            for (key, child) in entries {
                collect_leaves(doc, *child, join(key), out);
            }
        }
        Some(Node::Array(items)) => {
            for (i, child) in items.iter().enumerate() {
                collect_leaves(doc, *child, join(&i.to_string()), out);
            }
        }
        _ => {}
    }
}

fn print_text_output(result: &InspectResult) {
    println!("DocPack Document Inspection");
    println!("===========================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Storage:");
    println!("  File size:     {}", format_size(result.file_size as usize));
    println!("  Buffer size:   {}", format_size(result.buffer_len));
    println!("  Live bytes:    {}", format_size(result.live_bytes));
    println!();
    println!("Structure:");
    println!("  Leaves:        {}", result.leaf_count);
    println!("  Dicts:         {}", result.dict_count);
    println!("  Arrays:        {}", result.array_count);
    println!();
    println!("Fields:");
    for field in &result.fields {
        match field.children {
            Some(n) => println!("  {:<20} {} ({n} children)", field.name, field.kind),
            None => println!("  {:<20} {}", field.name, field.kind),
        }
    }

    if let Some(leaves) = &result.leaves {
        println!();
        println!("Leaves:");
        for leaf in leaves {
            println!(
                "  [{:>8} +{:<4}] {:<8} {}",
                leaf.offset, leaf.size, leaf.kind, leaf.path
            );
        }
    }
}
