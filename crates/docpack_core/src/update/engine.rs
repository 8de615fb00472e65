//! Applying update documents.

use super::operator::{increment, UpdateOperator};
use super::outcome::{FieldOutcome, FieldReport, SkipReason, UpdateReport};
use crate::document::Document;
use crate::error::{CoreError, CoreResult};
use crate::path::{self, looks_like_array_index, parse_array_index};
use crate::structure::{Node, NodeId};
use docpack_codec::{to_msgpack, Value};
use tracing::{debug, trace};

/// Applies `spec` to `doc`.
///
/// The whole update document is validated before any field is touched, so
/// a malformed update never leaves a partial write behind.
pub(crate) fn apply_update(doc: &mut Document, spec: &Value) -> CoreResult<UpdateReport> {
    let blocks = operator_blocks(spec)?;
    let total: usize = blocks.iter().map(|(_, fields)| fields.len()).sum();
    let mut report = UpdateReport::default();

    'blocks: for (operator, fields) in blocks {
        for (field, operand) in fields {
            let outcome = apply_field(doc, operator, field, operand)?;
            trace!(operator, field = field.as_str(), %outcome, "update field");
            report.fields.push(FieldReport {
                operator: operator.to_string(),
                path: field.clone(),
                outcome,
            });
            if outcome.is_changed() {
                report.changed = true;
                if !doc.config.apply_all_fields {
                    report.stopped_early = report.fields.len() < total;
                    break 'blocks;
                }
            }
        }
    }

    debug!(
        changed = report.changed,
        fields = report.fields.len(),
        stopped_early = report.stopped_early,
        pending_ranges = doc.dead.len(),
        "applied update"
    );
    Ok(report)
}

fn operator_blocks(spec: &Value) -> CoreResult<Vec<(&str, &[(String, Value)])>> {
    let pairs = spec
        .as_map()
        .ok_or_else(|| CoreError::invalid_update("update must be a map of operator blocks"))?;
    pairs
        .iter()
        .map(|(operator, block)| {
            block
                .as_map()
                .map(|fields| (operator.as_str(), fields))
                .ok_or_else(|| {
                    CoreError::invalid_update(format!("operand of {operator} must be a map"))
                })
        })
        .collect()
}

/// Applies one `(operator, path, operand)` triple.
fn apply_field(
    doc: &mut Document,
    operator: &str,
    field: &str,
    operand: &Value,
) -> CoreResult<FieldOutcome> {
    let Some(operator) = UpdateOperator::parse(operator) else {
        return Ok(FieldOutcome::skipped(SkipReason::UnsupportedOperator));
    };
    let segments = path::split_path(field, doc.config.path_separator);
    if segments.is_empty() {
        return Ok(FieldOutcome::skipped(SkipReason::EmptyPath));
    }
    let root = doc.structure.root();
    let existing = path::resolve_segments(&doc.structure, root, &segments);

    let candidate = match operator {
        UpdateOperator::Unset => return unset_field(doc, &segments, existing),
        UpdateOperator::Set => operand.clone(),
        UpdateOperator::Inc => {
            if !operand.is_number() {
                return Ok(FieldOutcome::skipped(SkipReason::NonNumericOperand));
            }
            match existing {
                None => operand.clone(),
                Some(id) => {
                    let Some(leaf) = doc.structure.leaf(id).copied() else {
                        return Ok(FieldOutcome::skipped(SkipReason::NonNumericTarget));
                    };
                    let old = doc.read_leaf(&leaf)?;
                    match increment(&old, operand) {
                        Ok(value) => value,
                        Err(reason) => return Ok(FieldOutcome::skipped(reason)),
                    }
                }
            }
        }
    };

    if segments.len() + value_depth(&candidate) > doc.config.max_depth {
        return Ok(FieldOutcome::skipped(SkipReason::PathTooDeep));
    }

    match existing {
        Some(id) => replace_field(doc, id, &candidate, segments.len()),
        None => append_field(doc, &segments, &candidate),
    }
}

/// Overwrites the node at `id` with `value`.
fn replace_field(
    doc: &mut Document,
    id: NodeId,
    value: &Value,
    depth: usize,
) -> CoreResult<FieldOutcome> {
    let encoded = to_msgpack(value)?;
    let current = match doc.structure.leaf(id) {
        Some(leaf) => doc.leaf_bytes(leaf)?.to_vec(),
        None => to_msgpack(&doc.materialize(id)?)?,
    };
    if current == encoded {
        return Ok(FieldOutcome::Unchanged);
    }

    match (doc.structure.leaf(id).copied(), value.wire_type()) {
        (Some(old), Some(wire_type)) => {
            doc.mark_dead(&[old]);
            let offset = doc.buffer.len();
            doc.buffer.extend_from_slice(&encoded);
            if let Some(leaf) = doc.structure.leaf_mut(id) {
                leaf.wire_type = wire_type;
                leaf.offset = offset;
                leaf.size = encoded.len();
            }
        }
        _ => {
            let replacement = doc.insert_value(value, depth)?;
            let dropped = doc.structure.replace_in_place(id, replacement);
            doc.mark_dead(&dropped);
        }
    }
    Ok(FieldOutcome::Changed)
}

/// Writes `value` at a path that does not resolve, creating every missing
/// intermediate container.
///
/// A missing intermediate becomes an array when the segment after it looks
/// like an array index, and a dict otherwise. An array position at or past
/// the end appends.
fn append_field(doc: &mut Document, segments: &[&str], value: &Value) -> CoreResult<FieldOutcome> {
    let Some((last, intermediate)) = segments.split_last() else {
        return Ok(FieldOutcome::skipped(SkipReason::EmptyPath));
    };

    // Walk the existing prefix without creating anything, so a conflict
    // found late leaves the document untouched.
    let mut current = doc.structure.root();
    let mut depth = 0;
    while depth < intermediate.len() {
        match child(doc, current, intermediate[depth]) {
            Ok(Some(next)) => {
                current = next;
                depth += 1;
            }
            Ok(None) => break,
            Err(reason) => return Ok(FieldOutcome::skipped(reason)),
        }
    }
    if depth == intermediate.len() {
        if let Err(reason) = child(doc, current, last) {
            return Ok(FieldOutcome::skipped(reason));
        }
    }

    let chain = segments.windows(2).skip(depth);
    for pair in chain {
        let (segment, next) = (pair[0], pair[1]);
        let container = if looks_like_array_index(next) {
            Node::Array(Vec::new())
        } else {
            Node::Dict(Vec::new())
        };
        let created = doc.structure.push(container);
        attach(doc, current, segment, created);
        current = created;
    }

    let leaf = doc.insert_value(value, segments.len())?;
    attach(doc, current, last, leaf);
    Ok(FieldOutcome::Changed)
}

/// Looks up `segment` under `parent` for an append.
///
/// `Ok(None)` means the child is missing and may be created.
fn child(doc: &Document, parent: NodeId, segment: &str) -> Result<Option<NodeId>, SkipReason> {
    let found = match doc.structure.node(parent) {
        Some(Node::Dict(_)) => doc.structure.dict_get(parent, segment),
        Some(Node::Array(_)) => {
            let index = parse_array_index(segment).ok_or(SkipReason::PathConflict)?;
            doc.structure.array_get(parent, index)
        }
        _ => return Err(SkipReason::PathConflict),
    };
    match found {
        Some(id) if doc.structure.leaf(id).is_some() => Err(SkipReason::PathConflict),
        other => Ok(other),
    }
}

fn attach(doc: &mut Document, parent: NodeId, segment: &str, child: NodeId) {
    if matches!(doc.structure.node(parent), Some(Node::Array(_))) {
        doc.structure.array_push(parent, child);
    } else {
        doc.structure.dict_insert(parent, segment, child);
    }
}

fn unset_field(
    doc: &mut Document,
    segments: &[&str],
    existing: Option<NodeId>,
) -> CoreResult<FieldOutcome> {
    let (Some(_), Some((last, parent_path))) = (existing, segments.split_last()) else {
        return Ok(FieldOutcome::Unchanged);
    };
    let root = doc.structure.root();
    let Some(parent) = path::resolve_segments(&doc.structure, root, parent_path) else {
        return Ok(FieldOutcome::Unchanged);
    };
    let Some(removed) = doc.structure.remove_child(parent, last) else {
        return Ok(FieldOutcome::Unchanged);
    };
    let mut dropped = Vec::new();
    doc.structure.vacate(removed, &mut dropped);
    doc.mark_dead(&dropped);
    Ok(FieldOutcome::Changed)
}

/// Levels a value adds below the node that holds it.
fn value_depth(value: &Value) -> usize {
    match value {
        Value::Map(pairs) => pairs
            .iter()
            .map(|(_, v)| 1 + value_depth(v))
            .max()
            .unwrap_or(0),
        Value::Array(items) => items.iter().map(|v| 1 + value_depth(v)).max().unwrap_or(0),
        _ => 0,
    }
}
