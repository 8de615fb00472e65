//! Document invariant checks shared by property and integration tests.

use docpack_codec::from_msgpack;
use docpack_core::Document;

/// Checks the buffer/index invariants of `doc`.
///
/// Beyond [`Document::verify`], every live leaf must decode to a value of
/// the wire type recorded in its index node, and decode from exactly the
/// bytes it claims.
pub fn check_invariants(doc: &Document) -> Result<(), String> {
    doc.verify().map_err(|e| e.to_string())?;
    for leaf in doc.structure().live_leaves() {
        let bytes = &doc.buffer()[leaf.offset..leaf.end()];
        let value = from_msgpack(bytes)
            .map_err(|e| format!("leaf at {} does not decode: {e}", leaf.offset))?;
        if value.wire_type() != Some(leaf.wire_type) {
            return Err(format!(
                "leaf at {} tagged {} but holds {:?}",
                leaf.offset, leaf.wire_type, value
            ));
        }
    }
    Ok(())
}

/// Checks the post-commit invariants: nothing pending and the buffer holds
/// exactly the live values.
pub fn check_committed(doc: &Document) -> Result<(), String> {
    check_invariants(doc)?;
    if doc.has_pending_changes() {
        return Err(format!(
            "{} dead ranges still pending",
            doc.pending_ranges().len()
        ));
    }
    let stats = doc.stats();
    if stats.buffer_len != stats.live_bytes {
        return Err(format!(
            "buffer holds {} bytes but only {} are live",
            stats.buffer_len, stats.live_bytes
        ));
    }
    Ok(())
}

/// Panics unless `doc` satisfies [`check_committed`].
pub fn assert_committed(doc: &Document) {
    if let Err(message) = check_committed(doc) {
        panic!("committed document invariant violated: {message}");
    }
}

/// Panics unless `doc` serializes and deserializes to an equal document
/// with an identical buffer.
pub fn assert_round_trip(doc: &Document) {
    let bytes = doc.serialize().expect("Failed to serialize document");
    let back = Document::deserialize(&bytes).expect("Failed to deserialize document");
    assert_eq!(&back, doc, "round trip changed the document");
    assert_eq!(back.buffer(), doc.buffer(), "round trip changed the buffer");
    assert_eq!(
        back.serialize().expect("Failed to re-serialize document"),
        bytes,
        "round trip changed the encoding"
    );
}
