//! Property tests for documents: round trips, updates and compaction.

use docpack_codec::{from_msgpack, to_msgpack, Value};
use docpack_core::{Document, FieldOutcome, SkipReason};
use docpack_testkit::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(PropTestConfig::default().to_proptest_config())]

    #[test]
    fn make_document_round_trips(value in document_strategy()) {
        let doc = Document::make_document(&value).unwrap();
        prop_assert_eq!(doc.to_value().unwrap(), value);
        prop_assert!(check_committed(&doc).is_ok());

        let bytes = doc.serialize().unwrap();
        let back = Document::deserialize(&bytes).unwrap();
        prop_assert_eq!(&back, &doc);
        prop_assert_eq!(back.serialize().unwrap(), bytes);
    }

    #[test]
    fn repeated_keys_leave_no_unreclaimable_bytes(value in repeated_key_document_strategy()) {
        let doc = Document::make_document(&value).unwrap();
        prop_assert_eq!(doc.buffer().len(), doc.stats().live_bytes);
        prop_assert!(check_committed(&doc).is_ok());
        prop_assert_eq!(doc.to_value().unwrap(), collapse_repeated_keys(&value));
    }

    #[test]
    fn set_with_repeated_key_operand_commits_clean(
        value in document_strategy(),
        operand in repeated_key_value_strategy(),
    ) {
        let mut doc = Document::make_document(&value).unwrap();
        doc.update(&UpdateSpec::new().set("fresh", operand.clone()).build()).unwrap();
        prop_assert_eq!(
            doc.get_value("fresh").unwrap(),
            Some(collapse_repeated_keys(&operand))
        );
        doc.commit().unwrap();
        prop_assert!(check_committed(&doc).is_ok());
    }

    #[test]
    fn every_path_reads_its_value(value in document_strategy()) {
        let doc = Document::make_document(&value).unwrap();
        for path in collect_paths(&value) {
            let expected = lookup(&value, &path);
            prop_assert_eq!(doc.get_value(&path).unwrap(), expected, "path {}", path);
        }
    }

    #[test]
    fn set_then_read((value, path) in document_and_path(), new in value_strategy()) {
        let mut doc = Document::make_document(&value).unwrap();
        let report = doc.update_with_report(&UpdateSpec::new().set(&path, new.clone()).build()).unwrap();
        let skipped = matches!(report.outcome(&path), Some(FieldOutcome::Skipped { .. }));
        prop_assert!(!skipped);
        prop_assert_eq!(doc.get_value(&path).unwrap(), Some(new.clone()));

        doc.commit().unwrap();
        prop_assert!(check_committed(&doc).is_ok());
        prop_assert_eq!(doc.get_value(&path).unwrap(), Some(new));
    }

    #[test]
    fn setting_the_current_value_is_a_noop((value, path) in document_and_path()) {
        let mut doc = Document::make_document(&value).unwrap();
        let current = doc.get_value(&path).unwrap().unwrap();
        let before = doc.clone();

        let changed = doc.update(&UpdateSpec::new().set(&path, current).build()).unwrap();

        prop_assert!(!changed);
        prop_assert_eq!(doc, before);
    }

    #[test]
    fn set_leaves_other_fields_alone((value, path) in document_and_path(), new in scalar_strategy()) {
        let mut doc = Document::make_document(&value).unwrap();
        doc.update(&UpdateSpec::new().set(&path, new).build()).unwrap();
        doc.commit().unwrap();

        for other in collect_paths(&value) {
            let related = other == path
                || other.starts_with(&format!("{path}."))
                || path.starts_with(&format!("{other}."));
            if !related {
                prop_assert_eq!(doc.get_value(&other).unwrap(), lookup(&value, &other), "path {}", other);
            }
        }
    }

    #[test]
    fn increment_follows_the_target_type(start in numeric_strategy(), by in numeric_strategy()) {
        let mut doc = Document::make_document(&Value::map([("n", start.clone())])).unwrap();
        doc.update(&UpdateSpec::new().inc("n", by.clone()).build()).unwrap();
        let result = doc.get_value("n").unwrap().unwrap();
        prop_assert_eq!(result.wire_type(), start.wire_type());
        match (&start, &result) {
            (Value::Unsigned(a), Value::Unsigned(r)) => {
                if let Value::Unsigned(b) = by {
                    prop_assert_eq!(*r, a.wrapping_add(b));
                }
            }
            (Value::Integer(a), Value::Integer(r)) => {
                if let Value::Integer(b) = by {
                    prop_assert_eq!(*r, a.wrapping_add(b));
                }
            }
            (Value::Float(a), Value::Float(r)) => {
                prop_assert_eq!(*r, a + by.as_double().unwrap());
            }
            other => prop_assert!(false, "unexpected pair {:?}", other),
        }
    }

    #[test]
    fn updates_then_commit_preserve_logical_state((value, ops) in document_with_updates_strategy(8)) {
        let mut doc = all_fields_document_from(&value);
        for op in &ops {
            doc.update(&op.to_spec()).unwrap();
            prop_assert!(check_invariants(&doc).is_ok());
        }
        let logical = doc.to_value().unwrap();

        let result = doc.commit().unwrap();
        prop_assert!(check_committed(&doc).is_ok(), "{:?}", check_committed(&doc));
        prop_assert_eq!(doc.to_value().unwrap(), logical);
        prop_assert_eq!(result.buffer_len_after, doc.buffer().len());

        let once = doc.clone();
        prop_assert!(doc.commit().unwrap().is_noop());
        prop_assert_eq!(&doc, &once);

        let back = Document::deserialize(&doc.serialize().unwrap()).unwrap();
        prop_assert_eq!(back, doc);
    }

    #[test]
    fn rollback_keeps_applied_writes((value, ops) in document_with_updates_strategy(6)) {
        let mut doc = all_fields_document_from(&value);
        for op in &ops {
            doc.update(&op.to_spec()).unwrap();
        }
        let logical = doc.to_value().unwrap();
        let buffer_len = doc.buffer().len();

        doc.rollback();

        prop_assert!(!doc.has_pending_changes());
        prop_assert_eq!(doc.buffer().len(), buffer_len);
        prop_assert_eq!(doc.to_value().unwrap(), logical);
        prop_assert!(check_invariants(&doc).is_ok());
    }
}

/// A document plus one of its existing paths.
fn document_and_path() -> impl Strategy<Value = (Value, String)> {
    document_strategy()
        .prop_filter("document must have a field", |doc| {
            doc.as_map().map_or(false, |pairs| !pairs.is_empty())
        })
        .prop_flat_map(|doc| {
            let paths = collect_paths(&doc);
            (Just(doc), prop::sample::select(paths))
        })
}

fn lookup(value: &Value, path: &str) -> Option<Value> {
    path.split('.')
        .try_fold(value, |current, segment| match current {
            Value::Map(_) => current.get(segment),
            Value::Array(_) => current.get_index(segment.parse().ok()?),
            _ => None,
        })
        .cloned()
}

#[test]
fn append_missing_path_creates_array_then_dict() {
    let mut doc = Document::new();
    assert!(doc
        .update(&UpdateSpec::new().set("x.0.y", Value::Unsigned(1)).build())
        .unwrap());
    assert_eq!(
        doc.to_value().unwrap(),
        Value::map([(
            "x",
            Value::Array(vec![Value::map([("y", Value::Unsigned(1))])])
        )])
    );
    assert_committed(&doc);
}

#[test]
fn first_change_wins_unless_all_fields() {
    let spec = UpdateSpec::new()
        .set("name", Value::from("Bob"))
        .set("age", Value::Unsigned(99))
        .build();

    let mut first = document_from(&person());
    let report = first.update_with_report(&spec).unwrap();
    assert!(report.stopped_early);
    assert_eq!(first.get_value("age").unwrap(), Some(Value::Unsigned(30)));

    let mut all = all_fields_document_from(&person());
    let report = all.update_with_report(&spec).unwrap();
    assert!(!report.stopped_early);
    assert_eq!(report.changed_count(), 2);
    assert_eq!(all.get_value("age").unwrap(), Some(Value::Unsigned(99)));
}

#[test]
fn skips_are_reported_per_field() {
    let mut doc = all_fields_document_from(&order());
    let spec = UpdateSpec::new()
        .inc("id", Value::Unsigned(1))
        .inc("customer.name.first", Value::Unsigned(1))
        .inc("items.0.qty", Value::from("one"))
        .inc("items.1.qty", Value::Unsigned(4))
        .build();
    let report = doc.update_with_report(&spec).unwrap();

    assert_eq!(
        report.outcome("id"),
        Some(FieldOutcome::skipped(SkipReason::NonNumericTarget))
    );
    assert_eq!(
        report.outcome("customer.name.first"),
        Some(FieldOutcome::skipped(SkipReason::PathConflict))
    );
    assert_eq!(
        report.outcome("items.0.qty"),
        Some(FieldOutcome::skipped(SkipReason::NonNumericOperand))
    );
    assert_eq!(report.outcome("items.1.qty"), Some(FieldOutcome::Changed));
    assert_eq!(report.skipped().count(), 3);
    assert_eq!(doc.get_value("items.1.qty").unwrap(), Some(Value::Unsigned(5)));
}

#[test]
fn pending_changes_block_serialization_until_commit() {
    let mut doc = document_from(&order());
    doc.update(&UpdateSpec::new().set("tags.1", Value::from("slow")).build())
        .unwrap();
    assert!(doc.serialize().is_err());
    doc.commit().unwrap();
    assert_round_trip(&doc);
    assert_eq!(
        to_msgpack(&doc.get_value("tags").unwrap().unwrap()).unwrap(),
        to_msgpack(&Value::Array(vec![Value::from("gift"), Value::from("slow")])).unwrap()
    );
}

#[test]
fn deep_nesting_is_an_error_everywhere() {
    let mut nested = vec![0x91u8; 200_000];
    nested.push(0x80);
    assert!(from_msgpack(&nested).is_err());
    fuzz_msgpack_decode(&nested);
    fuzz_msgpack_roundtrip(&nested);

    let mut document = vec![0x92, 0xc4, 0x00];
    document.extend_from_slice(&nested);
    assert!(Document::deserialize(&document).is_err());
    fuzz_document_decode(&document);
}
