//! Array store tests
//!
//! One row per element, keyed by `(fingerprint, element_index)`.

use crate::common::*;
use jsonstore::{Fingerprint as Fp, Limits, Slot, DECODABLE_NESTING_DEPTH};
use serde_json::json as j;

fn arrays() -> ArrayStore {
    init_tracing();
    ArrayStore::in_memory(&StoreConfig::default())
}

#[test]
fn scalar_elements_keep_exact_types() {
    let store = arrays();
    let v = Value::Array(vec![
        Value::Int(42),
        Value::Float(2.5),
        Value::Null,
        Value::Bool(true),
        Value::Bool(false),
        Value::from("hello"),
        Value::from("true"),
        Value::from("false"),
        Value::from("null"),
        Value::from(""),
        Value::Int(0),
        Value::Int(-0),
        Value::Int(1),
        Value::Int(-1),
        Value::from("0"),
        Value::from("1"),
    ]);
    let fp = store.insert(&v).unwrap();
    let back = store.retrieve(&fp).unwrap();
    assert_eq!(back, v);
    assert_eq!(canon(&back), canon(&v));
}

#[test]
fn nested_arrays() {
    let store = arrays();
    let v = json(j!([[1, 2], ["a", true], [], [null, [3.5]]]));
    let fp = store.insert(&v).unwrap();
    assert_eq!(store.retrieve(&fp).unwrap(), v);
}

#[test]
fn object_elements() {
    let store = arrays();
    let v = json(j!([
        {"a": 1, "b": [2, false]},
        {"nested": {"x": true, "y": null}}
    ]));
    let fp = store.insert(&v).unwrap();
    assert_eq!(store.retrieve(&fp).unwrap(), v);
}

#[test]
fn element_rows_hold_canonical_text_and_digest() {
    let store = arrays();
    let items = vec![
        Value::Int(0),
        Value::Float(1.0),
        Value::Float(-0.0),
        json(j!({"b": [2, false]})),
        json(j!([1, 2])),
        Value::Null,
    ];
    let fp = store.insert(&Value::Array(items.clone())).unwrap();
    let rows = store.rows(&fp).unwrap();
    assert_eq!(rows.len(), items.len());

    for (row, item) in rows.iter().zip(&items) {
        assert_eq!(row.container, fp);
        let Slot::Index(i) = row.slot else {
            panic!("array row with slot {}", row.slot);
        };
        assert_eq!(&items[i as usize], item);
        match item {
            Value::Null => assert!(row.member.is_none()),
            _ => {
                let member = row.member.as_ref().unwrap();
                assert_eq!(member.canonical, canon(item));
                assert_eq!(member.digest, fingerprint(item).unwrap());
            }
        }
    }
    assert_eq!(rows[2].member.as_ref().unwrap().canonical, "-0.0");
}

#[test]
fn fingerprint_matches_canonical_hash() {
    let store = arrays();
    let v = json(j!([1, {"b": true}, [2, 3]]));
    let fp = store.insert(&v).unwrap();
    assert_eq!(fp, Fp::of_canonical(&encode(&v).unwrap()));
    assert_eq!(store.retrieve(&fp).unwrap(), v);
}

#[test]
fn batch_insert_returns_fingerprints_in_order() {
    let store = arrays();
    let values = vec![json(j!([1, 2])), json(j!([true, false, null]))];
    let fps = store.insert_batch(&values).unwrap();
    assert_eq!(fps.len(), values.len());
    for (v, fp) in values.iter().zip(&fps) {
        assert_eq!(*fp, fingerprint(v).unwrap());
        assert_eq!(&store.retrieve(fp).unwrap(), v);
    }
}

#[test]
fn batch_with_bad_value_writes_nothing() {
    let store = arrays();
    let values = vec![json(j!([1])), Value::Array(vec![Value::Float(f64::INFINITY)])];
    assert!(matches!(
        store.insert_batch(&values).unwrap_err(),
        Error::Encoding(_)
    ));
    assert!(store.is_empty().unwrap());
}

#[test]
fn batch_with_duplicates() {
    let store = arrays();
    let values = vec![json(j!([7])), json(j!([8])), json(j!([7]))];
    let fps = store.insert_batch(&values).unwrap();
    assert_eq!(fps[0], fps[2]);
    assert_eq!(store.len().unwrap(), 2);
}

#[test]
fn retrieve_all_single_element_arrays() {
    let store = arrays();
    let values: Vec<Value> = (0..3).map(|i| json(j!([i]))).collect();
    for v in &values {
        store.insert(v).unwrap();
    }
    let mut all = store.retrieve_all().unwrap();
    all.sort_by_key(|v| v.as_array().and_then(|a| a[0].as_int()));
    assert_eq!(all, values);
}

#[test]
fn long_array_indices_stay_dense() {
    let store = arrays();
    let v = Value::Array((0..1000).map(Value::Int).collect());
    let fp = store.insert(&v).unwrap();
    let rows = store.rows(&fp).unwrap();
    assert!(rows
        .iter()
        .enumerate()
        .all(|(i, r)| r.slot == Slot::Index(i as u64)));
    assert_eq!(store.retrieve(&fp).unwrap(), v);
}

#[test]
fn shared_elements_found_by_digest() {
    let store = arrays();
    let a = store.insert(&json(j!(["shared", 1]))).unwrap();
    let b = store.insert(&json(j!([2, "shared"]))).unwrap();
    let mut hits = store.find_by_value(&Value::from("shared")).unwrap();
    hits.sort();
    let mut expected = vec![(a, Slot::Index(0)), (b, Slot::Index(1))];
    expected.sort();
    assert_eq!(hits, expected);
}

fn nested_to(depth: usize) -> Value {
    (1..depth).fold(val("[1]"), |inner, _| Value::Array(vec![inner]))
}

#[test]
fn raised_depth_limit_still_reads_back() {
    let store = ArrayStore::in_memory(&StoreConfig {
        limits: Limits {
            max_nesting_depth: 500,
            ..Limits::default()
        },
        ..StoreConfig::default()
    });

    let deepest = nested_to(DECODABLE_NESTING_DEPTH);
    let fp = store.insert(&deepest).unwrap();
    assert_eq!(store.retrieve(&fp).unwrap(), deepest);

    let err = store.insert(&nested_to(200)).unwrap_err();
    assert!(matches!(err, Error::Limit(_)));
    assert_eq!(store.len().unwrap(), 1);
}
