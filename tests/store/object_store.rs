//! Object store tests
//!
//! One row per property, keyed by `(fingerprint, property_name)`.

use crate::common::*;
use jsonstore::{NullPolicy, Slot};
use serde_json::json as j;

fn objects() -> ObjectStore {
    init_tracing();
    ObjectStore::in_memory(&StoreConfig::default())
}

#[test]
fn property_rows_sorted_by_name() {
    let store = objects();
    let fp = store
        .insert(&json(j!({"zeta": 1, "alpha": 2, "Mid": 3})))
        .unwrap();
    let names: Vec<Slot> = store.rows(&fp).unwrap().into_iter().map(|r| r.slot).collect();
    assert_eq!(
        names,
        vec![
            Slot::Property("Mid".into()),
            Slot::Property("alpha".into()),
            Slot::Property("zeta".into()),
        ]
    );
}

#[test]
fn unicode_keys_and_escapes_round_trip() {
    let store = objects();
    let v = json(j!({
        "é": "tab\there",
        "\u{1F600}": "quote \" and \\ backslash",
        "ctl": "\u{1}\u{1f}",
        "": null
    }));
    let fp = store.insert(&v).unwrap();
    assert_eq!(store.retrieve(&fp).unwrap(), v);
}

#[test]
fn null_members_marker_and_literal_both_reconstruct() {
    let v = json(j!({"a": null, "b": 1}));

    let marker = objects();
    let fp = marker.insert(&v).unwrap();
    let rows = marker.rows(&fp).unwrap();
    assert!(rows[0].member.is_none());
    assert_eq!(marker.retrieve(&fp).unwrap(), v);

    let literal = ObjectStore::in_memory(&StoreConfig {
        null_policy: NullPolicy::Literal,
        ..StoreConfig::default()
    });
    let fp2 = literal.insert(&v).unwrap();
    let rows = literal.rows(&fp2).unwrap();
    let member = rows[0].member.as_ref().unwrap();
    assert_eq!(member.canonical, "null");
    assert_eq!(member.digest, fingerprint(&Value::Null).unwrap());
    assert_eq!(literal.retrieve(&fp2).unwrap(), v);

    // The policy never changes the container fingerprint
    assert_eq!(fp, fp2);
}

#[test]
fn reinsert_replaces_rows_per_key() {
    let store = objects();
    let v = json(j!({"a": [1, 2], "b": {"c": 1.5}}));
    let fp = store.insert(&v).unwrap();
    let before = store.rows(&fp).unwrap();
    store.insert(&v).unwrap();
    assert_eq!(store.rows(&fp).unwrap(), before);
    assert_eq!(store.row_count().unwrap(), 2);
}

#[test]
fn array_rejected_by_object_store() {
    let store = objects();
    let err = store.insert(&json(j!([1]))).unwrap_err();
    assert!(matches!(
        err,
        Error::WrongContainerKind {
            expected: ContainerKind::Object,
            actual: ContainerKind::Array
        }
    ));
}

#[test]
fn deeply_nested_property_values() {
    let store = objects();
    let v = json(j!({"l1": {"l2": {"l3": {"l4": [1, {"l5": "deep"}]}}}}));
    let fp = store.insert(&v).unwrap();
    assert_eq!(store.retrieve(&fp).unwrap(), v);
}

#[test]
fn nesting_limit_rejects_whole_value() {
    let store = ObjectStore::in_memory(&StoreConfig {
        limits: jsonstore::Limits::with_small_limits(),
        ..StoreConfig::default()
    });
    let err = store
        .insert(&json(j!({"a": {"b": {"c": {"d": {"e": 1}}}}})))
        .unwrap_err();
    assert!(matches!(err, Error::Limit(_)));
    assert!(store.is_empty().unwrap());
}

#[test]
fn get_returns_none_for_unknown() {
    let store = objects();
    let fp = fingerprint(&json(j!({"never": "stored"}))).unwrap();
    assert_eq!(store.get(&fp).unwrap(), None);
    assert!(!store.exists(&fp).unwrap());
}

#[test]
fn concurrent_inserts_share_one_store() {
    let store = objects();
    std::thread::scope(|s| {
        for t in 0..4 {
            let store = &store;
            s.spawn(move || {
                for i in 0..50 {
                    store.insert(&json(j!({"t": t, "i": i}))).unwrap();
                    // Every thread also writes a shared value
                    store.insert(&json(j!({"shared": true}))).unwrap();
                }
            });
        }
    });
    assert_eq!(store.len().unwrap(), 201);
}
