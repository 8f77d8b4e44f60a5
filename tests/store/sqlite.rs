//! SQLite-backed stores
//!
//! Persistence across reopen, data directory layout, custom tables and
//! rows touched by other SQLite clients.

use crate::common::*;
use jsonstore::{CONFIG_FILE_NAME, DATABASE_FILE_NAME};
use rusqlite::{params, Connection};
use serde_json::json as j;
use tempfile::TempDir;

#[test]
fn values_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let obj = json(j!({"k": [1, 2.5, "x"]}));
    let arr = json(j!([{"a": null}, []]));

    let (fo, fa) = {
        let store = JsonStore::open(&path, &StoreConfig::default()).unwrap();
        (store.insert(&obj).unwrap(), store.insert(&arr).unwrap())
    };

    let store = JsonStore::open(&path, &StoreConfig::default()).unwrap();
    assert_eq!(store.retrieve(&fo).unwrap(), obj);
    assert_eq!(store.retrieve(&fa).unwrap(), arr);
    assert_eq!(store.len().unwrap(), 2);
}

#[test]
fn open_dir_writes_default_config() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");

    let store = JsonStore::open_dir(&data).unwrap();
    let fp = store.insert(&val(r#"{"a":1}"#)).unwrap();
    drop(store);

    assert!(data.join(CONFIG_FILE_NAME).exists());
    assert!(data.join(DATABASE_FILE_NAME).exists());

    let store = JsonStore::open_dir(&data).unwrap();
    assert_eq!(store.retrieve(&fp).unwrap(), val(r#"{"a":1}"#));
}

#[test]
fn open_dir_honours_custom_tables() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "object_table = \"docs\"\narray_table = \"lists\"\n",
    )
    .unwrap();

    let store = JsonStore::open_dir(dir.path()).unwrap();
    store.insert(&val("[1,2,3]")).unwrap();
    drop(store);

    let conn = Connection::open(dir.path().join(DATABASE_FILE_NAME)).unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM lists", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 3);
}

#[test]
fn custom_table_name() {
    let config = StoreConfig {
        array_table: "custom_elements".into(),
        ..StoreConfig::default()
    };
    let store = ArrayStore::open_in_memory(&config).unwrap();
    let v = val("[1,2,3]");
    let fp = store.insert(&v).unwrap();
    assert_eq!(store.retrieve(&fp).unwrap(), v);
}

#[test]
fn invalid_table_name_is_config_error() {
    let config = StoreConfig {
        object_table: "bad name".into(),
        ..StoreConfig::default()
    };
    assert!(matches!(
        ObjectStore::open_in_memory(&config).unwrap_err(),
        Error::Config(_)
    ));
}

#[test]
fn rows_use_hex_digests() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let v = val(r#"{"b":true,"a":"x"}"#);
    let fp = ObjectStore::open(&path, &StoreConfig::default())
        .unwrap()
        .insert(&v)
        .unwrap();

    let conn = Connection::open(&path).unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT property_name, property_json, property_digest FROM objectstore \
             WHERE fingerprint = ?1 ORDER BY property_name",
        )
        .unwrap();
    let rows: Vec<(String, String, String)> = stmt
        .query_map(params![fp.to_hex()], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))
        .unwrap()
        .collect::<rusqlite::Result<_>>()
        .unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].0, "a");
    assert_eq!(rows[0].1, "\"x\"");
    assert_eq!(rows[0].2, fingerprint(&Value::from("x")).unwrap().to_hex());
    assert_eq!(rows[1].1, "true");
    assert!(rows.iter().all(|r| r.2.len() == 64));
}

#[test]
fn deleted_rows_surface_as_empty_container() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let store = ArrayStore::open(&path, &StoreConfig::default()).unwrap();
    let fp = store.insert(&val("[1,2]")).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "DELETE FROM arraystore WHERE fingerprint = ?1",
        params![fp.to_hex()],
    )
    .unwrap();

    assert!(store.exists(&fp).unwrap());
    assert!(matches!(
        store.retrieve(&fp).unwrap_err(),
        Error::EmptyContainer(_)
    ));
}

#[test]
fn deleted_element_surfaces_as_corrupt_sequence() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let store = ArrayStore::open(&path, &StoreConfig::default()).unwrap();
    let fp = store.insert(&val("[1,2,3]")).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "DELETE FROM arraystore WHERE fingerprint = ?1 AND element_index = 1",
        params![fp.to_hex()],
    )
    .unwrap();

    assert!(matches!(
        store.retrieve(&fp).unwrap_err(),
        Error::CorruptIndexSequence { .. }
    ));
}

#[test]
fn rows_written_by_another_client_are_listed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let store = ObjectStore::open(&path, &StoreConfig::default()).unwrap();

    let v = val(r#"{"name":"ext","tags":["a","b"]}"#);
    let fp = fingerprint(&v).unwrap();
    let conn = Connection::open(&path).unwrap();
    for (name, text) in [("name", "\"ext\""), ("tags", "[\"a\", \"b\"]")] {
        conn.execute(
            "INSERT INTO objectstore (fingerprint, property_name, property_json) VALUES (?1, ?2, ?3)",
            params![fp.to_hex(), name, text],
        )
        .unwrap();
    }

    assert!(store.exists(&fp).unwrap());
    assert_eq!(store.retrieve(&fp).unwrap(), v);
    assert_eq!(store.retrieve_all().unwrap(), vec![v]);
}
