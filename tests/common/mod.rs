//! Shared test utilities for all integration test suites.
//!
//! Import via `mod common;` from any test's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::sync::Once;

pub use jsonstore::{
    decode, encode, fingerprint, to_canonical_string, ArrayStore, ContainerKind, Error,
    Fingerprint, JsonStore, MemoryRowStore, ObjectStore, RowStore, StoreConfig, Value,
};
use tempfile::TempDir;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ============================================================================
// Values
// ============================================================================

/// Decode JSON text, panicking on malformed test input.
pub fn val(text: &str) -> Value {
    decode(text).unwrap_or_else(|e| panic!("bad test JSON {:?}: {}", text, e))
}

/// Convert a `serde_json::json!` literal.
pub fn json(v: serde_json::Value) -> Value {
    Value::try_from(v).expect("json! literal outside the value model")
}

/// Canonical text of a value.
pub fn canon(v: &Value) -> String {
    to_canonical_string(v).expect("value has no canonical form")
}

// ============================================================================
// Backends
// ============================================================================

/// One store under test; keeps its temp dir alive.
pub struct Backend {
    pub name: &'static str,
    pub store: JsonStore,
    _dir: Option<TempDir>,
}

/// The same store over every available row backend.
pub fn all_backends() -> Vec<Backend> {
    init_tracing();
    let config = StoreConfig::default();
    #[allow(unused_mut)]
    let mut backends = vec![Backend {
        name: "memory",
        store: JsonStore::in_memory(&config),
        _dir: None,
    }];

    #[cfg(feature = "sqlite")]
    {
        backends.push(Backend {
            name: "sqlite-memory",
            store: JsonStore::new(
                ObjectStore::open_in_memory(&config).expect("open sqlite object store"),
                ArrayStore::open_in_memory(&config).expect("open sqlite array store"),
            ),
            _dir: None,
        });

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        backends.push(Backend {
            name: "sqlite-file",
            store: JsonStore::open(dir.path().join("test.db"), &config)
                .expect("open sqlite file store"),
            _dir: Some(dir),
        });
    }

    backends
}

/// Run `f` against a fresh store on every backend.
pub fn for_each_backend(f: impl Fn(&JsonStore)) {
    for backend in all_backends() {
        let result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&backend.store)));
        if let Err(panic) = result {
            eprintln!("failed on backend {}", backend.name);
            std::panic::resume_unwind(panic);
        }
    }
}
