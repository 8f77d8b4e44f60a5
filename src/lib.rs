//! jsonstore - content-addressed storage for JSON objects and arrays
//!
//! Every container is identified by the SHA-256 fingerprint of its
//! canonical encoding and stored as one row per member. Equal values,
//! whatever their key order, always map to the same fingerprint and the
//! same rows.
//!
//! # Quick Start
//!
//! ```ignore
//! use jsonstore::{decode, JsonStore, StoreConfig};
//!
//! let store = JsonStore::in_memory(&StoreConfig::default());
//! let fp = store.insert(&decode(r#"{"b":1,"a":[true,null]}"#)?)?;
//! let value = store.retrieve(&fp)?;
//! ```
//!
//! # Architecture
//!
//! - `jsonstore-core`: value model, canonical encoder, fingerprints,
//!   decomposition and reconstruction (pure, no I/O)
//! - `jsonstore-storage`: row store backends (memory, SQLite)
//! - this crate: configuration and the store facades

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod store;

pub use config::{StoreConfig, CONFIG_FILE_NAME, DEFAULT_ARRAY_TABLE, DEFAULT_OBJECT_TABLE};
#[cfg(feature = "sqlite")]
pub use store::DATABASE_FILE_NAME;
pub use store::{ArrayStore, ContainerStore, JsonStore, ObjectStore};

pub use jsonstore_core::*;
pub use jsonstore_storage::{MemoryRowStore, RowStore, StoreError, StoreResult};
#[cfg(feature = "sqlite")]
pub use jsonstore_storage::SqliteRowStore;
