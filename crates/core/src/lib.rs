//! Core engine of the JSON row store
//!
//! This crate holds the pure, storage-independent parts of the system:
//! - Value: JSON value model with type-faithful numbers
//! - canonical: canonical encoder and JSON decoder
//! - fingerprint: SHA-256 fingerprints of canonical bytes
//! - row: decomposed row types (Row, Slot, Member, ContainerKind)
//! - decompose: container → rows (single and batch)
//! - reconstruct: rows → container, sort-merge grouping of row streams
//! - limits: size limits checked before decomposition
//! - error: Error hierarchy
//!
//! Every operation here is synchronous, performs no I/O and keeps no
//! shared state, so all of it may be called concurrently.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod canonical;
pub mod decompose;
pub mod error;
pub mod fingerprint;
pub mod limits;
pub mod reconstruct;
pub mod row;
pub mod value;

pub use canonical::{canonicalize_text, decode, decode_bytes, encode, to_canonical_string};
pub use decompose::{decompose, decompose_batch, Decomposed, DecomposedBatch, Decomposer, NullPolicy};
pub use error::{EncodingError, Error, Result};
pub use fingerprint::{fingerprint, Fingerprint, FingerprintParseError, HASH_ALGORITHM};
pub use limits::{LimitError, Limits, DECODABLE_NESTING_DEPTH};
pub use reconstruct::{
    group_by_container, reconstruct, reconstruct_all, reconstruct_array, reconstruct_known,
    reconstruct_object, RowOrder,
};
pub use row::{ContainerKind, Member, Row, Slot};
pub use value::Value;
