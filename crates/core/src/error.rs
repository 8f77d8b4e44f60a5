//! Error types for the JSON row store
//!
//! This module defines all error types used by the core engine.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Classification
//!
//! | Class | Variants | Meaning |
//! |-------|----------|---------|
//! | Caller | `Encoding`, `NotAContainer`, `WrongContainerKind`, `Limit` | Bad input, propagated |
//! | Integrity | `EmptyContainer`, `CorruptIndexSequence`, `CorruptRow`, `Decode` | Stored data is inconsistent, never repaired |
//! | Expected | `NotFound` | Fingerprint is not stored |
//! | Environment | `Storage`, `Config` | Backend or configuration failure |
//!
//! Every error is a deterministic function of its input; nothing here is retried.

use crate::fingerprint::Fingerprint;
use crate::limits::LimitError;
use crate::row::ContainerKind;
use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// A value cannot be represented in canonical form
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The value lies outside the JSON value model (non-finite float,
    /// integer outside the 64-bit signed range, ...)
    #[error("unsupported value: {0}")]
    UnsupportedType(String),

    /// Input bytes are not valid UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// Error types for the JSON row store
#[derive(Debug, Error)]
pub enum Error {
    /// Value could not be canonically encoded
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Stored or supplied text is not parseable JSON
    #[error("decode error: {0}")]
    Decode(String),

    /// A scalar was given where an object or array is required
    #[error("not a container: top-level value is {0}")]
    NotAContainer(&'static str),

    /// Container is an object where an array was expected, or the reverse
    #[error("wrong container kind: expected {expected}, got {actual}")]
    WrongContainerKind {
        /// Kind the store holds
        expected: ContainerKind,
        /// Kind that was supplied
        actual: ContainerKind,
    },

    /// Reconstruction was asked to build a container from zero rows
    #[error("empty row-set for container {0}")]
    EmptyContainer(Fingerprint),

    /// Array element indices are not a dense 0..n-1 run
    #[error("corrupt index sequence for container {fingerprint}: {reason}")]
    CorruptIndexSequence {
        /// Container whose rows are inconsistent
        fingerprint: Fingerprint,
        /// What was wrong with the indices
        reason: String,
    },

    /// A row does not belong to the container being rebuilt, or its slot
    /// does not match the container kind
    #[error("corrupt row for container {fingerprint}: {reason}")]
    CorruptRow {
        /// Container being reconstructed
        fingerprint: Fingerprint,
        /// What was wrong with the row
        reason: String,
    },

    /// Fingerprint is not present in the store
    #[error("not found: {0}")]
    NotFound(Fingerprint),

    /// Value exceeds a configured size limit
    #[error("limit exceeded: {0}")]
    Limit(#[from] LimitError),

    /// Row store backend failure
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration could not be read or is invalid
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// True when the error only reports an absent fingerprint
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True when the error reports inconsistent stored data
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            Error::EmptyContainer(_)
                | Error::CorruptIndexSequence { .. }
                | Error::CorruptRow { .. }
                | Error::Decode(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Decode(e.to_string())
    }
}
