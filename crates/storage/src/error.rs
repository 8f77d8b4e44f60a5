//! Error types for row store backends

use jsonstore_core::{ContainerKind, Error};
use thiserror::Error;

/// Result type alias for row store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Row store backend errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite failure
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Table name is not a plain SQL identifier
    #[error("invalid table name {0:?}: expected [A-Za-z_][A-Za-z0-9_]*")]
    InvalidTableName(String),

    /// A persisted row cannot be read back (bad hex digest, negative index, ...)
    #[error("corrupt stored row: {0}")]
    CorruptRow(String),

    /// Rows of the wrong container kind were handed to the store
    #[error("store holds {expected} rows, got {actual}")]
    KindMismatch {
        /// Kind the store holds
        expected: ContainerKind,
        /// Kind that was supplied
        actual: ContainerKind,
    },

    /// Persisted format does not match this build (hash algorithm or kind)
    #[error("format mismatch for {key}: stored {stored:?}, expected {expected:?}")]
    FormatMismatch {
        /// Metadata key that differs
        key: String,
        /// Value found in storage
        stored: String,
        /// Value this build writes
        expected: String,
    },
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::KindMismatch { expected, actual } => {
                Error::WrongContainerKind { expected, actual }
            }
            other => Error::Storage(other.to_string()),
        }
    }
}

/// Check that a table name is a plain SQL identifier
///
/// Table names are spliced into SQL text, so only `[A-Za-z_][A-Za-z0-9_]*`
/// is accepted.
pub fn validate_table_name(name: &str) -> StoreResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidTableName(name.to_string()))
    }
}
