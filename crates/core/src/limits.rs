//! Size limits for stored containers
//!
//! Limits are checked before decomposition so an oversized value is
//! rejected as a whole, before any row is produced.
//!
//! | Limit | Default |
//! |-------|---------|
//! | Nesting depth | 100 levels |
//! | Canonical document size | 16 MB |
//! | Members per container | 1M |
//!
//! The nesting default stays below the decoder's recursion limit so every
//! stored sub-document can be decoded again. A configured depth above
//! [`DECODABLE_NESTING_DEPTH`] is capped there.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum nesting depth
pub const MAX_NESTING_DEPTH: usize = 100;

/// Deepest container nesting the decoder accepts (serde_json stops at 128)
pub const DECODABLE_NESTING_DEPTH: usize = 127;

/// Default maximum canonical document size in bytes (16 MB)
pub const MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

/// Default maximum number of members in one container
pub const MAX_MEMBERS: usize = 1_000_000;

/// Size limits for inserted values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum container nesting depth (root container is depth 1)
    pub max_nesting_depth: usize,

    /// Maximum canonical encoding size of a whole container, in bytes
    pub max_document_bytes: usize,

    /// Maximum number of members in any array or object
    pub max_members: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_nesting_depth: MAX_NESTING_DEPTH,
            max_document_bytes: MAX_DOCUMENT_BYTES,
            max_members: MAX_MEMBERS,
        }
    }
}

impl Limits {
    /// Create limits with small values for testing
    pub fn with_small_limits() -> Self {
        Limits {
            max_nesting_depth: 4,
            max_document_bytes: 256,
            max_members: 8,
        }
    }

    /// Validate nesting depth and member counts (recursive)
    ///
    /// Does NOT validate encoded size; see [`Limits::validate_document_size`].
    pub fn validate_value(&self, value: &Value) -> Result<(), LimitError> {
        self.validate_value_impl(value, 0)
    }

    fn validate_value_impl(&self, value: &Value, depth: usize) -> Result<(), LimitError> {
        match value {
            Value::Array(items) => {
                self.check_depth(depth + 1)?;
                self.check_members(items.len())?;
                for item in items {
                    self.validate_value_impl(item, depth + 1)?;
                }
                Ok(())
            }
            Value::Object(map) => {
                self.check_depth(depth + 1)?;
                self.check_members(map.len())?;
                for item in map.values() {
                    self.validate_value_impl(item, depth + 1)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Nesting depth actually enforced
    pub fn effective_nesting_depth(&self) -> usize {
        self.max_nesting_depth.min(DECODABLE_NESTING_DEPTH)
    }

    fn check_depth(&self, depth: usize) -> Result<(), LimitError> {
        let max = self.effective_nesting_depth();
        if depth > max {
            return Err(LimitError::NestingTooDeep { actual: depth, max });
        }
        Ok(())
    }

    fn check_members(&self, count: usize) -> Result<(), LimitError> {
        if count > self.max_members {
            return Err(LimitError::TooManyMembers {
                actual: count,
                max: self.max_members,
            });
        }
        Ok(())
    }

    /// Validate the canonical size of a container
    pub fn validate_document_size(&self, encoded_len: usize) -> Result<(), LimitError> {
        if encoded_len > self.max_document_bytes {
            return Err(LimitError::DocumentTooLarge {
                actual: encoded_len,
                max: self.max_document_bytes,
            });
        }
        Ok(())
    }
}

/// Limit validation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitError {
    /// Value nesting exceeds maximum depth
    #[error("nesting too deep: {actual} levels exceeds maximum {max}")]
    NestingTooDeep {
        /// Actual nesting depth
        actual: usize,
        /// Maximum allowed depth
        max: usize,
    },

    /// Canonical document exceeds maximum size
    #[error("document too large: {actual} bytes exceeds maximum {max}")]
    DocumentTooLarge {
        /// Actual encoded size
        actual: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// A container has too many members
    #[error("too many members: {actual} exceeds maximum {max}")]
    TooManyMembers {
        /// Actual member count
        actual: usize,
        /// Maximum allowed count
        max: usize,
    },
}
