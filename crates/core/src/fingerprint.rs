//! Content fingerprints
//!
//! A fingerprint is the SHA-256 digest of a value's canonical bytes.
//! Because the canonical form is unique per value, fingerprint equality
//! means value equality (collisions are treated as negligible).
//!
//! The hash algorithm is part of the storage format: changing it
//! invalidates every stored fingerprint. Stores record [`HASH_ALGORITHM`].
//!
//! Fingerprints render as 64 lowercase hex characters, the form persisted
//! by every row store backend.

use crate::canonical;
use crate::error::EncodingError;
use crate::value::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier of the digest algorithm used for fingerprints
pub const HASH_ALGORITHM: &str = "sha256";

/// Digest length in bytes
pub const DIGEST_LEN: usize = 32;

/// Length of the hex rendering
pub const HEX_LEN: usize = DIGEST_LEN * 2;

/// Error parsing a fingerprint from its hex form
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FingerprintParseError {
    /// Wrong number of characters
    #[error("fingerprint must be 64 hex characters, got {0}")]
    BadLength(usize),

    /// Character outside `[0-9a-f]`
    #[error("invalid fingerprint character {0:?}")]
    BadChar(char),
}

/// SHA-256 digest of a canonical encoding
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fingerprint([u8; DIGEST_LEN]);

impl Fingerprint {
    /// Wrap raw digest bytes
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Fingerprint(bytes)
    }

    /// Hash already-canonical bytes
    ///
    /// Callers must pass output of [`canonical::encode`]; hashing any other
    /// spelling produces a fingerprint no value maps to.
    pub fn of_canonical(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Fingerprint(hasher.finalize().into())
    }

    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Fingerprint a value
///
/// # Errors
///
/// Returns [`EncodingError`] if the value has no canonical form.
pub fn fingerprint(value: &Value) -> Result<Fingerprint, EncodingError> {
    Ok(Fingerprint::of_canonical(&canonical::encode(value)?))
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self)
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != HEX_LEN {
            return Err(FingerprintParseError::BadLength(s.chars().count()));
        }
        let mut bytes = [0u8; DIGEST_LEN];
        let mut chars = s.chars();
        for byte in bytes.iter_mut() {
            let hi = hex_nibble(chars.next())?;
            let lo = hex_nibble(chars.next())?;
            *byte = (hi << 4) | lo;
        }
        Ok(Fingerprint(bytes))
    }
}

fn hex_nibble(c: Option<char>) -> Result<u8, FingerprintParseError> {
    match c {
        Some(c @ '0'..='9') => Ok(c as u8 - b'0'),
        Some(c @ 'a'..='f') => Ok(c as u8 - b'a' + 10),
        Some(c) => Err(FingerprintParseError::BadChar(c)),
        None => Err(FingerprintParseError::BadLength(0)),
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
