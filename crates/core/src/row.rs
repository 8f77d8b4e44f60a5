//! Decomposed row types
//!
//! A container is stored as one row per member:
//!
//! | Kind | Key | Payload |
//! |------|-----|---------|
//! | Object | `(container, property_name)` | `(canonical_text?, digest?)` |
//! | Array | `(container, element_index)` | `(canonical_text?, digest?)` |
//!
//! The payload is absent (`member: None`) when a `Null` member was stored
//! as a NULL marker. Nested containers live inside `canonical_text` as
//! canonical sub-documents; they are never exploded into further rows.

use crate::canonical;
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which kind of container a row-set describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    /// JSON object, rows keyed by property name
    Object,
    /// JSON array, rows keyed by element index
    Array,
}

impl ContainerKind {
    /// The empty container of this kind
    pub fn empty_value(self) -> Value {
        match self {
            ContainerKind::Object => Value::object(),
            ContainerKind::Array => Value::array(),
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Object => f.write_str("object"),
            ContainerKind::Array => f.write_str("array"),
        }
    }
}

/// Position of a member inside its container
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// Object property name
    Property(String),
    /// Array element index (dense, 0-based)
    Index(u64),
}

impl Slot {
    /// Container kind this slot belongs to
    pub fn kind(&self) -> ContainerKind {
        match self {
            Slot::Property(_) => ContainerKind::Object,
            Slot::Index(_) => ContainerKind::Array,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Property(name) => write!(f, "{:?}", name),
            Slot::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Canonical text of a member plus its fingerprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Canonical encoding of the member value
    pub canonical: String,
    /// Fingerprint of `canonical`
    pub digest: Fingerprint,
}

impl Member {
    /// Encode and fingerprint a member value
    pub fn encode(value: &Value) -> Result<Self> {
        let canonical = canonical::to_canonical_string(value)?;
        let digest = Fingerprint::of_canonical(canonical.as_bytes());
        Ok(Member { canonical, digest })
    }
}

/// One decomposed row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Fingerprint of the whole container
    pub container: Fingerprint,
    /// Property name or element index
    pub slot: Slot,
    /// Stored member, `None` for a NULL marker
    pub member: Option<Member>,
}

impl Row {
    /// Decode the member value; a NULL marker decodes to `Null`
    pub fn value(&self) -> Result<Value> {
        match &self.member {
            Some(member) => canonical::decode(&member.canonical),
            None => Ok(Value::Null),
        }
    }

    /// Digest of the member, if stored
    pub fn digest(&self) -> Option<&Fingerprint> {
        self.member.as_ref().map(|m| &m.digest)
    }
}
