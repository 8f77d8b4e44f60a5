//! Decomposition of containers into rows
//!
//! A container (object or array) becomes one [`Row`] per member, all keyed
//! by the container's fingerprint. Each row carries the member's canonical
//! text and its own fingerprint, so two containers holding the same member
//! value expose the same member digest.
//!
//! Only one level is flattened: a nested container is stored as the
//! canonical text of the whole sub-document.
//!
//! ## Null members
//!
//! [`NullPolicy::Marker`] stores a `Null` member with no text and no digest;
//! [`NullPolicy::Literal`] stores the `null` token and its digest. Both
//! reconstruct to `Null`, and neither affects the container fingerprint.

use crate::canonical;
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::limits::Limits;
use crate::row::{ContainerKind, Member, Row, Slot};
use crate::value::Value;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// How `Null` members are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NullPolicy {
    /// No canonical text, no digest
    #[default]
    Marker,
    /// Canonical text `null` with its digest
    Literal,
}

/// Rows of one decomposed container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decomposed {
    /// Fingerprint of the whole container
    pub fingerprint: Fingerprint,
    /// Object or array
    pub kind: ContainerKind,
    /// One row per member; array rows are in index order, object rows in
    /// key order
    pub rows: Vec<Row>,
}

/// Rows of several containers, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecomposedBatch {
    /// Decomposed containers, one per input value
    pub containers: Vec<Decomposed>,
}

impl DecomposedBatch {
    /// Container fingerprints, in input order
    pub fn fingerprints(&self) -> Vec<Fingerprint> {
        self.containers.iter().map(|c| c.fingerprint).collect()
    }

    /// All rows, grouped per container in input order
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.containers.iter().flat_map(|c| c.rows.iter())
    }
}

/// Splits containers into rows
///
/// Stateless apart from its settings; safe to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Decomposer {
    null_policy: NullPolicy,
    limits: Limits,
}

impl Decomposer {
    /// Decomposer with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the null policy
    pub fn with_null_policy(mut self, null_policy: NullPolicy) -> Self {
        self.null_policy = null_policy;
        self
    }

    /// Set the size limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Configured null policy
    pub fn null_policy(&self) -> NullPolicy {
        self.null_policy
    }

    /// Configured limits
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Decompose one container
    ///
    /// # Errors
    ///
    /// - [`Error::NotAContainer`] for scalars
    /// - [`Error::Limit`] when the value exceeds the configured limits
    /// - [`Error::Encoding`] when any member has no canonical form
    pub fn decompose(&self, value: &Value) -> Result<Decomposed> {
        let kind = value
            .container_kind()
            .ok_or_else(|| Error::NotAContainer(value.type_name()))?;
        self.limits.validate_value(value)?;

        let encoded = canonical::encode(value)?;
        self.limits.validate_document_size(encoded.len())?;
        let fingerprint = Fingerprint::of_canonical(&encoded);

        let rows = match value {
            Value::Object(map) => map
                .iter()
                .map(|(name, member)| self.row(fingerprint, Slot::Property(name.clone()), member))
                .collect::<Result<Vec<_>>>()?,
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, member)| self.row(fingerprint, Slot::Index(i as u64), member))
                .collect::<Result<Vec<_>>>()?,
            _ => unreachable!("container_kind() returned Some for a scalar"),
        };

        Ok(Decomposed {
            fingerprint,
            kind,
            rows,
        })
    }

    fn row(&self, container: Fingerprint, slot: Slot, member: &Value) -> Result<Row> {
        let member = match (member, self.null_policy) {
            (Value::Null, NullPolicy::Marker) => None,
            _ => Some(Member::encode(member)?),
        };
        Ok(Row {
            container,
            slot,
            member,
        })
    }

    /// Decompose several containers
    ///
    /// Values are decomposed in parallel; results keep input order. Any
    /// failing value fails the whole batch. No deduplication happens beyond
    /// equal values getting equal fingerprints.
    pub fn decompose_batch(&self, values: &[Value]) -> Result<DecomposedBatch> {
        let containers = values
            .par_iter()
            .map(|v| self.decompose(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(DecomposedBatch { containers })
    }
}

/// Decompose one container with default settings
pub fn decompose(value: &Value) -> Result<Decomposed> {
    Decomposer::new().decompose(value)
}

/// Decompose several containers with default settings
pub fn decompose_batch(values: &[Value]) -> Result<DecomposedBatch> {
    Decomposer::new().decompose_batch(values)
}
