//! MemoryRowStore: in-process row store with BTreeMap and RwLock
//!
//! This module implements the RowStore trait using:
//! - `BTreeMap<(Fingerprint, Slot), Option<Member>>` for rows ordered by
//!   container then slot
//! - `BTreeSet<Fingerprint>` as the container registry
//! - `parking_lot::RwLock` for thread-safe access
//!
//! # Design Notes
//!
//! - **Atomic batches**: rows and registry entries of one `put_rows` call
//!   are applied under a single write lock, so readers never observe a
//!   partially written container
//! - **Upsert**: writing an existing `(container, slot)` replaces the member;
//!   slots not re-supplied are left untouched

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use parking_lot::RwLock;
use tracing::debug;

use jsonstore_core::{ContainerKind, Decomposed, Fingerprint, Member, Row, Slot};

use crate::error::StoreResult;
use crate::traits::{check_kinds, RowStore};

#[derive(Debug, Default)]
struct Inner {
    rows: BTreeMap<(Fingerprint, Slot), Option<Member>>,
    containers: BTreeSet<Fingerprint>,
}

/// In-memory row store for one container kind
#[derive(Debug)]
pub struct MemoryRowStore {
    kind: ContainerKind,
    inner: RwLock<Inner>,
}

impl MemoryRowStore {
    /// Create an empty store for the given kind
    pub fn new(kind: ContainerKind) -> Self {
        Self {
            kind,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Create an empty object store
    pub fn objects() -> Self {
        Self::new(ContainerKind::Object)
    }

    /// Create an empty array store
    pub fn arrays() -> Self {
        Self::new(ContainerKind::Array)
    }
}

fn to_row(key: &(Fingerprint, Slot), member: &Option<Member>) -> Row {
    Row {
        container: key.0,
        slot: key.1.clone(),
        member: member.clone(),
    }
}

impl RowStore for MemoryRowStore {
    fn kind(&self) -> ContainerKind {
        self.kind
    }

    fn put_rows(&self, containers: &[Decomposed]) -> StoreResult<()> {
        check_kinds(self.kind, containers)?;

        let mut inner = self.inner.write();
        let mut written = 0usize;
        for container in containers {
            inner.containers.insert(container.fingerprint);
            for row in &container.rows {
                inner
                    .rows
                    .insert((row.container, row.slot.clone()), row.member.clone());
                written += 1;
            }
        }
        debug!(
            target: "jsonstore::memory",
            kind = %self.kind,
            containers = containers.len(),
            rows = written,
            "put rows"
        );
        Ok(())
    }

    fn get_rows(&self, container: &Fingerprint) -> StoreResult<Vec<Row>> {
        let inner = self.inner.read();
        // Property("") is the smallest slot
        let start = (*container, Slot::Property(String::new()));
        Ok(inner
            .rows
            .range((Bound::Included(start), Bound::Unbounded))
            .take_while(|((fp, _), _)| fp == container)
            .map(|(key, member)| to_row(key, member))
            .collect())
    }

    fn exists(&self, container: &Fingerprint) -> StoreResult<bool> {
        Ok(self.inner.read().containers.contains(container))
    }

    fn scan_all_rows(&self) -> StoreResult<Vec<Row>> {
        let inner = self.inner.read();
        Ok(inner
            .rows
            .iter()
            .map(|(key, member)| to_row(key, member))
            .collect())
    }

    fn containers(&self) -> StoreResult<Vec<Fingerprint>> {
        Ok(self.inner.read().containers.iter().copied().collect())
    }

    fn find_by_value_digest(&self, digest: &Fingerprint) -> StoreResult<Vec<(Fingerprint, Slot)>> {
        let inner = self.inner.read();
        Ok(inner
            .rows
            .iter()
            .filter(|(_, member)| member.as_ref().map(|m| &m.digest) == Some(digest))
            .map(|((fp, slot), _)| (*fp, slot.clone()))
            .collect())
    }

    fn row_count(&self) -> StoreResult<usize> {
        Ok(self.inner.read().rows.len())
    }

    fn container_count(&self) -> StoreResult<usize> {
        Ok(self.inner.read().containers.len())
    }
}
