//! Row store abstraction
//!
//! This module defines the RowStore trait that decouples the facade from
//! the backend holding decomposed rows. One store holds one container kind
//! (objects or arrays), mirroring the one-table-per-kind relational layout.
//!
//! # Contract
//!
//! - `put_rows` is an idempotent upsert keyed by `(container, slot)`. All
//!   rows of all containers in one call become visible together.
//! - Every container handed to `put_rows` is registered, including empty
//!   ones, so `exists` can tell "stored with zero rows" from "never stored".
//! - Reads return rows ordered by `(container, slot)`.

use crate::error::StoreResult;
use jsonstore_core::{ContainerKind, Decomposed, Fingerprint, Row, RowOrder, Slot};

/// Durable keyed storage for decomposed rows
///
/// Thread safety: all methods must be safe to call concurrently from
/// multiple threads (requires Send + Sync).
pub trait RowStore: Send + Sync {
    /// Container kind held by this store
    fn kind(&self) -> ContainerKind;

    /// Upsert the rows of one or more containers atomically
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::KindMismatch`] if any container is of the
    /// other kind (nothing is written), or a backend error.
    fn put_rows(&self, containers: &[Decomposed]) -> StoreResult<()>;

    /// Rows of one container, ordered by slot; empty when absent
    fn get_rows(&self, container: &Fingerprint) -> StoreResult<Vec<Row>>;

    /// Whether a container was stored, even with zero rows
    fn exists(&self, container: &Fingerprint) -> StoreResult<bool>;

    /// Every row, ordered by container then slot
    fn scan_all_rows(&self) -> StoreResult<Vec<Row>>;

    /// Every stored container fingerprint, ascending
    fn containers(&self) -> StoreResult<Vec<Fingerprint>>;

    /// Every `(container, slot)` whose member has the given digest
    ///
    /// Results are ordered by container then slot.
    fn find_by_value_digest(&self, digest: &Fingerprint) -> StoreResult<Vec<(Fingerprint, Slot)>>;

    /// Total number of rows
    fn row_count(&self) -> StoreResult<usize>;

    /// Number of stored containers
    fn container_count(&self) -> StoreResult<usize> {
        Ok(self.containers()?.len())
    }

    /// Ordering guarantee of [`RowStore::scan_all_rows`]
    fn scan_order(&self) -> RowOrder {
        RowOrder::ByContainer
    }
}

/// Reject containers of the wrong kind before anything is written
pub(crate) fn check_kinds(kind: ContainerKind, containers: &[Decomposed]) -> StoreResult<()> {
    for container in containers {
        if container.kind != kind {
            return Err(crate::StoreError::KindMismatch {
                expected: kind,
                actual: container.kind,
            });
        }
    }
    Ok(())
}
