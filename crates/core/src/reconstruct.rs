//! Reconstruction of containers from rows
//!
//! The exact inverse of [`crate::decompose`]: member text is decoded with
//! the general JSON parser and reassembled by slot. Row-sets are validated,
//! never repaired:
//!
//! - an empty row-set is [`Error::EmptyContainer`] unless the caller knows
//!   the container exists ([`reconstruct_known`]);
//! - array indices must form a dense `0..n` run, otherwise
//!   [`Error::CorruptIndexSequence`];
//! - rows of another container, slots of the other kind and repeated
//!   property names are [`Error::CorruptRow`].

use crate::error::{Error, Result};
use crate::fingerprint::{fingerprint, Fingerprint};
use crate::row::{ContainerKind, Row, Slot};
use crate::value::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Ordering guarantee of a row stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Rows of one container are contiguous and containers ascend by
    /// fingerprint
    ByContainer,
    /// No ordering guarantee; rows are sorted before grouping
    Unordered,
}

/// Rebuild one container from its rows
///
/// # Errors
///
/// See the module documentation.
pub fn reconstruct(kind: ContainerKind, container: &Fingerprint, rows: &[Row]) -> Result<Value> {
    match kind {
        ContainerKind::Object => reconstruct_object(container, rows),
        ContainerKind::Array => reconstruct_array(container, rows),
    }
}

/// Rebuild a container the store reports as existing
///
/// Zero rows are accepted only when `container` is the fingerprint of the
/// empty container of `kind`; any other fingerprint with zero rows has lost
/// its rows and fails with [`Error::EmptyContainer`].
pub fn reconstruct_known(
    kind: ContainerKind,
    container: &Fingerprint,
    rows: &[Row],
) -> Result<Value> {
    if rows.is_empty() {
        let empty = kind.empty_value();
        if fingerprint(&empty)? == *container {
            return Ok(empty);
        }
        return Err(Error::EmptyContainer(*container));
    }
    reconstruct(kind, container, rows)
}

fn check_row(kind: ContainerKind, container: &Fingerprint, row: &Row) -> Result<()> {
    if row.container != *container {
        return Err(Error::CorruptRow {
            fingerprint: *container,
            reason: format!("row belongs to container {}", row.container),
        });
    }
    if row.slot.kind() != kind {
        return Err(Error::CorruptRow {
            fingerprint: *container,
            reason: format!("{} slot {} in an {}", row.slot.kind(), row.slot, kind),
        });
    }
    Ok(())
}

/// Rebuild an object from property rows
pub fn reconstruct_object(container: &Fingerprint, rows: &[Row]) -> Result<Value> {
    if rows.is_empty() {
        return Err(Error::EmptyContainer(*container));
    }
    let mut map = BTreeMap::new();
    for row in rows {
        check_row(ContainerKind::Object, container, row)?;
        let Slot::Property(name) = &row.slot else {
            unreachable!("check_row accepted a non-property slot");
        };
        match map.entry(name.clone()) {
            Entry::Occupied(_) => {
                return Err(Error::CorruptRow {
                    fingerprint: *container,
                    reason: format!("duplicate property {:?}", name),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(row.value()?);
            }
        }
    }
    Ok(Value::Object(map))
}

/// Rebuild an array from element rows
///
/// Rows may arrive in any order; they are sorted by index first.
pub fn reconstruct_array(container: &Fingerprint, rows: &[Row]) -> Result<Value> {
    if rows.is_empty() {
        return Err(Error::EmptyContainer(*container));
    }
    let mut indexed = Vec::with_capacity(rows.len());
    for row in rows {
        check_row(ContainerKind::Array, container, row)?;
        let Slot::Index(index) = row.slot else {
            unreachable!("check_row accepted a non-index slot");
        };
        indexed.push((index, row));
    }
    indexed.sort_by_key(|(index, _)| *index);

    let mut items = Vec::with_capacity(indexed.len());
    for (expected, (index, row)) in indexed.into_iter().enumerate() {
        let expected = expected as u64;
        if index != expected {
            let reason = if index < expected {
                format!("duplicate index {}", index)
            } else {
                format!("missing index {} (next is {})", expected, index)
            };
            return Err(Error::CorruptIndexSequence {
                fingerprint: *container,
                reason,
            });
        }
        items.push(row.value()?);
    }
    Ok(Value::Array(items))
}

/// Group a row stream by container
///
/// With [`RowOrder::ByContainer`] this is a single sort-merge pass; a
/// stream that turns out not to be ordered fails with
/// [`Error::CorruptRow`]. With [`RowOrder::Unordered`] rows are sorted
/// first.
pub fn group_by_container(
    mut rows: Vec<Row>,
    order: RowOrder,
) -> Result<Vec<(Fingerprint, Vec<Row>)>> {
    if order == RowOrder::Unordered {
        rows.sort_by(|a, b| a.container.cmp(&b.container));
    }

    let mut groups: Vec<(Fingerprint, Vec<Row>)> = Vec::new();
    for row in rows {
        if let Some((current, group)) = groups.last_mut() {
            if *current == row.container {
                group.push(row);
                continue;
            }
            if *current > row.container {
                return Err(Error::CorruptRow {
                    fingerprint: row.container,
                    reason: format!("row stream not ordered by container (after {})", current),
                });
            }
        }
        groups.push((row.container, vec![row]));
    }
    Ok(groups)
}

/// Rebuild every container in a row stream
///
/// Results ascend by fingerprint. Containers with no rows cannot appear in
/// a row stream; callers holding an existence registry add them.
pub fn reconstruct_all(
    kind: ContainerKind,
    rows: Vec<Row>,
    order: RowOrder,
) -> Result<Vec<(Fingerprint, Value)>> {
    group_by_container(rows, order)?
        .into_iter()
        .map(|(container, group)| {
            reconstruct(kind, &container, &group).map(|value| (container, value))
        })
        .collect()
}
