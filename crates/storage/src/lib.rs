//! Row store backends for decomposed JSON containers
//!
//! This crate implements the RowStore trait with:
//! - MemoryRowStore: BTreeMap-based storage with RwLock
//! - SqliteRowStore: one relational table per container kind (feature `sqlite`)
//!
//! Both keep a container registry next to the rows so that containers
//! stored with zero rows (`{}` and `[]`) still exist.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod traits;

pub use error::{validate_table_name, StoreError, StoreResult};
pub use memory::MemoryRowStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRowStore;
pub use traits::RowStore;
