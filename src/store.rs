//! Container stores: insert and retrieve JSON containers by fingerprint
//!
//! ## Design: STATELESS FACADE
//!
//! A [`ContainerStore`] holds a [`Decomposer`] and an `Arc<dyn RowStore>`.
//! No caches, no maps, no locks. All data lives in the row store.
//!
//! - `insert` = decompose, then `put_rows` as one atomic batch
//! - `retrieve` = `exists`, then `get_rows`, then reconstruct
//! - `retrieve_all` = one ordered scan, grouped by sort-merge
//!
//! [`ObjectStore`] and [`ArrayStore`] pin the container kind;
//! [`JsonStore`] pairs one of each and routes by kind.
//!
//! ## Thread Safety
//!
//! All stores are `Send + Sync` and can be shared across threads.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
#[cfg(feature = "sqlite")]
use std::path::Path;
use std::sync::Arc;

use jsonstore_core::{
    fingerprint, reconstruct_all, reconstruct_known, ContainerKind, Decomposer, Error,
    Fingerprint, Result, Row, Slot, Value,
};
use jsonstore_storage::{MemoryRowStore, RowStore};
#[cfg(feature = "sqlite")]
use jsonstore_storage::SqliteRowStore;
use tracing::{debug, info};

#[cfg(feature = "sqlite")]
use crate::config::CONFIG_FILE_NAME;
use crate::config::StoreConfig;

/// Database file name placed in the data directory by [`JsonStore::open_dir`].
#[cfg(feature = "sqlite")]
pub const DATABASE_FILE_NAME: &str = "jsonstore.db";

/// Content-addressed store for one container kind
#[derive(Clone)]
pub struct ContainerStore {
    kind: ContainerKind,
    rows: Arc<dyn RowStore>,
    decomposer: Decomposer,
}

impl fmt::Debug for ContainerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerStore")
            .field("kind", &self.kind)
            .field("decomposer", &self.decomposer)
            .finish_non_exhaustive()
    }
}

impl ContainerStore {
    /// Wrap a row store, taking the null policy and limits from `config`
    pub fn new(rows: Arc<dyn RowStore>, config: &StoreConfig) -> Self {
        let decomposer = Decomposer::new()
            .with_null_policy(config.null_policy)
            .with_limits(config.limits.clone());
        Self {
            kind: rows.kind(),
            rows,
            decomposer,
        }
    }

    /// Container kind held by this store
    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// The underlying row store
    pub fn row_store(&self) -> &Arc<dyn RowStore> {
        &self.rows
    }

    fn check_kind(&self, value: &Value) -> Result<()> {
        match value.container_kind() {
            None => Err(Error::NotAContainer(value.type_name())),
            Some(actual) if actual != self.kind => Err(Error::WrongContainerKind {
                expected: self.kind,
                actual,
            }),
            Some(_) => Ok(()),
        }
    }

    /// Store a container, returning its fingerprint
    ///
    /// Inserting an equal value again writes the same rows and returns the
    /// same fingerprint.
    ///
    /// # Errors
    ///
    /// - [`Error::NotAContainer`] for scalars
    /// - [`Error::WrongContainerKind`] for the other container kind
    /// - [`Error::Encoding`] / [`Error::Limit`] for unstorable values
    pub fn insert(&self, value: &Value) -> Result<Fingerprint> {
        self.check_kind(value)?;
        let decomposed = self.decomposer.decompose(value)?;
        self.rows.put_rows(std::slice::from_ref(&decomposed))?;
        debug!(
            target: "jsonstore::store",
            kind = %self.kind,
            fingerprint = %decomposed.fingerprint,
            rows = decomposed.rows.len(),
            "inserted container"
        );
        Ok(decomposed.fingerprint)
    }

    /// Store several containers in one atomic write
    ///
    /// Fingerprints are returned in input order. If any value fails to
    /// decompose, nothing is written.
    pub fn insert_batch(&self, values: &[Value]) -> Result<Vec<Fingerprint>> {
        for value in values {
            self.check_kind(value)?;
        }
        let batch = self.decomposer.decompose_batch(values)?;
        self.rows.put_rows(&batch.containers)?;
        info!(
            target: "jsonstore::store",
            kind = %self.kind,
            containers = batch.containers.len(),
            "inserted batch"
        );
        Ok(batch.fingerprints())
    }

    /// Rebuild a stored container
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] when the fingerprint was never stored
    /// - integrity errors ([`Error::is_integrity`]) when its rows are
    ///   inconsistent
    pub fn retrieve(&self, container: &Fingerprint) -> Result<Value> {
        if !self.rows.exists(container)? {
            return Err(Error::NotFound(*container));
        }
        let rows = self.rows.get_rows(container)?;
        reconstruct_known(self.kind, container, &rows)
    }

    /// Rebuild a container, or `None` when it was never stored
    pub fn get(&self, container: &Fingerprint) -> Result<Option<Value>> {
        match self.retrieve(container) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Every stored container with its fingerprint, ascending by fingerprint
    ///
    /// Fails on the first inconsistent container.
    pub fn retrieve_entries(&self) -> Result<Vec<(Fingerprint, Value)>> {
        let rows = self.rows.scan_all_rows()?;
        let mut entries: BTreeMap<Fingerprint, Value> =
            reconstruct_all(self.kind, rows, self.rows.scan_order())?
                .into_iter()
                .collect();

        // Containers without rows never show up in the scan
        for container in self.rows.containers()? {
            if !entries.contains_key(&container) {
                let value = reconstruct_known(self.kind, &container, &[])?;
                entries.insert(container, value);
            }
        }
        Ok(entries.into_iter().collect())
    }

    /// Every stored container, ascending by fingerprint
    pub fn retrieve_all(&self) -> Result<Vec<Value>> {
        Ok(self
            .retrieve_entries()?
            .into_iter()
            .map(|(_, value)| value)
            .collect())
    }

    /// Whether a container is stored
    pub fn exists(&self, container: &Fingerprint) -> Result<bool> {
        Ok(self.rows.exists(container)?)
    }

    /// Stored rows of one container, ordered by slot
    pub fn rows(&self, container: &Fingerprint) -> Result<Vec<Row>> {
        Ok(self.rows.get_rows(container)?)
    }

    /// Every `(container, slot)` holding a member with the given digest
    pub fn find_by_value_digest(&self, digest: &Fingerprint) -> Result<Vec<(Fingerprint, Slot)>> {
        Ok(self.rows.find_by_value_digest(digest)?)
    }

    /// Every `(container, slot)` holding a member equal to `value`
    pub fn find_by_value(&self, value: &Value) -> Result<Vec<(Fingerprint, Slot)>> {
        self.find_by_value_digest(&fingerprint(value)?)
    }

    /// Number of stored containers
    pub fn len(&self) -> Result<usize> {
        Ok(self.rows.container_count()?)
    }

    /// Whether no container is stored
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Total number of stored rows
    pub fn row_count(&self) -> Result<usize> {
        Ok(self.rows.row_count()?)
    }
}

macro_rules! kind_store {
    ($(#[$doc:meta])* $name:ident, $kind:expr, $table:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            inner: ContainerStore,
        }

        impl $name {
            /// Container kind held by this store
            pub const KIND: ContainerKind = $kind;

            /// Wrap a row store of the matching kind
            ///
            /// # Errors
            ///
            /// [`Error::WrongContainerKind`] if `rows` holds the other kind.
            pub fn with_rows(rows: Arc<dyn RowStore>, config: &StoreConfig) -> Result<Self> {
                if rows.kind() != Self::KIND {
                    return Err(Error::WrongContainerKind {
                        expected: Self::KIND,
                        actual: rows.kind(),
                    });
                }
                Ok(Self {
                    inner: ContainerStore::new(rows, config),
                })
            }

            /// Store backed by process memory
            pub fn in_memory(config: &StoreConfig) -> Self {
                Self {
                    inner: ContainerStore::new(Arc::new(MemoryRowStore::new(Self::KIND)), config),
                }
            }

            /// Store backed by a SQLite file, using the configured table
            #[cfg(feature = "sqlite")]
            pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
                config.validate()?;
                let rows = SqliteRowStore::open(path, Self::KIND, &config.$table)?;
                Self::with_rows(Arc::new(rows), config)
            }

            /// Store backed by a private in-memory SQLite database
            #[cfg(feature = "sqlite")]
            pub fn open_in_memory(config: &StoreConfig) -> Result<Self> {
                config.validate()?;
                let rows = SqliteRowStore::open_in_memory(Self::KIND, &config.$table)?;
                Self::with_rows(Arc::new(rows), config)
            }
        }

        impl Deref for $name {
            type Target = ContainerStore;

            fn deref(&self) -> &ContainerStore {
                &self.inner
            }
        }
    };
}

kind_store!(
    /// Content-addressed store for JSON objects
    ///
    /// One row per property, keyed by `(fingerprint, property_name)`.
    ObjectStore,
    ContainerKind::Object,
    object_table
);

kind_store!(
    /// Content-addressed store for JSON arrays
    ///
    /// One row per element, keyed by `(fingerprint, element_index)`.
    ArrayStore,
    ContainerKind::Array,
    array_table
);

/// An object store and an array store side by side
///
/// Values are routed by container kind. The two kinds never share a
/// fingerprint, since their canonical forms start with different bytes.
#[derive(Debug, Clone)]
pub struct JsonStore {
    objects: ObjectStore,
    arrays: ArrayStore,
}

impl JsonStore {
    /// Pair existing stores
    pub fn new(objects: ObjectStore, arrays: ArrayStore) -> Self {
        Self { objects, arrays }
    }

    /// Both stores in process memory
    pub fn in_memory(config: &StoreConfig) -> Self {
        Self::new(ObjectStore::in_memory(config), ArrayStore::in_memory(config))
    }

    /// Both stores in one SQLite file, one table each
    #[cfg(feature = "sqlite")]
    pub fn open(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self::new(
            ObjectStore::open(path, config)?,
            ArrayStore::open(path, config)?,
        ))
    }

    /// Open a data directory, creating it and a default `jsonstore.toml`
    /// on first use
    #[cfg(feature = "sqlite")]
    pub fn open_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| {
            Error::Storage(format!(
                "Failed to create data directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        let config_path = dir.join(CONFIG_FILE_NAME);
        StoreConfig::write_default_if_missing(&config_path)?;
        let config = StoreConfig::from_file(&config_path)?;
        info!(
            target: "jsonstore::store",
            dir = %dir.display(),
            object_table = %config.object_table,
            array_table = %config.array_table,
            "Opening data directory"
        );
        Self::open(dir.join(DATABASE_FILE_NAME), &config)
    }

    /// The object store
    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// The array store
    pub fn arrays(&self) -> &ArrayStore {
        &self.arrays
    }

    fn store_for(&self, value: &Value) -> Result<&ContainerStore> {
        match value.container_kind() {
            Some(ContainerKind::Object) => Ok(&self.objects),
            Some(ContainerKind::Array) => Ok(&self.arrays),
            None => Err(Error::NotAContainer(value.type_name())),
        }
    }

    /// Store an object or array, returning its fingerprint
    pub fn insert(&self, value: &Value) -> Result<Fingerprint> {
        self.store_for(value)?.insert(value)
    }

    /// Store several containers, returning fingerprints in input order
    ///
    /// Objects and arrays are written as one batch per kind; the two
    /// batches are not atomic with respect to each other. A scalar anywhere
    /// in `values` fails the call before anything is written.
    pub fn insert_batch(&self, values: &[Value]) -> Result<Vec<Fingerprint>> {
        let mut objects = Vec::new();
        let mut arrays = Vec::new();
        for (i, value) in values.iter().enumerate() {
            match value.container_kind() {
                Some(ContainerKind::Object) => objects.push(i),
                Some(ContainerKind::Array) => arrays.push(i),
                None => return Err(Error::NotAContainer(value.type_name())),
            }
        }

        let mut out = vec![None; values.len()];
        for (store, positions) in [(&*self.objects, objects), (&*self.arrays, arrays)] {
            if positions.is_empty() {
                continue;
            }
            let batch: Vec<Value> = positions.iter().map(|&i| values[i].clone()).collect();
            for (i, fp) in positions.into_iter().zip(store.insert_batch(&batch)?) {
                out[i] = Some(fp);
            }
        }
        Ok(out.into_iter().flatten().collect())
    }

    /// Rebuild a stored object or array
    pub fn retrieve(&self, container: &Fingerprint) -> Result<Value> {
        if self.objects.exists(container)? {
            return self.objects.retrieve(container);
        }
        if self.arrays.exists(container)? {
            return self.arrays.retrieve(container);
        }
        Err(Error::NotFound(*container))
    }

    /// Whether a container of either kind is stored
    pub fn exists(&self, container: &Fingerprint) -> Result<bool> {
        Ok(self.objects.exists(container)? || self.arrays.exists(container)?)
    }

    /// Every stored container of both kinds, ascending by fingerprint
    pub fn retrieve_entries(&self) -> Result<Vec<(Fingerprint, Value)>> {
        let mut entries = self.objects.retrieve_entries()?;
        entries.extend(self.arrays.retrieve_entries()?);
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }

    /// Every stored container of both kinds, ascending by fingerprint
    pub fn retrieve_all(&self) -> Result<Vec<Value>> {
        Ok(self
            .retrieve_entries()?
            .into_iter()
            .map(|(_, value)| value)
            .collect())
    }

    /// Number of stored containers of both kinds
    pub fn len(&self) -> Result<usize> {
        Ok(self.objects.len()? + self.arrays.len()?)
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
