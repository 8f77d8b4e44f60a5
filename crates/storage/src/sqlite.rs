//! SqliteRowStore: relational row store on SQLite
//!
//! One table per container kind:
//!
//! ```sql
//! -- objects                                -- arrays
//! fingerprint      TEXT NOT NULL            fingerprint    TEXT NOT NULL
//! property_name    TEXT NOT NULL            element_index  INTEGER NOT NULL
//! property_json    TEXT                     element_json   TEXT
//! property_digest  TEXT                     element_digest TEXT
//! PRIMARY KEY (fingerprint, property_name)  PRIMARY KEY (fingerprint, element_index)
//! ```
//!
//! plus two companion tables:
//! - `<table>_containers`: registry of stored fingerprints (empty containers
//!   have no rows, so existence cannot be derived from the row table)
//! - `<table>_meta`: hash algorithm and container kind; a table written with
//!   another algorithm is refused at open time
//!
//! Digests are stored as 64 lowercase hex characters. `NULL` json and
//! digest columns are NULL markers. A row with json text but no digest
//! (written by an external tool) gets its digest recomputed on read.
//!
//! Writes use `INSERT OR REPLACE` inside one transaction per `put_rows`.

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Params};
use tracing::{debug, info};

use jsonstore_core::{
    canonicalize_text, ContainerKind, Decomposed, Fingerprint, Member, Row, Slot, HASH_ALGORITHM,
};

use crate::error::{validate_table_name, StoreError, StoreResult};
use crate::traits::{check_kinds, RowStore};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQL text for one table, built once at open time
#[derive(Debug)]
struct Statements {
    upsert: String,
    register: String,
    select_rows: String,
    exists: String,
    scan: String,
    containers: String,
    by_digest: String,
    count_rows: String,
    count_containers: String,
}

impl Statements {
    fn new(kind: ContainerKind, t: &str) -> Self {
        let (slot, json, digest) = columns(kind);
        Statements {
            upsert: format!(
                "INSERT OR REPLACE INTO {t} (fingerprint, {slot}, {json}, {digest}) VALUES (?1, ?2, ?3, ?4)"
            ),
            register: format!("INSERT OR IGNORE INTO {t}_containers (fingerprint) VALUES (?1)"),
            select_rows: format!(
                "SELECT fingerprint, {slot}, {json}, {digest} FROM {t} WHERE fingerprint = ?1 ORDER BY {slot}"
            ),
            exists: format!(
                "SELECT EXISTS(SELECT 1 FROM {t}_containers WHERE fingerprint = ?1) \
                 OR EXISTS(SELECT 1 FROM {t} WHERE fingerprint = ?1)"
            ),
            scan: format!(
                "SELECT fingerprint, {slot}, {json}, {digest} FROM {t} ORDER BY fingerprint, {slot}"
            ),
            containers: format!(
                "SELECT fingerprint FROM {t}_containers UNION SELECT fingerprint FROM {t} ORDER BY fingerprint"
            ),
            by_digest: format!(
                "SELECT fingerprint, {slot} FROM {t} WHERE {digest} = ?1 ORDER BY fingerprint, {slot}"
            ),
            count_rows: format!("SELECT COUNT(*) FROM {t}"),
            count_containers: format!(
                "SELECT COUNT(*) FROM (SELECT fingerprint FROM {t}_containers UNION SELECT fingerprint FROM {t})"
            ),
        }
    }
}

fn columns(kind: ContainerKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        ContainerKind::Object => ("property_name", "property_json", "property_digest"),
        ContainerKind::Array => ("element_index", "element_json", "element_digest"),
    }
}

fn create_schema(conn: &Connection, kind: ContainerKind, t: &str) -> StoreResult<()> {
    let (slot, json, digest) = columns(kind);
    let slot_type = match kind {
        ContainerKind::Object => "TEXT",
        ContainerKind::Array => "INTEGER",
    };
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {t} (
            fingerprint TEXT NOT NULL,
            {slot} {slot_type} NOT NULL,
            {json} TEXT,
            {digest} TEXT,
            PRIMARY KEY (fingerprint, {slot})
        );
        CREATE INDEX IF NOT EXISTS idx_{t}_digest ON {t}({digest});
        CREATE TABLE IF NOT EXISTS {t}_containers (
            fingerprint TEXT PRIMARY KEY NOT NULL
        );
        CREATE TABLE IF NOT EXISTS {t}_meta (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        );"
    ))?;

    let expected = [
        ("hash_algorithm", HASH_ALGORITHM.to_string()),
        ("container_kind", kind.to_string()),
    ];
    for (key, value) in expected {
        conn.execute(
            &format!("INSERT OR IGNORE INTO {t}_meta (key, value) VALUES (?1, ?2)"),
            params![key, value],
        )?;
        let stored: String = conn.query_row(
            &format!("SELECT value FROM {t}_meta WHERE key = ?1"),
            params![key],
            |r| r.get(0),
        )?;
        if stored != value {
            return Err(StoreError::FormatMismatch {
                key: key.to_string(),
                stored,
                expected: value,
            });
        }
    }
    Ok(())
}

enum RawSlot {
    Name(String),
    Index(i64),
}

type RawRow = (String, RawSlot, Option<String>, Option<String>);

fn parse_fingerprint(hex: &str) -> StoreResult<Fingerprint> {
    hex.parse()
        .map_err(|e| StoreError::CorruptRow(format!("fingerprint {:?}: {}", hex, e)))
}

fn parse_index(index: i64) -> StoreResult<u64> {
    u64::try_from(index).map_err(|_| StoreError::CorruptRow(format!("negative element index {}", index)))
}

fn convert_row((container, slot, json, digest): RawRow) -> StoreResult<Row> {
    let container = parse_fingerprint(&container)?;
    let slot = match slot {
        RawSlot::Name(name) => Slot::Property(name),
        RawSlot::Index(index) => Slot::Index(parse_index(index)?),
    };
    let member = match (json, digest) {
        (Some(canonical), Some(digest)) => Some(Member {
            canonical,
            digest: parse_fingerprint(&digest)?,
        }),
        (Some(text), None) => {
            let canonical = canonicalize_text(&text)
                .map_err(|e| StoreError::CorruptRow(format!("member text {:?}: {}", text, e)))?;
            let digest = Fingerprint::of_canonical(canonical.as_bytes());
            Some(Member { canonical, digest })
        }
        (None, _) => None,
    };
    Ok(Row {
        container,
        slot,
        member,
    })
}

/// SQLite-backed row store for one container kind
#[derive(Debug)]
pub struct SqliteRowStore {
    kind: ContainerKind,
    table: String,
    conn: Mutex<Connection>,
    sql: Statements,
}

impl SqliteRowStore {
    /// Open (creating if needed) a database file
    pub fn open(path: impl AsRef<Path>, kind: ContainerKind, table: &str) -> StoreResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        info!(
            target: "jsonstore::sqlite",
            path = %path.display(),
            table,
            kind = %kind,
            "Opening row store"
        );
        Self::from_connection(conn, kind, table)
    }

    /// Open a private in-memory database
    pub fn open_in_memory(kind: ContainerKind, table: &str) -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, kind, table)
    }

    /// Use an existing connection, creating the tables if needed
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidTableName`] for names that are not SQL identifiers
    /// - [`StoreError::FormatMismatch`] if the table was written with another
    ///   hash algorithm or holds the other container kind
    pub fn from_connection(conn: Connection, kind: ContainerKind, table: &str) -> StoreResult<Self> {
        validate_table_name(table)?;
        create_schema(&conn, kind, table)?;
        Ok(Self {
            kind,
            table: table.to_string(),
            conn: Mutex::new(conn),
            sql: Statements::new(kind, table),
        })
    }

    /// Name of the row table
    pub fn table_name(&self) -> &str {
        &self.table
    }

    fn query_rows<P: Params>(&self, conn: &Connection, sql: &str, params: P) -> StoreResult<Vec<Row>> {
        let kind = self.kind;
        let mut stmt = conn.prepare_cached(sql)?;
        let raw = stmt
            .query_map(params, |r| {
                let slot = match kind {
                    ContainerKind::Object => RawSlot::Name(r.get(1)?),
                    ContainerKind::Array => RawSlot::Index(r.get(1)?),
                };
                Ok((r.get(0)?, slot, r.get(2)?, r.get(3)?))
            })?
            .collect::<rusqlite::Result<Vec<RawRow>>>()?;
        raw.into_iter().map(convert_row).collect()
    }

    fn count(&self, sql: &str) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(sql, [], |r| r.get(0))?;
        Ok(n as usize)
    }
}

impl RowStore for SqliteRowStore {
    fn kind(&self) -> ContainerKind {
        self.kind
    }

    fn put_rows(&self, containers: &[Decomposed]) -> StoreResult<()> {
        check_kinds(self.kind, containers)?;

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut written = 0usize;
        {
            let mut register = tx.prepare_cached(&self.sql.register)?;
            let mut upsert = tx.prepare_cached(&self.sql.upsert)?;
            for container in containers {
                let hex = container.fingerprint.to_hex();
                register.execute(params![hex])?;
                for row in &container.rows {
                    let (json, digest) = match &row.member {
                        Some(m) => (Some(m.canonical.as_str()), Some(m.digest.to_hex())),
                        None => (None, None),
                    };
                    match &row.slot {
                        Slot::Property(name) => upsert.execute(params![hex, name, json, digest])?,
                        Slot::Index(index) => {
                            let index = i64::try_from(*index).map_err(|_| {
                                StoreError::CorruptRow(format!("element index {} out of range", index))
                            })?;
                            upsert.execute(params![hex, index, json, digest])?
                        }
                    };
                    written += 1;
                }
            }
        }
        tx.commit()?;
        debug!(
            target: "jsonstore::sqlite",
            table = %self.table,
            containers = containers.len(),
            rows = written,
            "put rows"
        );
        Ok(())
    }

    fn get_rows(&self, container: &Fingerprint) -> StoreResult<Vec<Row>> {
        let conn = self.conn.lock();
        self.query_rows(&conn, &self.sql.select_rows, params![container.to_hex()])
    }

    fn exists(&self, container: &Fingerprint) -> StoreResult<bool> {
        let conn = self.conn.lock();
        let found: Option<bool> = conn
            .query_row(&self.sql.exists, params![container.to_hex()], |r| r.get(0))
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    fn scan_all_rows(&self) -> StoreResult<Vec<Row>> {
        let conn = self.conn.lock();
        self.query_rows(&conn, &self.sql.scan, [])
    }

    fn containers(&self) -> StoreResult<Vec<Fingerprint>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&self.sql.containers)?;
        let hexes = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        hexes.iter().map(|h| parse_fingerprint(h)).collect()
    }

    fn find_by_value_digest(&self, digest: &Fingerprint) -> StoreResult<Vec<(Fingerprint, Slot)>> {
        let kind = self.kind;
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(&self.sql.by_digest)?;
        let raw = stmt
            .query_map(params![digest.to_hex()], |r| {
                let slot = match kind {
                    ContainerKind::Object => RawSlot::Name(r.get(1)?),
                    ContainerKind::Array => RawSlot::Index(r.get(1)?),
                };
                Ok((r.get::<_, String>(0)?, slot))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        raw.into_iter()
            .map(|(hex, slot)| {
                let slot = match slot {
                    RawSlot::Name(name) => Slot::Property(name),
                    RawSlot::Index(index) => Slot::Index(parse_index(index)?),
                };
                Ok((parse_fingerprint(&hex)?, slot))
            })
            .collect()
    }

    fn row_count(&self) -> StoreResult<usize> {
        self.count(&self.sql.count_rows)
    }

    fn container_count(&self) -> StoreResult<usize> {
        self.count(&self.sql.count_containers)
    }
}
