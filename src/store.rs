//! Durable key-value store for generated images
//!
//! Uses parameterized queries exclusively. Entries are written with
//! `INSERT OR REPLACE`, so repeated puts for one key leave a single row.

use crate::error::{AssetError, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// One cached image, keyed by the composite asset key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub id: String,
    pub blob: Bytes,
    pub date: DateTime<Utc>,
}

impl CacheEntry {
    /// New entry stamped with the current time
    pub fn new(id: &str, blob: Vec<u8>) -> Self {
        Self::from_bytes(id, Bytes::from(blob))
    }

    /// New entry sharing an existing payload
    pub fn from_bytes(id: &str, blob: Bytes) -> Self {
        Self {
            id: id.to_string(),
            blob,
            date: Utc::now(),
        }
    }
}

/// Blocking key-value store backing the durable tier
///
/// Implementations must be thread-safe; the cache calls them from
/// `spawn_blocking` workers.
pub trait DurableStore: Send + Sync {
    /// Look up an entry by key
    fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    /// Insert or replace an entry
    fn put(&self, entry: &CacheEntry) -> Result<()>;

    /// Number of stored entries
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

/// Opens the durable store; run at most once per cache
pub trait StoreOpener: Send + Sync {
    fn open(&self) -> Result<Arc<dyn DurableStore>>;
}

/// Initialize the store schema
///
/// Creates the `assets` table if it doesn't exist.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS assets (
            id TEXT PRIMARY KEY,
            blob BLOB NOT NULL,
            date TEXT NOT NULL
        );
        ",
    )?;

    log::debug!("Asset store schema initialized");
    Ok(())
}

/// SQLite-backed durable store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the store file and set up the schema
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                log::info!("Created directory: {}", parent.display());
            }
        }

        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        log::info!("Opened asset store: {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Store that lives only as long as this value
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AssetError::StoreUnavailable("store lock poisoned".to_string()))
    }
}

impl DurableStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT id, blob, date FROM assets WHERE id = ?1",
                params![key],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Vec<u8>>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        Ok(row.map(|(id, blob, date)| {
            // A malformed date does not make the blob unusable
            let date = DateTime::parse_from_rfc3339(&date)
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(|e| {
                    log::warn!("Invalid date for cached asset {}: {}", id, e);
                    DateTime::<Utc>::UNIX_EPOCH
                });
            CacheEntry {
                id,
                blob: Bytes::from(blob),
                date,
            }
        }))
    }

    fn put(&self, entry: &CacheEntry) -> Result<()> {
        let blob: &[u8] = &entry.blob;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO assets (id, blob, date) VALUES (?1, ?2, ?3)",
            params![&entry.id, blob, entry.date.to_rfc3339()],
        )?;
        log::debug!("Stored asset {} ({} bytes)", entry.id, entry.blob.len());
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM assets", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Opens a [`SqliteStore`] at a fixed path
pub struct SqliteOpener {
    path: PathBuf,
}

impl SqliteOpener {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StoreOpener for SqliteOpener {
    fn open(&self) -> Result<Arc<dyn DurableStore>> {
        Ok(Arc::new(SqliteStore::open(&self.path)?))
    }
}

/// Reports the durable tier as absent in this environment
pub struct DisabledOpener;

impl StoreOpener for DisabledOpener {
    fn open(&self) -> Result<Arc<dyn DurableStore>> {
        Err(AssetError::StoreUnavailable(
            "no durable store configured".to_string(),
        ))
    }
}
