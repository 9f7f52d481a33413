//! Key-value persistence
//!
//! `KeyValueStore` is the seam between the stores and the disk. The
//! production backend is `SqliteKv`, a single SQLite file with one `kv`
//! table. Values are JSON text.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::schema::{init_schema, needs_init};
use crate::config::Config;

/// Namespace holding the record collection
pub const RECORDS_NAMESPACE: &str = "interviews";

/// Key of the whole record collection inside `RECORDS_NAMESPACE`
pub const RECORDS_KEY: &str = "all-interviews";

/// Namespace for small settings-like values
pub const LOCAL_NAMESPACE: &str = "local_storage";

/// Key of the three template slots inside `LOCAL_NAMESPACE`
pub const TEMPLATES_KEY: &str = "work-log-templates";

/// Storage backend addressed by (namespace, key)
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never written
    fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<String>>;

    /// Insert or overwrite a value
    fn put(&self, namespace: &str, key: &str, value: &str) -> StorageResult<()>;
}

/// SQLite-backed key-value store
pub struct SqliteKv {
    conn: Mutex<Connection>,
}

impl SqliteKv {
    /// Open or create the database configured in `config`
    pub fn open(config: &Config) -> StorageResult<Self> {
        Self::open_path(&config.database_path())
    }

    /// Open or create a database file
    pub fn open_path(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::from_create_dir(e, parent.to_path_buf()))?;
        }

        let conn = Connection::open(path)?;

        if needs_init(&conn) {
            init_schema(&conn)?;
        }

        debug!("Opened key-value database at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

impl KeyValueStore for SqliteKv {
    fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE namespace = ? AND key = ?",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> StorageResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO kv (namespace, key, value, updated_at) VALUES (?, ?, ?, ?)",
            params![namespace, key, value, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }
}
