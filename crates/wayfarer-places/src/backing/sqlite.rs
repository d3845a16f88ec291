//! SQLite-based durable backing.

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use wayfarer_core::{RusqliteErrorExt, StorageError};

use super::KeyValueBacking;

/// Key-value table in a local SQLite database.
pub struct SqliteBacking {
    conn: Mutex<Connection>,
}

impl SqliteBacking {
    /// Open or create the database at the given path.
    ///
    /// # Errors
    /// Returns `StorageError` if the file can't be opened or the schema created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::write(path.display().to_string(), e))?;
        }
        let conn = Connection::open(path).map_err(|e| StorageError::read("kv", e))?;
        Self::with_connection(conn)
    }

    /// Create an in-memory database (for testing).
    ///
    /// # Errors
    /// Returns `StorageError` if the schema can't be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| StorageError::read("kv", e))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        let backing = Self {
            conn: Mutex::new(conn),
        };
        backing.init_schema()?;
        Ok(backing)
    }

    fn init_schema(&self) -> Result<(), StorageError> {
        self.conn
            .lock()
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                "#,
            )
            .map_err(|e| e.into_storage_error("kv"))
    }
}

impl KeyValueBacking for SqliteBacking {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.conn
            .lock()
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| StorageError::read(key, e))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let updated_at = Utc::now().to_rfc3339();
        self.conn
            .lock()
            .execute(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
                params![key, value, updated_at],
            )
            .map_err(|e| e.into_storage_error(key))?;

        tracing::debug!("Persisted {} bytes under '{}'", value.len(), key);
        Ok(())
    }
}
