//! Durable key-value backing for the preference stores.
//!
//! Each collection lives under its own key, so no cross-key atomicity is
//! needed. Implementations are synchronous and only fail on I/O, quota or
//! serialization problems; callers treat every failure as non-fatal.

mod file;
mod memory;
mod sqlite;

use std::path::Path;
use std::sync::Arc;

use wayfarer_core::{StorageBackend, StorageConfig, StorageError};

pub use file::FileBacking;
pub use memory::MemoryBacking;
pub use sqlite::SqliteBacking;

/// String-keyed persistence primitive shared by the whole process.
pub trait KeyValueBacking: Send + Sync {
    /// Read the raw value stored under `key`, or `None` if never written.
    ///
    /// # Errors
    /// Returns `StorageError::ReadFailed` if the underlying store can't be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    /// Returns `StorageError::WriteFailed` or `StorageError::QuotaExceeded`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Open the backing selected in configuration.
///
/// # Errors
/// Returns a `StorageError` if the database or data directory can't be opened.
pub fn open_backing(
    config: &StorageConfig,
    config_dir: &Path,
) -> Result<Arc<dyn KeyValueBacking>, StorageError> {
    let backing: Arc<dyn KeyValueBacking> = match config.backend {
        StorageBackend::Sqlite => {
            let path = config.database_path(config_dir);
            tracing::info!("Opening SQLite backing at {}", path.display());
            Arc::new(SqliteBacking::open(&path)?)
        }
        StorageBackend::File => {
            let dir = config.data_path(config_dir);
            tracing::info!("Opening file backing in {}", dir.display());
            Arc::new(FileBacking::open(&dir)?)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory backing; saved places will not persist");
            Arc::new(MemoryBacking::new())
        }
    };
    Ok(backing)
}
