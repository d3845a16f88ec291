use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use wayfarer_core::StorageError;

use super::KeyValueBacking;

/// One `<key>.json` file per key inside a data directory.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash mid-write leaves the previous value intact.
#[derive(Debug, Clone)]
pub struct FileBacking {
    dir: PathBuf,
}

impl FileBacking {
    /// Use `dir` as the data directory, creating it if needed.
    ///
    /// # Errors
    /// Returns `StorageError::WriteFailed` if the directory can't be created.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).map_err(|e| StorageError::write(dir.display().to_string(), e))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::write(key, "key must be alphanumeric, '-' or '_'"));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueBacking for FileBacking {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::read(key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        fs::write(&tmp, value).map_err(|e| StorageError::write(key, e))?;
        fs::rename(&tmp, &path).map_err(|e| StorageError::write(key, e))?;

        tracing::debug!("Persisted {} bytes to {:?}", value.len(), path);
        Ok(())
    }
}
