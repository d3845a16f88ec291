//! JSON codec for the persisted collections.
//!
//! Reads are all-or-nothing: if the stored array or any entry in it fails to
//! parse or validate, the whole collection is discarded and the store starts
//! empty. There is no schema version field.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wayfarer_core::StorageError;

use crate::backing::KeyValueBacking;
use crate::types::StoredEntry;

/// Backing key for the favourites collection.
pub const FAVOURITES_KEY: &str = "favourites";
/// Backing key for the search history collection.
pub const HISTORY_KEY: &str = "search-history";

/// Typed view of one collection stored under a fixed key.
#[derive(Debug)]
pub struct CollectionCodec<T> {
    key: &'static str,
    _entry: PhantomData<fn() -> T>,
}

impl<T> CollectionCodec<T>
where
    T: Serialize + DeserializeOwned + StoredEntry,
{
    pub fn new(key: &'static str) -> Self {
        Self {
            key,
            _entry: PhantomData,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Serialize entries to a JSON array.
    ///
    /// # Errors
    /// Returns `StorageError::Serialization` if an entry can't be encoded.
    pub fn encode(&self, entries: &[T]) -> Result<String, StorageError> {
        serde_json::to_string(entries).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    /// Parse and validate a stored JSON array.
    ///
    /// # Errors
    /// Returns `StorageError::Corrupt` if the text isn't an array of valid entries.
    pub fn decode(&self, raw: &str) -> Result<Vec<T>, StorageError> {
        let entries: Vec<T> =
            serde_json::from_str(raw).map_err(|e| StorageError::corrupt(self.key, e))?;

        if let Some(index) = entries.iter().position(|entry| !entry.is_valid()) {
            return Err(StorageError::corrupt(
                self.key,
                format!("entry {} failed validation", index),
            ));
        }

        Ok(entries)
    }

    /// Load the collection, degrading to empty on any failure.
    pub fn load(&self, backing: &dyn KeyValueBacking) -> Vec<T> {
        let raw = match backing.get(self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Could not read '{}', starting empty: {}", self.key, e);
                return Vec::new();
            }
        };

        match self.decode(&raw) {
            Ok(entries) => {
                tracing::debug!("Loaded {} entries from '{}'", entries.len(), self.key);
                entries
            }
            Err(e) => {
                tracing::warn!("Discarding stored '{}': {}", self.key, e);
                Vec::new()
            }
        }
    }

    /// Write the collection through to the backing.
    ///
    /// # Errors
    /// Returns the encoding or backing `StorageError`.
    pub fn store(&self, backing: &dyn KeyValueBacking, entries: &[T]) -> Result<(), StorageError> {
        let raw = self.encode(entries)?;
        backing.set(self.key, &raw)
    }
}
