use std::collections::HashMap;

use parking_lot::Mutex;
use wayfarer_core::StorageError;

use super::KeyValueBacking;

/// Process-local backing, used in tests and as the `memory` backend.
///
/// An optional byte quota mimics a browser storage limit: a write that would
/// push the total size of all values past the quota fails with
/// `StorageError::QuotaExceeded` and leaves the previous value in place.
#[derive(Debug, Default)]
pub struct MemoryBacking {
    values: Mutex<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBacking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl KeyValueBacking for MemoryBacking {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock();

        if let Some(quota) = self.quota_bytes {
            let used: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            let available = quota.saturating_sub(used);
            if value.len() > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    available,
                });
            }
        }

        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    #[test]
    fn test_get_missing_key() {
        let backing = MemoryBacking::new();
        assert!(backing.get("favourites").unwrap().is_none());
        assert!(backing.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let backing = MemoryBacking::new();
        backing.set("favourites", "[]").unwrap();
        backing.set("favourites", "[1]").unwrap();
        assert_eq!(backing.get("favourites").unwrap().as_deref(), Some("[1]"));
        assert_eq!(backing.len(), 1);
    }

    #[test]
    fn test_quota_rejects_oversized_write() {
        let backing = MemoryBacking::with_quota(8);
        backing.set("a", "1234").unwrap();

        let err = backing.set("b", "123456").unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded { needed: 6, available: 4, .. }
        ));
        assert!(backing.get("b").unwrap().is_none());
    }

    #[test]
    fn test_quota_counts_replaced_value_once() {
        let backing = MemoryBacking::with_quota(8);
        backing.set("a", "12345678").unwrap();
        backing.set("a", "87654321").unwrap();
        assert_eq!(backing.get("a").unwrap().as_deref(), Some("87654321"));
    }
}
