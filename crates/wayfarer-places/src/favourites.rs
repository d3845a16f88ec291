//! Favourites: user-pinned places.
//!
//! The in-memory list is authoritative while the process runs; every
//! mutation writes it through to the backing on a best-effort basis. If the
//! write fails the cache still changes and the failure is only logged.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use wayfarer_core::ValidationError;

use crate::backing::KeyValueBacking;
use crate::codec::{CollectionCodec, FAVOURITES_KEY};
use crate::identity::identity;
use crate::notify::{ChangeNotifier, PreferenceEvent};
use crate::types::{FavouriteEntry, Location, StoredEntry};

/// Default cap on pinned places.
pub const DEFAULT_FAVOURITES_LIMIT: usize = 10;

pub struct FavouritesStore {
    backing: Arc<dyn KeyValueBacking>,
    codec: CollectionCodec<FavouriteEntry>,
    entries: Mutex<Vec<FavouriteEntry>>,
    limit: usize,
    notifier: Arc<ChangeNotifier>,
}

impl FavouritesStore {
    /// Load favourites from the backing. Unreadable data yields an empty list.
    pub fn open(
        backing: Arc<dyn KeyValueBacking>,
        limit: usize,
        notifier: Arc<ChangeNotifier>,
    ) -> Self {
        let codec = CollectionCodec::new(FAVOURITES_KEY);
        let entries = normalize(codec.load(backing.as_ref()), limit);
        tracing::info!("Loaded {} favourites", entries.len());

        Self {
            backing,
            codec,
            entries: Mutex::new(entries),
            limit,
            notifier,
        }
    }

    /// Current favourites in insertion order.
    pub fn list(&self) -> Vec<FavouriteEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<FavouriteEntry> {
        self.entries.lock().iter().find(|e| e.id == id).cloned()
    }

    /// Pin a place.
    ///
    /// Adding a place that is already pinned returns the list unchanged and
    /// keeps the original `added_at`. When the list is full the new entry is
    /// dropped, so the oldest favourites always survive.
    ///
    /// # Errors
    /// Returns `ValidationError` for a malformed candidate; nothing changes.
    pub fn add(&self, candidate: &Location) -> Result<Vec<FavouriteEntry>, ValidationError> {
        candidate.validate()?;
        let mut entries = self.entries.lock();
        self.insert_locked(&mut entries, candidate);
        Ok(entries.clone())
    }

    /// Unpin by id. Unknown ids leave the list unchanged.
    pub fn remove(&self, id: &str) -> Vec<FavouriteEntry> {
        let mut entries = self.entries.lock();
        self.remove_locked(&mut entries, id);
        entries.clone()
    }

    /// Remove the place if pinned, pin it otherwise.
    ///
    /// # Errors
    /// Returns `ValidationError` when pinning a malformed candidate.
    pub fn toggle(&self, location: &Location) -> Result<Vec<FavouriteEntry>, ValidationError> {
        let key = location.identity();
        let mut entries = self.entries.lock();

        let existing = entries
            .iter()
            .find(|e| e.identity() == key)
            .map(|e| e.id.clone());

        match existing {
            Some(id) => self.remove_locked(&mut entries, &id),
            None => {
                location.validate()?;
                self.insert_locked(&mut entries, location);
            }
        }
        Ok(entries.clone())
    }

    pub fn is_favourite(&self, lat: f64, lon: f64) -> bool {
        let key = identity(lat, lon);
        self.entries.lock().iter().any(|e| e.identity() == key)
    }

    fn insert_locked(&self, entries: &mut Vec<FavouriteEntry>, candidate: &Location) {
        let key = candidate.identity();

        if entries.iter().any(|e| e.identity() == key) {
            tracing::debug!("{} is already a favourite", key);
            return;
        }

        let before = entries.len();
        entries.push(FavouriteEntry::new(candidate.clone(), Utc::now()));
        entries.truncate(self.limit);

        if entries.len() == before {
            tracing::debug!("Favourites full ({}), {} not added", self.limit, key);
            return;
        }

        self.persist(entries);
        tracing::info!("Added favourite {} ({})", candidate.name, key);
        self.notifier.publish(PreferenceEvent::FavouriteAdded { id: key });
    }

    fn remove_locked(&self, entries: &mut Vec<FavouriteEntry>, id: &str) {
        let before = entries.len();
        entries.retain(|e| e.id != id);
        self.persist(entries);

        if entries.len() < before {
            tracing::info!("Removed favourite {}", id);
            self.notifier.publish(PreferenceEvent::FavouriteRemoved { id: id.to_string() });
        } else {
            tracing::debug!("Favourite {} not found", id);
        }
    }

    fn persist(&self, entries: &[FavouriteEntry]) {
        if let Err(e) = self.codec.store(self.backing.as_ref(), entries) {
            tracing::warn!("Favourites not persisted: {}", e);
        }
    }
}

/// Enforce the invariants on data read from disk: first occurrence wins, capped.
fn normalize(entries: Vec<FavouriteEntry>, limit: usize) -> Vec<FavouriteEntry> {
    let mut seen = HashSet::new();
    let mut out: Vec<FavouriteEntry> = entries
        .into_iter()
        .filter(|e| seen.insert(e.identity()))
        .collect();
    out.truncate(limit);
    out
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::backing::MemoryBacking;

    fn city(n: usize) -> Location {
        Location::new(format!("City {}", n), n as f64, n as f64 / 2.0, "XX")
    }

    fn lagos() -> Location {
        Location::new("Lagos", 6.45, 3.39, "NG")
    }

    fn create_test_store() -> (FavouritesStore, Arc<MemoryBacking>, Arc<ChangeNotifier>) {
        let backing = Arc::new(MemoryBacking::new());
        let notifier = Arc::new(ChangeNotifier::new());
        let store = FavouritesStore::open(
            backing.clone(),
            DEFAULT_FAVOURITES_LIMIT,
            notifier.clone(),
        );
        (store, backing, notifier)
    }

    #[test]
    fn test_add_and_query() {
        let (store, _, _) = create_test_store();

        let list = store.add(&lagos()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].id, "6.45-3.39");
        assert_eq!(list[0].location.name, "Lagos");

        assert!(store.is_favourite(6.45, 3.39));
        assert!(!store.is_favourite(6.46, 3.39));
    }

    #[test]
    fn test_add_is_idempotent_and_keeps_first_timestamp() {
        let (store, _, notifier) = create_test_store();

        let first = store.add(&lagos()).unwrap();
        let renamed = Location::new("Lagos Island", 6.45, 3.39, "Nigeria");
        let second = store.add(&renamed).unwrap();

        assert_eq!(first, second);
        assert_eq!(second[0].added_at, first[0].added_at);
        assert_eq!(second[0].location.name, "Lagos");
        assert_eq!(notifier.version(), 1);
    }

    #[test]
    fn test_cap_keeps_oldest() {
        let (store, _, _) = create_test_store();

        for n in 0..15 {
            store.add(&city(n)).unwrap();
        }

        let list = store.list();
        assert_eq!(list.len(), DEFAULT_FAVOURITES_LIMIT);
        let names: Vec<_> = list.iter().map(|e| e.location.name.clone()).collect();
        let expected: Vec<_> = (0..10).map(|n| format!("City {}", n)).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_full_list_publishes_nothing() {
        let (store, _, notifier) = create_test_store();
        for n in 0..10 {
            store.add(&city(n)).unwrap();
        }
        let version = notifier.version();

        store.add(&city(42)).unwrap();
        assert_eq!(notifier.version(), version);
        assert!(!store.is_favourite(42.0, 21.0));
    }

    #[test]
    fn test_remove() {
        let (store, _, _) = create_test_store();
        store.add(&lagos()).unwrap();
        store.add(&city(1)).unwrap();

        let list = store.remove("6.45-3.39");
        assert_eq!(list.len(), 1);
        assert!(!store.is_favourite(6.45, 3.39));
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let (store, _, notifier) = create_test_store();
        store.add(&lagos()).unwrap();

        let list = store.remove("0-0");
        assert_eq!(list.len(), 1);
        assert_eq!(notifier.version(), 1);
    }

    #[test]
    fn test_toggle() {
        let (store, _, _) = create_test_store();

        store.toggle(&lagos()).unwrap();
        assert!(store.is_favourite(6.45, 3.39));

        store.toggle(&lagos()).unwrap();
        assert!(!store.is_favourite(6.45, 3.39));
    }

    #[test]
    fn test_concurrent_toggles_alternate() {
        let (store, _, notifier) = create_test_store();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.toggle(&lagos()).unwrap())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Every toggle flipped the state, so an even count ends unpinned
        assert!(!store.is_favourite(6.45, 3.39));
        assert_eq!(notifier.version(), 8);
    }

    #[test]
    fn test_invalid_candidate_rejected() {
        let (store, _, notifier) = create_test_store();

        let err = store.add(&Location::new("", 6.45, 3.39, "NG")).unwrap_err();
        assert_eq!(err, ValidationError::EmptyName);
        assert!(store.is_empty());
        assert_eq!(notifier.version(), 0);
    }

    #[test]
    fn test_write_failure_still_updates_cache() {
        let backing = Arc::new(MemoryBacking::with_quota(0));
        let store = FavouritesStore::open(
            backing.clone(),
            DEFAULT_FAVOURITES_LIMIT,
            Arc::new(ChangeNotifier::new()),
        );

        let list = store.add(&lagos()).unwrap();
        assert_eq!(list.len(), 1);
        assert!(store.is_favourite(6.45, 3.39));
        assert!(backing.get(FAVOURITES_KEY).unwrap().is_none());
    }

    #[test]
    fn test_reopen_restores_list() {
        let (store, backing, _) = create_test_store();
        store.add(&lagos()).unwrap();
        store.add(&city(3)).unwrap();

        let reopened = FavouritesStore::open(
            backing,
            DEFAULT_FAVOURITES_LIMIT,
            Arc::new(ChangeNotifier::new()),
        );
        assert_eq!(reopened.list(), store.list());
    }

    #[test]
    fn test_open_collapses_stored_duplicates() {
        let backing = Arc::new(MemoryBacking::new());
        let at = Utc::now();
        let stored = vec![
            FavouriteEntry::new(lagos(), at),
            FavouriteEntry::new(Location::new("Lagos again", 6.450000001, 3.39, "NG"), at),
        ];
        CollectionCodec::new(FAVOURITES_KEY)
            .store(backing.as_ref(), &stored)
            .unwrap();

        let store = FavouritesStore::open(backing, 10, Arc::new(ChangeNotifier::new()));
        assert_eq!(store.len(), 1);
        assert_eq!(store.list()[0].location.name, "Lagos");
    }
}
