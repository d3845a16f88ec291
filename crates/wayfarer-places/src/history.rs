//! Search history: places picked from search results.
//!
//! Stored oldest to newest. Re-selecting a place moves it to the end instead
//! of duplicating it, and the oldest entries fall off once the cap is hit.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use wayfarer_core::ValidationError;

use crate::backing::KeyValueBacking;
use crate::codec::{CollectionCodec, HISTORY_KEY};
use crate::notify::{ChangeNotifier, PreferenceEvent};
use crate::types::{HistoryEntry, Location, StoredEntry};

/// Default cap on remembered searches.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

pub struct HistoryStore {
    backing: Arc<dyn KeyValueBacking>,
    codec: CollectionCodec<HistoryEntry>,
    entries: Mutex<Vec<HistoryEntry>>,
    limit: usize,
    notifier: Arc<ChangeNotifier>,
}

impl HistoryStore {
    /// Load history from the backing. Unreadable data yields an empty list.
    pub fn open(
        backing: Arc<dyn KeyValueBacking>,
        limit: usize,
        notifier: Arc<ChangeNotifier>,
    ) -> Self {
        let codec = CollectionCodec::new(HISTORY_KEY);
        let mut entries = codec.load(backing.as_ref());
        collapse(&mut entries, limit);
        tracing::info!("Loaded {} history entries", entries.len());

        Self {
            backing,
            codec,
            entries: Mutex::new(entries),
            limit,
            notifier,
        }
    }

    /// History in storage order, oldest first.
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.entries.lock().clone()
    }

    /// History for display, most recent first.
    pub fn recent(&self) -> Vec<HistoryEntry> {
        self.entries.lock().iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Record a selection made from the results of `query`.
    ///
    /// # Errors
    /// Returns `ValidationError` for a malformed candidate; nothing changes.
    pub fn add(
        &self,
        candidate: &Location,
        query: &str,
    ) -> Result<Vec<HistoryEntry>, ValidationError> {
        candidate.validate()?;

        let mut entries = self.entries.lock();
        entries.push(HistoryEntry::new(candidate.clone(), query, Utc::now()));
        collapse(&mut entries, self.limit);

        self.persist(&entries);
        let key = candidate.identity();
        tracing::info!("Recorded search '{}' -> {} ({})", query, candidate.name, key);
        self.notifier.publish(PreferenceEvent::HistoryRecorded { id: key });
        Ok(entries.clone())
    }

    /// Forget every entry. Irreversible.
    pub fn clear(&self) -> Vec<HistoryEntry> {
        let mut entries = self.entries.lock();
        entries.clear();
        self.persist(&entries);

        tracing::info!("Search history cleared");
        self.notifier.publish(PreferenceEvent::HistoryCleared);
        Vec::new()
    }

    fn persist(&self, entries: &[HistoryEntry]) {
        if let Err(e) = self.codec.store(self.backing.as_ref(), entries) {
            tracing::warn!("Search history not persisted: {}", e);
        }
    }
}

/// Keep only the latest occurrence of each place, then drop the oldest past `limit`.
fn collapse(entries: &mut Vec<HistoryEntry>, limit: usize) {
    let mut seen = HashSet::new();
    let mut kept: Vec<HistoryEntry> = entries
        .drain(..)
        .rev()
        .filter(|e| seen.insert(e.identity()))
        .collect();
    kept.reverse();

    let excess = kept.len().saturating_sub(limit);
    kept.drain(..excess);
    *entries = kept;
}
