//! Change notifications for UI surfaces.
//!
//! Every successful mutation bumps a version counter and broadcasts a
//! [`PreferenceEvent`]. Surfaces can either subscribe or poll `version()`.
//! No-op mutations (duplicate add, unknown id) publish nothing.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

/// Events buffered per subscriber before slow receivers start lagging.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceEvent {
    FavouriteAdded { id: String },
    FavouriteRemoved { id: String },
    HistoryRecorded { id: String },
    HistoryCleared,
}

#[derive(Debug)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<PreferenceEvent>,
    version: AtomicU64,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            tx,
            version: AtomicU64::new(0),
        }
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<PreferenceEvent> {
        self.tx.subscribe()
    }

    /// Monotonic count of mutations published so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    pub(crate) fn publish(&self, event: PreferenceEvent) {
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!("Preference change v{}: {:?}", version, event);
        // No subscribers is fine
        let _ = self.tx.send(event);
    }
}
