use std::sync::Arc;

use wayfarer_core::{Config, StorageError};

use crate::backing::{open_backing, KeyValueBacking};
use crate::favourites::FavouritesStore;
use crate::history::HistoryStore;
use crate::notify::{ChangeNotifier, PreferenceEvent};
use crate::selection::Selection;
use crate::types::Location;

/// Favourites and history over one shared backing and change feed.
///
/// Cheap to share: wrap in an `Arc` and hand it to every UI surface.
pub struct LocationPreferences {
    pub favourites: FavouritesStore,
    pub history: HistoryStore,
    notifier: Arc<ChangeNotifier>,
}

impl LocationPreferences {
    /// Open the backing named in `config` and load both collections.
    ///
    /// # Errors
    /// Returns `StorageError` if the backing itself can't be opened. Unreadable
    /// collections are not an error; they load empty.
    pub fn open(config: &Config) -> Result<Self, StorageError> {
        let backing = open_backing(&config.storage, &config.config_dir)?;
        Ok(Self::with_backing(
            backing,
            config.preferences.favourites_limit,
            config.preferences.history_limit,
        ))
    }

    pub fn with_backing(
        backing: Arc<dyn KeyValueBacking>,
        favourites_limit: usize,
        history_limit: usize,
    ) -> Self {
        let notifier = Arc::new(ChangeNotifier::new());
        Self {
            favourites: FavouritesStore::open(backing.clone(), favourites_limit, notifier.clone()),
            history: HistoryStore::open(backing, history_limit, notifier.clone()),
            notifier,
        }
    }

    /// Record the pick in history and return where to navigate.
    ///
    /// A malformed location is still handed to navigation but not recorded.
    pub fn select(&self, location: &Location, query: &str) -> Selection {
        if let Err(e) = self.history.add(location, query) {
            tracing::warn!("Not recording '{}' in history: {}", location.name, e);
        }
        Selection::from(location)
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<PreferenceEvent> {
        self.notifier.subscribe()
    }

    /// Bumped on every change to either collection.
    pub fn version(&self) -> u64 {
        self.notifier.version()
    }
}
