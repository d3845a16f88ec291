//! Saved places for Wayfarer
//!
//! Favourites and search history backed by durable local storage, plus a
//! cached, coalescing location search over the Open-Meteo geocoding API.

pub mod backing;
pub mod codec;
pub mod favourites;
pub mod geocode;
pub mod history;
pub mod identity;
pub mod notify;
pub mod preferences;
pub mod search;
pub mod selection;
pub mod types;

pub use backing::{open_backing, FileBacking, KeyValueBacking, MemoryBacking, SqliteBacking};
pub use codec::{CollectionCodec, FAVOURITES_KEY, HISTORY_KEY};
pub use favourites::FavouritesStore;
pub use geocode::{Geocoder, OpenMeteoGeocoder};
pub use history::HistoryStore;
pub use identity::{identity, identity_of};
pub use notify::{ChangeNotifier, PreferenceEvent};
pub use preferences::LocationPreferences;
pub use search::{SearchLayer, SearchSession, SearchState};
pub use selection::Selection;
pub use types::*;
