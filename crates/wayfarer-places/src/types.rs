use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use wayfarer_core::ValidationError;

use crate::identity::identity;

/// A place returned by the geocoder.
///
/// Captured as-is from a search result and never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lon: f64, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lat,
            lon,
            country: country.into(),
            state: None,
        }
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Identity key of this place; see [`crate::identity`].
    pub fn identity(&self) -> String {
        identity(self.lat, self.lon)
    }

    /// Reject candidates that cannot be stored.
    ///
    /// # Errors
    /// Returns `ValidationError` for a blank name or a non-finite or
    /// out-of-range coordinate.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        validate_coordinate("latitude", self.lat, 90.0)?;
        validate_coordinate("longitude", self.lon, 180.0)?;
        Ok(())
    }

    /// "Lagos, Lagos State, NG" style label for lists.
    pub fn display_name(&self) -> String {
        match self.state.as_deref().filter(|s| !s.is_empty()) {
            Some(state) => format!("{}, {}, {}", self.name, state, self.country),
            None => format!("{}, {}", self.name, self.country),
        }
    }
}

fn validate_coordinate(axis: &'static str, value: f64, bound: f64) -> Result<(), ValidationError> {
    if value.is_finite() && (-bound..=bound).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCoordinate { axis, value })
    }
}

/// A location the user pinned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavouriteEntry {
    #[serde(flatten)]
    pub location: Location,
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
}

impl FavouriteEntry {
    /// `added_at` is kept to the millisecond, the precision it is stored at.
    pub fn new(location: Location, added_at: DateTime<Utc>) -> Self {
        let id = location.identity();
        Self {
            location,
            id,
            added_at: added_at.trunc_subsecs(3),
        }
    }
}

/// A location picked from search results, with the query that found it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub location: Location,
    pub query: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub searched_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(location: Location, query: impl Into<String>, searched_at: DateTime<Utc>) -> Self {
        Self {
            location,
            query: query.into(),
            searched_at: searched_at.trunc_subsecs(3),
        }
    }
}

/// Common view over persisted collection entries.
pub trait StoredEntry {
    fn location(&self) -> &Location;

    /// Identity key recomputed from the coordinates, never taken from a stored id.
    fn identity(&self) -> String {
        self.location().identity()
    }

    /// Whether an entry read back from storage is usable.
    fn is_valid(&self) -> bool {
        self.location().validate().is_ok()
    }
}

impl StoredEntry for FavouriteEntry {
    fn location(&self) -> &Location {
        &self.location
    }

    fn is_valid(&self) -> bool {
        !self.id.is_empty() && self.location.validate().is_ok()
    }
}

impl StoredEntry for HistoryEntry {
    fn location(&self) -> &Location {
        &self.location
    }
}
