//! Integration tests for the preference stores over real backings.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use wayfarer_places::{
    FileBacking, KeyValueBacking, Location, LocationPreferences, MemoryBacking, PreferenceEvent,
    SqliteBacking, FAVOURITES_KEY, HISTORY_KEY,
};

fn city(name: &str, lat: f64, lon: f64, country: &str) -> Location {
    Location::new(name, lat, lon, country)
}

fn lagos() -> Location {
    city("Lagos", 6.45, 3.39, "NG")
}

#[test]
fn test_lagos_favourite_lifecycle() {
    let prefs = LocationPreferences::with_backing(Arc::new(MemoryBacking::new()), 10, 10);

    let list = prefs.favourites.add(&lagos()).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].id, "6.45-3.39");
    assert!(prefs.favourites.is_favourite(6.45, 3.39));

    let list = prefs.favourites.remove("6.45-3.39");
    assert!(list.is_empty());
    assert!(!prefs.favourites.is_favourite(6.45, 3.39));
}

#[test]
fn test_adding_same_place_twice_is_idempotent() {
    let prefs = LocationPreferences::with_backing(Arc::new(MemoryBacking::new()), 10, 10);

    let first = prefs.favourites.add(&lagos()).unwrap();
    let second = prefs
        .favourites
        .add(&city("Lagos Island", 6.450_000_1, 3.39, "NG"))
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(prefs.favourites.len(), 1);
    assert_eq!(prefs.version(), 1);
}

#[test]
fn test_favourites_cap_keeps_oldest() {
    let prefs = LocationPreferences::with_backing(Arc::new(MemoryBacking::new()), 3, 10);

    for i in 0..5 {
        prefs
            .favourites
            .add(&city(&format!("Town {}", i), i as f64, 0.0, "XX"))
            .unwrap();
    }

    let names: Vec<String> = prefs
        .favourites
        .list()
        .into_iter()
        .map(|f| f.location.name)
        .collect();
    assert_eq!(names, vec!["Town 0", "Town 1", "Town 2"]);
}

#[test]
fn test_history_cap_keeps_newest() {
    let prefs = LocationPreferences::with_backing(Arc::new(MemoryBacking::new()), 10, 3);

    for i in 0..5 {
        prefs
            .history
            .add(&city(&format!("Town {}", i), i as f64, 0.0, "XX"), "town")
            .unwrap();
    }

    let names: Vec<String> = prefs
        .history
        .recent()
        .into_iter()
        .map(|h| h.location.name)
        .collect();
    assert_eq!(names, vec!["Town 4", "Town 3", "Town 2"]);
}

#[test]
fn test_repeat_selection_moves_to_front() {
    let prefs = LocationPreferences::with_backing(Arc::new(MemoryBacking::new()), 10, 10);
    let london = city("London", 51.5073, -0.1276, "GB");

    prefs.select(&lagos(), "lag");
    prefs.select(&london, "lon");
    prefs.select(&lagos(), "lagos");

    let recent = prefs.history.recent();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].location.name, "Lagos");
    assert_eq!(recent[0].query, "lagos");
    assert_eq!(recent[1].location.name, "London");
}

#[test]
fn test_sqlite_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("preferences.db");

    {
        let backing = Arc::new(SqliteBacking::open(&db).unwrap());
        let prefs = LocationPreferences::with_backing(backing, 10, 10);
        prefs.favourites.add(&lagos()).unwrap();
        prefs.select(&city("Paris", 48.8566, 2.3522, "FR"), "par");
    }

    let backing = Arc::new(SqliteBacking::open(&db).unwrap());
    let prefs = LocationPreferences::with_backing(backing, 10, 10);

    assert!(prefs.favourites.is_favourite(6.45, 3.39));
    let history = prefs.history.recent();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].location.name, "Paris");
    assert_eq!(history[0].query, "par");
}

#[test]
fn test_file_round_trip_preserves_timestamps() {
    let dir = tempfile::tempdir().unwrap();

    let added_at = {
        let backing = Arc::new(FileBacking::open(dir.path()).unwrap());
        let prefs = LocationPreferences::with_backing(backing, 10, 10);
        prefs.favourites.add(&lagos()).unwrap()[0].added_at
    };

    let backing = Arc::new(FileBacking::open(dir.path()).unwrap());
    let prefs = LocationPreferences::with_backing(backing, 10, 10);
    let stored = prefs.favourites.get("6.45-3.39").unwrap();

    assert_eq!(stored.added_at.timestamp_millis(), added_at.timestamp_millis());
}

#[test]
fn test_corrupt_data_loads_empty_and_recovers() {
    let backing = Arc::new(MemoryBacking::new());
    backing.set(FAVOURITES_KEY, "{not json").unwrap();
    backing.set(HISTORY_KEY, r#"[{"name": "Lagos"}]"#).unwrap();

    let prefs = LocationPreferences::with_backing(backing.clone(), 10, 10);
    assert!(prefs.favourites.is_empty());
    assert!(prefs.history.is_empty());

    prefs.favourites.add(&lagos()).unwrap();
    let raw = backing.get(FAVOURITES_KEY).unwrap().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed[0]["id"], "6.45-3.39");
    assert_eq!(parsed[0]["name"], "Lagos");
}

#[test]
fn test_stored_layout_is_flat_camel_case() {
    let backing = Arc::new(MemoryBacking::new());
    let prefs = LocationPreferences::with_backing(backing.clone(), 10, 10);
    prefs.select(&lagos().with_state("Lagos"), "lag");

    let raw = backing.get(HISTORY_KEY).unwrap().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &parsed[0];

    assert_eq!(entry["lat"], 6.45);
    assert_eq!(entry["lon"], 3.39);
    assert_eq!(entry["country"], "NG");
    assert_eq!(entry["state"], "Lagos");
    assert_eq!(entry["query"], "lag");
    assert!(entry["searchedAt"].is_i64());
}

#[test]
fn test_failed_write_keeps_session_state() {
    let prefs = LocationPreferences::with_backing(Arc::new(MemoryBacking::with_quota(16)), 10, 10);
    let mut rx = prefs.subscribe();

    let list = prefs.favourites.add(&lagos()).unwrap();

    assert_eq!(list.len(), 1);
    assert!(prefs.favourites.is_favourite(6.45, 3.39));
    assert_eq!(
        rx.try_recv().unwrap(),
        PreferenceEvent::FavouriteAdded {
            id: "6.45-3.39".into()
        }
    );
}

#[test]
fn test_invalid_location_rejected_everywhere() {
    let prefs = LocationPreferences::with_backing(Arc::new(MemoryBacking::new()), 10, 10);
    let bad = city("Nowhere", 91.0, 0.0, "XX");

    assert!(prefs.favourites.add(&bad).is_err());
    assert!(prefs.history.add(&bad, "now").is_err());
    assert!(prefs.favourites.is_empty());
    assert!(prefs.history.is_empty());
}

#[test]
fn test_fifteen_adds_with_default_limits() {
    let prefs = LocationPreferences::with_backing(Arc::new(MemoryBacking::new()), 10, 10);

    for i in 0..15 {
        let place = city(&format!("Town {}", i), i as f64, i as f64, "XX");
        prefs.favourites.add(&place).unwrap();
        prefs.history.add(&place, "town").unwrap();
    }

    let favourites = prefs.favourites.list();
    assert_eq!(favourites.len(), 10);
    assert_eq!(favourites[0].location.name, "Town 0");
    assert_eq!(favourites[9].location.name, "Town 9");

    let history = prefs.history.list();
    assert_eq!(history.len(), 10);
    assert_eq!(history[0].location.name, "Town 5");
    assert_eq!(history[9].location.name, "Town 14");
}

#[test]
fn test_reload_is_element_wise_equal() {
    let backing = Arc::new(SqliteBacking::in_memory().unwrap());
    let prefs = LocationPreferences::with_backing(backing.clone(), 10, 10);
    prefs.favourites.add(&lagos()).unwrap();
    prefs
        .favourites
        .add(&city("Kyiv", 50.4501, 30.5234, "UA").with_state("Kyiv City"))
        .unwrap();
    prefs.select(&lagos(), "lag");

    let reloaded = LocationPreferences::with_backing(backing, 10, 10);

    assert_eq!(reloaded.favourites.list(), prefs.favourites.list());
    assert_eq!(reloaded.history.list(), prefs.history.list());
}

#[test]
fn test_lagos_identity_is_exact() {
    let prefs = LocationPreferences::with_backing(Arc::new(MemoryBacking::new()), 10, 10);
    prefs.favourites.add(&lagos()).unwrap();

    assert!(prefs.favourites.is_favourite(6.45, 3.39));
    assert!(!prefs.favourites.is_favourite(6.46, 3.39));
}

#[test]
fn test_full_precision_coordinates_reload_exactly() {
    let backing = Arc::new(MemoryBacking::new());
    let prefs = LocationPreferences::with_backing(backing.clone(), 10, 10);
    let place = city("Hue", 16.92798086000089, 107.05305064999999, "VN");
    prefs.favourites.add(&place).unwrap();
    prefs.select(&place, "hue");

    let reloaded = LocationPreferences::with_backing(backing, 10, 10);
    let favourite = &reloaded.favourites.list()[0];

    assert_eq!(favourite.location.lat.to_bits(), 16.92798086000089f64.to_bits());
    assert_eq!(favourite.location.lon.to_bits(), 107.05305064999999f64.to_bits());
    assert_eq!(reloaded.favourites.list(), prefs.favourites.list());
    assert_eq!(reloaded.history.list(), prefs.history.list());
}

#[test]
fn test_concurrent_surfaces_keep_invariants() {
    let backing = Arc::new(SqliteBacking::in_memory().unwrap());
    let prefs = Arc::new(LocationPreferences::with_backing(backing.clone(), 10, 10));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let prefs = prefs.clone();
            std::thread::spawn(move || {
                for k in 0..8 {
                    // Neighbouring threads share most of their places
                    let n = (t + k) % 16;
                    let place = city(&format!("Town {}", n), n as f64, n as f64 / 2.0, "XX");
                    prefs.favourites.add(&place).unwrap();
                    prefs.history.add(&place, "town").unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let favourites = prefs.favourites.list();
    let mut ids: Vec<&str> = favourites.iter().map(|f| f.id.as_str()).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), favourites.len());
    assert_eq!(favourites.len(), 10);

    let history = prefs.history.list();
    let mut names: Vec<&str> = history.iter().map(|h| h.location.name.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), history.len());
    assert!(history.len() <= 10);

    let reopened = LocationPreferences::with_backing(backing, 10, 10);
    assert_eq!(reopened.favourites.list(), favourites);
    assert_eq!(reopened.history.list(), history);
}
