//! Location identity keys.
//!
//! Two locations are the same place iff their keys are equal, regardless of
//! how the geocoder spelled the name or country. Coordinates are rounded to
//! [`IDENTITY_PRECISION`] decimal places first so float noise between two
//! lookups of the same city does not create a second entry.

use crate::types::Location;

/// Decimal places kept when deriving a key (roughly 11 m at the equator).
pub const IDENTITY_PRECISION: i32 = 4;

/// Deterministic identity key for a coordinate pair, e.g. `"6.45-3.39"`.
pub fn identity(lat: f64, lon: f64) -> String {
    format!("{}-{}", round_coordinate(lat), round_coordinate(lon))
}

pub fn identity_of(location: &Location) -> String {
    identity(location.lat, location.lon)
}

fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(IDENTITY_PRECISION);
    let rounded = (value * scale).round() / scale;
    // -0.0 would otherwise print as "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
