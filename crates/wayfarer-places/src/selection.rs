//! Hand-off from search to navigation.
//!
//! A picked result travels as `lat|lon|name|country`, either as a string (the
//! search list item value) or as a [`Selection`]. A `|` or `%` inside the
//! name or country is percent-encoded so the tuple always has four fields.

use std::fmt;
use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use wayfarer_core::ValidationError;

use crate::types::Location;

/// Characters escaped inside one `|`-separated field.
const TUPLE_FIELD: &AsciiSet = &CONTROLS.add(b'|').add(b'%');

/// Characters escaped in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub country: String,
}

impl Selection {
    /// City page route, e.g. `/city/New%20York?lat=40.7128&lon=-74.006`.
    pub fn route_path(&self) -> String {
        format!(
            "/city/{}?lat={}&lon={}",
            utf8_percent_encode(&self.name, PATH_SEGMENT),
            self.lat,
            self.lon
        )
    }

    /// The picked place, without the optional region.
    pub fn to_location(&self) -> Location {
        Location::new(self.name.clone(), self.lat, self.lon, self.country.clone())
    }
}

impl From<&Location> for Selection {
    fn from(location: &Location) -> Self {
        Self {
            lat: location.lat,
            lon: location.lon,
            name: location.name.clone(),
            country: location.country.clone(),
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}",
            self.lat,
            self.lon,
            utf8_percent_encode(&self.name, TUPLE_FIELD),
            utf8_percent_encode(&self.country, TUPLE_FIELD)
        )
    }
}

impl FromStr for Selection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ValidationError::MalformedSelection(s.to_string());

        let mut parts = s.split('|');
        let (Some(lat), Some(lon), Some(name), Some(country), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(malformed());
        };

        let lat: f64 = lat.trim().parse().map_err(|_| malformed())?;
        let lon: f64 = lon.trim().parse().map_err(|_| malformed())?;
        let decode = |field: &str| {
            percent_decode_str(field)
                .decode_utf8()
                .map(|text| text.into_owned())
                .map_err(|_| malformed())
        };

        let selection = Selection {
            lat,
            lon,
            name: decode(name)?,
            country: decode(country)?,
        };
        selection.to_location().validate()?;
        Ok(selection)
    }
}
