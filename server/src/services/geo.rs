//! Static location-to-coordinate table and great-circle distance.

use std::collections::HashMap;

/// Mean Earth radius in kilometres; distances and radii share this unit.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_km(*self, *other)
    }
}

const DEFAULT_LOCATIONS: [(&str, Coordinates); 5] = [
    ("new york, ny", Coordinates::new(40.7128, -74.0060)),
    ("brooklyn, ny", Coordinates::new(40.6782, -73.9442)),
    ("manhattan, ny", Coordinates::new(40.7831, -73.9712)),
    ("queens, ny", Coordinates::new(40.7282, -73.7949)),
    ("bronx, ny", Coordinates::new(40.8448, -73.8648)),
];

/// Read-only mapping from location names to coordinates.
///
/// Keys are stored lower-cased and matched exactly against the lower-cased
/// event location, so `"Brooklyn, NY"` hits `"brooklyn, ny"` but
/// `"Brooklyn"` does not.
#[derive(Debug, Clone)]
pub struct GeoLookup {
    entries: HashMap<String, Coordinates>,
}

impl GeoLookup {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Coordinates)>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|(name, coords)| (name.as_ref().to_lowercase(), coords))
            .collect();
        Self { entries }
    }

    pub fn coordinates_for(&self, location: &str) -> Option<Coordinates> {
        self.entries.get(&location.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for GeoLookup {
    fn default() -> Self {
        Self::new(DEFAULT_LOCATIONS)
    }
}

/// Great-circle distance between two points on a sphere of radius
/// [`EARTH_RADIUS_KM`]. NaN inputs yield NaN.
pub fn haversine_km(from: Coordinates, to: Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + from.lat.to_radians().cos() * to.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
