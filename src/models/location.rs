//! Location model for geographic coordinates, bounding boxes and distances

use serde::{Deserialize, Serialize};

use crate::{FmiError, Result};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Location coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Display name
    pub name: String,
}

/// Unique id of a config entry for the given coordinates
#[must_use]
pub fn base_unique_id(latitude: f64, longitude: f64) -> String {
    format!("{latitude}_{longitude}")
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{}, {}", self.latitude, self.longitude)
    }

    /// Great-circle distance to another point in kilometers
    #[must_use]
    pub fn distance_km(&self, latitude: f64, longitude: f64) -> f64 {
        haversine::distance(
            haversine::Location {
                latitude: self.latitude,
                longitude: self.longitude,
            },
            haversine::Location {
                latitude,
                longitude,
            },
            haversine::Units::Kilometers,
        )
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Generate cache key for reverse geocoding this location
    #[must_use]
    pub fn cache_key(&self) -> String {
        let (lat, lon) = self.rounded_coordinates(3);
        format!("geocode:{lat:.3}:{lon:.3}")
    }
}

/// Latitude/longitude box in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Box spanning all of Finland and its sea areas
    #[must_use]
    pub fn covering_finland() -> Self {
        Self {
            lat_min: 58.5,
            lon_min: 18.0,
            lat_max: 70.5,
            lon_max: 33.0,
        }
    }

    /// Square box of `half_side_km` around a point
    pub fn around(latitude: f64, longitude: f64, half_side_km: f64) -> Result<Self> {
        if !half_side_km.is_finite() || half_side_km <= 0.0 {
            return Err(FmiError::validation("Bounding box half side must be positive"));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(FmiError::validation(format!("Latitude out of range: {latitude}")));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(FmiError::validation(format!("Longitude out of range: {longitude}")));
        }

        let lat = latitude.to_radians();
        let lon = longitude.to_radians();
        let lat_min = (lat - half_side_km / EARTH_RADIUS_KM).to_degrees();
        let lat_max = (lat + half_side_km / EARTH_RADIUS_KM).to_degrees();
        // Longitude bounds are undefined once the box touches a pole
        if lat_min <= -90.0 || lat_max >= 90.0 {
            return Err(FmiError::validation(format!(
                "Bounding box of {half_side_km} km around {latitude} reaches a pole"
            )));
        }
        // Radius of the parallel at given latitude
        let parallel_radius = EARTH_RADIUS_KM * lat.cos();

        Ok(Self {
            lat_min,
            lat_max,
            lon_min: (lon - half_side_km / parallel_radius).to_degrees(),
            lon_max: (lon + half_side_km / parallel_radius).to_degrees(),
        })
    }

    /// WFS `bbox` parameter value
    #[must_use]
    pub fn to_query(&self) -> String {
        format!(
            "{:.4},{:.4},{:.4},{:.4}",
            self.lon_min, self.lat_min, self.lon_max, self.lat_max
        )
    }
}
