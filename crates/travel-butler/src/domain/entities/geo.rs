//! Geo - Coordinates and great-circle distance

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS-84-ish point (Amap uses GCJ-02; the distance maths is the same)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Parse the `"lon,lat"` string format used by Amap
    pub fn parse_lon_lat(s: &str) -> Option<Self> {
        let (lon, lat) = s.split_once(',')?;
        let lon: f64 = lon.trim().parse().ok()?;
        let lat: f64 = lat.trim().parse().ok()?;
        Some(Self { lat, lon })
    }

    /// `"lon,lat"` with six decimals
    pub fn to_lon_lat(&self) -> String {
        format!("{:.6},{:.6}", self.lon, self.lat)
    }

    /// Haversine distance in metres
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let (lat1, lon1) = (self.lat.to_radians(), self.lon.to_radians());
        let (lat2, lon2) = (other.lat.to_radians(), other.lon.to_radians());
        let dlat = lat2 - lat1;
        let dlon = lon2 - lon1;
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * a.sqrt().asin() * EARTH_RADIUS_M
    }
}
