//! Great-circle distance filtering for agent candidates.
use serde::{Deserialize, Serialize};

/// Mean earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Haversine distance to `other`, in kilometres.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let d_lat = lat2 - lat1;
        let d_lon = (other.longitude - self.longitude).to_radians();
        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_KM * c
    }
}

/// Anything with a current position.
pub trait Located {
    fn position(&self) -> Option<GeoPoint>;
}

impl Located for crate::db_types::Agent {
    fn position(&self) -> Option<GeoPoint> {
        self.location()
    }
}

impl Located for GeoPoint {
    fn position(&self) -> Option<GeoPoint> {
        Some(*self)
    }
}

/// Keeps the candidates that lie within `radius_km` of `origin`.
///
/// A radius of zero or less means "unbounded" and every candidate is returned, including those without a known
/// position. Otherwise, candidates without a position are dropped, since their distance cannot be established.
/// The relative order of the candidates is preserved.
pub fn within<T: Located>(origin: &GeoPoint, candidates: Vec<T>, radius_km: f64) -> Vec<T> {
    if radius_km <= 0.0 {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|c| c.position().map(|p| origin.distance_km(&p) <= radius_km).unwrap_or(false))
        .collect()
}
