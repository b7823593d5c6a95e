//! Great-circle route estimate (fallback when OSRM is unavailable).
//!
//! Ignores roads entirely, so distances come out short, but it needs no
//! network and never fails.

use crate::model::{Coordinates, RouteEstimate, RouteSource};
use crate::traits::RouteEstimator;

/// Average driving speed assumption for duration estimates.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone)]
pub struct HaversineEstimator {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineEstimator {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineEstimator {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Great-circle distance between two points in kilometers.
    pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
        let lat1 = from.lat.to_radians();
        let lat2 = to.lat.to_radians();
        let delta_lat = (to.lat - from.lat).to_radians();
        let delta_lng = (to.lng - from.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    pub fn route(&self, from: Coordinates, to: Coordinates) -> RouteEstimate {
        let distance_km = Self::distance_km(from, to);
        RouteEstimate {
            distance_km,
            duration_minutes: self.minutes_for(distance_km),
            source: RouteSource::Haversine,
        }
    }

    fn minutes_for(&self, km: f64) -> f64 {
        if self.speed_kmh <= 0.0 {
            return 0.0;
        }
        km / self.speed_kmh * 60.0
    }
}

impl RouteEstimator for HaversineEstimator {
    fn estimate(&self, from: Coordinates, to: Coordinates) -> Option<RouteEstimate> {
        Some(self.route(from, to))
    }
}
