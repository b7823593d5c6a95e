//! Metro Manila pickup and dropoff points for realistic test fixtures.
//!
//! Coordinates sourced from OpenStreetMap.

use fleet_booking::model::Coordinates;

/// A named location with coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

// ============================================================================
// Warehouses and depots (pickup points)
// ============================================================================

pub const WAREHOUSES: &[Location] = &[
    Location::new("Port Area Container Yard, Manila", 14.5869, 120.9672),
    Location::new("Paco Distribution Center, Manila", 14.5794, 120.9995),
    Location::new("Pasig Logistics Hub, Pasig", 14.5764, 121.0851),
    Location::new("Valenzuela Industrial Park", 14.7011, 120.9830),
];

// ============================================================================
// Retail and market dropoffs
// ============================================================================

pub const DROPOFFS: &[Location] = &[
    Location::new("Divisoria Market, Tondo", 14.6019, 120.9718),
    Location::new("Cubao Market, Quezon City", 14.6199, 121.0536),
    Location::new("Makati Central Business District", 14.5547, 121.0244),
    Location::new("Alabang Town Center, Muntinlupa", 14.4231, 121.0298),
];
