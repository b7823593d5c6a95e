//! Test fixtures for fleet-booking.
//!
//! Provides a fleet builder backed by an in-memory store and a fixed clock,
//! plus request builders and real Metro Manila locations.

#![allow(dead_code)]

pub mod metro_manila_locations;

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use fleet_booking::model::{Booking, BookingId, ClientId, Driver, Helper, LicenseTier, Truck, TruckId, TruckType};
use fleet_booking::rates::RateRecord;
use fleet_booking::traits::FixedClock;
use fleet_booking::validation::{BookingRequest, StopRequest};
use fleet_booking::{BookingEngine, EngineConfig, FleetStore};

pub use metro_manila_locations::*;

pub const CLIENT: &str = "client-acme";

/// Fixed "now" every test starts from.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap()
}

/// A time `hours` after [`now`].
pub fn hours_from_now(hours: i64) -> DateTime<Utc> {
    now() + Duration::hours(hours)
}

pub struct Fleet {
    pub store: Arc<FleetStore>,
    pub clock: Arc<FixedClock>,
}

impl Fleet {
    pub fn new() -> Self {
        let clock = Arc::new(FixedClock::new(now()));
        let store = Arc::new(FleetStore::with_clock(clock.clone()));
        Self { store, clock }
    }

    /// A truck allocated to [`CLIENT`].
    pub fn truck(self, id: &str, truck_type: TruckType, capacity: f64) -> Self {
        self.truck_for(CLIENT, id, truck_type, capacity)
    }

    pub fn truck_for(self, client: &str, id: &str, truck_type: TruckType, capacity: f64) -> Self {
        self.store
            .insert_truck(Truck::new(id, format!("PLT-{}", id.to_uppercase()), truck_type, capacity));
        self.store.allocate(&ClientId::new(client), &TruckId::new(id));
        self
    }

    /// A truck nobody has allocated.
    pub fn unallocated_truck(self, id: &str, truck_type: TruckType, capacity: f64) -> Self {
        self.store
            .insert_truck(Truck::new(id, format!("PLT-{}", id.to_uppercase()), truck_type, capacity));
        self
    }

    pub fn driver(self, id: &str, license: LicenseTier) -> Self {
        self.store.insert_driver(Driver::new(id, format!("Driver {}", id), license));
        self
    }

    pub fn drivers(mut self, count: usize) -> Self {
        for i in 1..=count {
            self = self.driver(&format!("d{}", i), LicenseTier::Full);
        }
        self
    }

    pub fn helper(self, id: &str) -> Self {
        self.store.insert_helper(Helper::new(id, format!("Helper {}", id)));
        self
    }

    pub fn rate(self, truck_type: TruckType, base_rate: f64, rate_per_km: f64) -> Self {
        self.store.insert_rate(RateRecord {
            truck_type,
            base_rate,
            rate_per_km,
        });
        self
    }

    pub fn engine(&self) -> BookingEngine {
        BookingEngine::new(self.store.clone(), EngineConfig::default())
    }

    pub fn engine_with(&self, config: EngineConfig) -> BookingEngine {
        BookingEngine::new(self.store.clone(), config)
    }

    pub fn booking(&self, id: BookingId) -> Booking {
        self.store.booking(&id).expect("booking exists")
    }

    pub fn booking_count(&self) -> usize {
        self.store.read(|state| state.bookings().count())
    }
}

pub fn stop(location: Location) -> StopRequest {
    StopRequest {
        location: Some(location.name.to_string()),
        coordinates: Some(location.coords()),
        contact_name: Some("Maria Santos".to_string()),
        contact_phone: Some("+63 917 555 0101".to_string()),
    }
}

/// Request from [`CLIENT`] for `trucks`, scheduled at `at`.
pub fn request(trucks: &[&str], cargo_weight: f64, at: DateTime<Utc>) -> BookingRequest {
    BookingRequest {
        client_id: ClientId::new(CLIENT),
        truck_ids: trucks.iter().map(|t| TruckId::new(*t)).collect(),
        truck_id: None,
        cargo_weight: Some(cargo_weight),
        scheduled_date: Some(at.format("%Y-%m-%d").to_string()),
        scheduled_time: Some(at.format("%H:%M").to_string()),
        pickup: stop(WAREHOUSES[0]),
        dropoff: stop(DROPOFFS[1]),
    }
}
