//! fleet-booking core
//!
//! Booking and resource allocation engine for a truck fleet: validates a
//! client's delivery request, splits the cargo across the requested trucks,
//! matches drivers and helpers, prices the job and commits one atomic
//! booking per truck.

pub mod traits;
pub mod model;
pub mod config;
pub mod error;
pub mod store;
pub mod directory;
pub mod rates;
pub mod conflict;
pub mod cargo;
pub mod matcher;
pub mod validation;
pub mod executor;
pub mod orchestrator;
pub mod haversine;
pub mod osrm;

pub use config::{CapacityPolicy, EngineConfig, FallbackPricing};
pub use error::{BookingError, ErrorKind};
pub use orchestrator::{BookingEngine, BookingReport, Deadline};
pub use store::FleetStore;
