//! Error types for booking operations.
//!
//! [`BookingError`] covers every way a booking request or a booking status
//! change can fail. [`ErrorKind`] groups the variants into the categories
//! callers act on: fix the input, retry later, or accept a per-truck loss.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BookingId, BookingStatus, ClientId, DriverId, TruckId, TruckType};

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    /// Required request fields were absent or blank.
    #[error("missing required fields: {}", .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("booking must be at least {required_hours}h ahead, got {hours_ahead:.1}h")]
    LeadTimeTooShort { hours_ahead: f64, required_hours: i64 },

    #[error("client {client} has overdue payments")]
    PaymentOverdue { client: ClientId },

    #[error("truck {truck} is unavailable: {reason}")]
    TruckUnavailable { truck: TruckId, reason: String },

    /// The matched driver was taken between matching and commit.
    #[error("driver {driver} is no longer available")]
    DriverUnavailable { driver: DriverId },

    #[error("no eligible driver for truck {truck} ({truck_type})")]
    NoDriversAvailable { truck: TruckId, truck_type: TruckType },

    #[error("not enough drivers: needed {needed}, available {available}")]
    InsufficientDrivers { needed: usize, available: usize },

    #[error(
        "truck {truck} already booked at {scheduled_at} by {client} (booking {conflicting_booking}, {hours_apart:.1}h apart)"
    )]
    BookingConflict {
        truck: TruckId,
        conflicting_booking: BookingId,
        scheduled_at: DateTime<Utc>,
        client: ClientId,
        hours_apart: f64,
    },

    #[error("cargo {requested}t exceeds truck {truck} capacity {capacity}t")]
    CapacityExceeded { truck: TruckId, requested: f64, capacity: f64 },

    #[error("cargo {requested}t exceeds combined fleet capacity {capacity}t")]
    FleetCapacityExceeded { requested: f64, capacity: f64 },

    /// The load was fully placed on other requested trucks.
    #[error("truck {truck} has no cargo left to carry")]
    NoCargoAssigned { truck: TruckId },

    #[error("no rate configured for {truck_type}")]
    RateNotConfigured { truck_type: TruckType },

    /// The request ran out of time. Bookings already committed stay committed.
    #[error("request timed out after {elapsed:?} ({} bookings already committed)", .committed.len())]
    Timeout { elapsed: Duration, committed: Vec<BookingId> },

    #[error("no trucks could be booked ({} failures)", .failures.len())]
    NoTrucksBooked { failures: Vec<TruckFailure> },

    #[error("booking {booking} not found")]
    BookingNotFound { booking: BookingId },

    #[error("cannot move booking from {from} to {to}")]
    InvalidTransition { from: BookingStatus, to: BookingStatus },

    /// Reschedule and reroute are only allowed while the booking is pending.
    #[error("booking {booking} can no longer be changed (status {status})")]
    BookingLocked { booking: BookingId, status: BookingStatus },

    /// Stored documents disagree with each other, e.g. a booking whose truck is gone.
    #[error("persistence error: {message}")]
    Persistence { message: String },
}

/// Failure categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Payment,
    Availability,
    Conflict,
    Capacity,
    Pricing,
    Timeout,
    NotFound,
    State,
    Persistence,
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BookingError::MissingFields { .. }
            | BookingError::InvalidField { .. }
            | BookingError::LeadTimeTooShort { .. } => ErrorKind::Validation,
            BookingError::PaymentOverdue { .. } => ErrorKind::Payment,
            BookingError::TruckUnavailable { .. }
            | BookingError::DriverUnavailable { .. }
            | BookingError::NoDriversAvailable { .. }
            | BookingError::InsufficientDrivers { .. }
            | BookingError::NoTrucksBooked { .. } => ErrorKind::Availability,
            BookingError::BookingConflict { .. } => ErrorKind::Conflict,
            BookingError::CapacityExceeded { .. }
            | BookingError::FleetCapacityExceeded { .. }
            | BookingError::NoCargoAssigned { .. } => ErrorKind::Capacity,
            BookingError::RateNotConfigured { .. } => ErrorKind::Pricing,
            BookingError::Timeout { .. } => ErrorKind::Timeout,
            BookingError::BookingNotFound { .. } => ErrorKind::NotFound,
            BookingError::InvalidTransition { .. } | BookingError::BookingLocked { .. } => ErrorKind::State,
            BookingError::Persistence { .. } => ErrorKind::Persistence,
        }
    }

    /// Status code the HTTP layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::Payment => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Timeout => 408,
            ErrorKind::Availability | ErrorKind::Conflict | ErrorKind::State => 409,
            ErrorKind::Capacity => 422,
            ErrorKind::Pricing | ErrorKind::Persistence => 500,
        }
    }

    /// Stable machine-readable reason, e.g. `PAYMENT_OVERDUE`.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::MissingFields { .. } => "MISSING_FIELDS",
            BookingError::InvalidField { .. } => "INVALID_FIELD",
            BookingError::LeadTimeTooShort { .. } => "LEAD_TIME_TOO_SHORT",
            BookingError::PaymentOverdue { .. } => "PAYMENT_OVERDUE",
            BookingError::TruckUnavailable { .. } => "TRUCK_UNAVAILABLE",
            BookingError::DriverUnavailable { .. } => "DRIVER_UNAVAILABLE",
            BookingError::NoDriversAvailable { .. } => "NO_DRIVERS_AVAILABLE",
            BookingError::InsufficientDrivers { .. } => "INSUFFICIENT_DRIVERS",
            BookingError::BookingConflict { .. } => "BOOKING_CONFLICT",
            BookingError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            BookingError::FleetCapacityExceeded { .. } => "FLEET_CAPACITY_EXCEEDED",
            BookingError::NoCargoAssigned { .. } => "NO_CARGO_ASSIGNED",
            BookingError::RateNotConfigured { .. } => "RATE_NOT_CONFIGURED",
            BookingError::Timeout { .. } => "TIMEOUT",
            BookingError::NoTrucksBooked { .. } => "NO_TRUCKS_BOOKED",
            BookingError::BookingNotFound { .. } => "BOOKING_NOT_FOUND",
            BookingError::InvalidTransition { .. } => "INVALID_TRANSITION",
            BookingError::BookingLocked { .. } => "BOOKING_LOCKED",
            BookingError::Persistence { .. } => "PERSISTENCE_ERROR",
        }
    }
}

/// One truck that could not be booked, with the reason surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckFailure {
    pub truck: TruckId,
    pub kind: ErrorKind,
    pub code: String,
    pub reason: String,
}

impl TruckFailure {
    pub fn from_error(truck: TruckId, err: &BookingError) -> Self {
        Self {
            truck,
            kind: err.kind(),
            code: err.code().to_string(),
            reason: err.to_string(),
        }
    }
}
