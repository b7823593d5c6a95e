//! Collaborator seams for the booking engine.
//!
//! The engine owns no network, payment or messaging code. Applications
//! plug their own implementations in behind these traits; the crate ships
//! simple defaults that are good enough for tests and single-node setups.

use std::error::Error;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::model::{BookingId, ClientId, Coordinates, RouteEstimate, TruckId};

/// Estimates driving distance and duration between two points.
///
/// Returns `None` when the estimate cannot be produced (service down,
/// unroutable points). The engine then falls back to a great-circle estimate.
pub trait RouteEstimator: Send + Sync {
    fn estimate(&self, from: Coordinates, to: Coordinates) -> Option<RouteEstimate>;
}

/// Yes/no payment eligibility for a client.
pub trait PaymentGate: Send + Sync {
    fn is_in_good_standing(&self, client: &ClientId) -> bool;
}

pub type NotifyError = Box<dyn Error + Send + Sync>;

/// Outbound side effect fired once per successful booking request.
pub trait Notifier: Send + Sync {
    fn booking_created(&self, notice: &BookingNotice) -> Result<(), NotifyError>;
}

/// Source of "now" for lead-time checks and server-assigned timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Summary sent to the notifier after a booking request commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingNotice {
    pub client: ClientId,
    pub bookings: Vec<(BookingId, TruckId)>,
    pub failed_trucks: Vec<TruckId>,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Payment gate that lets every client through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllPayments;

impl PaymentGate for AllowAllPayments {
    fn is_in_good_standing(&self, _client: &ClientId) -> bool {
        true
    }
}

/// Notifier that only records the event in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn booking_created(&self, notice: &BookingNotice) -> Result<(), NotifyError> {
        tracing::info!(
            client = %notice.client,
            bookings = notice.bookings.len(),
            failed = notice.failed_trucks.len(),
            scheduled_at = %notice.scheduled_at,
            "booking notification"
        );
        Ok(())
    }
}
