//! Booking request orchestration.
//!
//! [`BookingEngine::create_booking`] validates a request, resolves the
//! client's trucks and the staff pools once, splits the cargo, then books
//! each truck in turn. One truck failing never aborts its siblings; only
//! request-wide problems (bad input, payment, driver shortage, timeout, no
//! truck booked at all) turn into an error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cargo::{self, TruckCapacity};
use crate::config::{CapacityPolicy, EngineConfig};
use crate::conflict::find_conflict;
use crate::directory;
use crate::error::{BookingError, TruckFailure};
use crate::executor::{self, TruckBooking};
use crate::haversine::HaversineEstimator;
use crate::matcher::{self, MatchScore, ReservationSet};
use crate::model::{
    Booking, BookingId, BookingStatus, ClientId, Coordinates, DriverId, HelperId, PricingSource, RouteEstimate,
    Truck, TruckId,
};
use crate::rates;
use crate::store::FleetStore;
use crate::traits::{AllowAllPayments, BookingNotice, LogNotifier, Notifier, PaymentGate, RouteEstimator};
use crate::validation::{self, BookingRequest, StopRequest};

/// Time budget for one request, checked at every per-truck boundary and
/// inside each transaction right before commit.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Option<Duration>,
}

impl Deadline {
    pub fn after(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit: Some(limit),
        }
    }

    pub fn unbounded() -> Self {
        Self {
            started: Instant::now(),
            limit: None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn is_expired(&self) -> bool {
        self.limit.is_some_and(|limit| self.elapsed() >= limit)
    }

    pub fn check(&self) -> Result<(), BookingError> {
        if self.is_expired() {
            return Err(BookingError::Timeout {
                elapsed: self.elapsed(),
                committed: Vec::new(),
            });
        }
        Ok(())
    }
}

/// One truck booked by a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookedTruck {
    pub booking: BookingId,
    pub truck: TruckId,
    pub driver: Option<DriverId>,
    pub helper: Option<HelperId>,
    pub driver_match: MatchScore,
    pub helper_match: MatchScore,
    pub cargo_weight: f64,
    pub price: f64,
    pub pricing: PricingSource,
}

/// Outcome of a request in which at least one truck was booked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingReport {
    pub client: ClientId,
    pub scheduled_at: DateTime<Utc>,
    pub succeeded: Vec<BookedTruck>,
    pub failed: Vec<TruckFailure>,
    /// Combined capacity of the client's requested, eligible trucks.
    pub total_capacity: f64,
    pub total_cargo: f64,
    /// Cargo no requested truck could take.
    pub unassigned_cargo: f64,
    pub route: RouteEstimate,
}

impl BookingReport {
    pub fn booking_ids(&self) -> Vec<BookingId> {
        self.succeeded.iter().map(|b| b.booking).collect()
    }

    pub fn is_under_capacity(&self) -> bool {
        self.unassigned_cargo > 0.0
    }
}

pub struct BookingEngine {
    store: Arc<FleetStore>,
    config: EngineConfig,
    estimator: Arc<dyn RouteEstimator>,
    payments: Arc<dyn PaymentGate>,
    notifier: Arc<dyn Notifier>,
}

impl BookingEngine {
    pub fn new(store: Arc<FleetStore>, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            estimator: Arc::new(HaversineEstimator::default()),
            payments: Arc::new(AllowAllPayments),
            notifier: Arc::new(LogNotifier),
        }
    }

    pub fn with_estimator(mut self, estimator: impl RouteEstimator + 'static) -> Self {
        self.estimator = Arc::new(estimator);
        self
    }

    pub fn with_payment_gate(mut self, payments: impl PaymentGate + 'static) -> Self {
        self.payments = Arc::new(payments);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn store(&self) -> &FleetStore {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Book every requested truck that can be booked.
    #[instrument(skip_all, fields(client = %request.client_id))]
    pub fn create_booking(&self, request: &BookingRequest) -> Result<BookingReport, BookingError> {
        let deadline = Deadline::after(self.config.request_timeout);
        self.create_booking_within(request, &deadline)
    }

    /// [`Self::create_booking`] against a caller-supplied deadline.
    pub fn create_booking_within(
        &self,
        request: &BookingRequest,
        deadline: &Deadline,
    ) -> Result<BookingReport, BookingError> {
        let request = validation::validate_request(request, self.store.now(), &self.config)?;
        if !self.payments.is_in_good_standing(&request.client) {
            return Err(BookingError::PaymentOverdue {
                client: request.client.clone(),
            });
        }

        let (eligible, drivers, helpers, rate_table) = self.store.read(|state| {
            (
                directory::list_eligible_trucks(state, &request.client),
                directory::list_available_drivers(state),
                directory::list_available_helpers(state),
                state.rates().clone(),
            )
        });

        let mut failed = Vec::new();
        let mut candidates: Vec<Truck> = Vec::new();
        for id in &request.trucks {
            match eligible.iter().find(|t| &t.id == id) {
                Some(truck) => candidates.push(truck.clone()),
                None => failed.push(TruckFailure::from_error(
                    id.clone(),
                    &BookingError::TruckUnavailable {
                        truck: id.clone(),
                        reason: "not allocated to this client or not operational".to_string(),
                    },
                )),
            }
        }
        if candidates.is_empty() {
            return Err(BookingError::NoTrucksBooked { failures: failed });
        }

        let capacities: Vec<TruckCapacity> = candidates
            .iter()
            .map(|t| TruckCapacity {
                truck: t.id.clone(),
                capacity: t.capacity,
            })
            .collect();
        let distribution = cargo::distribute(request.cargo_weight, &capacities);
        if distribution.is_short() {
            match self.config.capacity_policy {
                CapacityPolicy::Reject => {
                    return Err(BookingError::FleetCapacityExceeded {
                        requested: request.cargo_weight,
                        capacity: distribution.total_capacity,
                    });
                }
                CapacityPolicy::WarnAndProceed => tracing::warn!(
                    requested = request.cargo_weight,
                    capacity = distribution.total_capacity,
                    remainder = distribution.remainder,
                    "requested trucks cannot carry the full load"
                ),
            }
        }

        let assigned: Vec<(&Truck, f64)> = distribution
            .assignments
            .iter()
            .filter_map(|a| candidates.iter().find(|t| t.id == a.truck).map(|t| (t, a.assigned)))
            .collect();

        // Every eligible requested truck needs a driver, loaded or not.
        let mut drivers = ReservationSet::new(drivers);
        let mut helpers = ReservationSet::new(helpers);
        let coverage: Vec<_> = candidates.iter().map(|t| (t.id.clone(), t.truck_type)).collect();
        matcher::ensure_driver_coverage(&coverage, &drivers)?;

        for truck in &distribution.unused {
            failed.push(TruckFailure::from_error(
                truck.clone(),
                &BookingError::NoCargoAssigned { truck: truck.clone() },
            ));
        }

        let route = self.estimate_route(request.pickup.coordinates, request.dropoff.coordinates);
        let mut succeeded: Vec<BookedTruck> = Vec::new();

        for (truck, cargo_weight) in assigned {
            if deadline.check().is_err() {
                return Err(timed_out(deadline, &succeeded));
            }

            let precheck = self.store.read(|state| {
                find_conflict(state, &truck.id, request.scheduled_at, None, self.config.cooldown_hours)
            });
            if let Some(conflict) = precheck {
                let err = conflict.into_error(truck.id.clone());
                tracing::info!(truck = %truck.id, reason = %err, "truck skipped");
                failed.push(TruckFailure::from_error(truck.id.clone(), &err));
                continue;
            }

            let driver_slot = matcher::match_driver(truck.truck_type, &mut drivers);
            let helper_slot = matcher::match_helper(&mut helpers);
            if helper_slot.is_none() {
                tracing::warn!(truck = %truck.id, "no helper available, booking awaits helper");
            }

            let quote = rates::quote_or_fallback(
                &rate_table,
                truck.truck_type,
                self.config.fallback_pricing,
                route.distance_km,
                cargo_weight,
            );

            let booking = TruckBooking {
                client: request.client.clone(),
                truck: truck.id.clone(),
                cargo_weight,
                total_cargo_weight: request.cargo_weight,
                driver: driver_slot.map(|slot| drivers.get(slot).id.clone()),
                helper: helper_slot.map(|slot| helpers.get(slot).id.clone()),
                scheduled_at: request.scheduled_at,
                pickup: request.pickup.clone(),
                dropoff: request.dropoff.clone(),
                route,
                quote,
            };

            match executor::book_one_truck(&self.store, booking, self.config.cooldown_hours, deadline) {
                Ok(booking) => succeeded.push(BookedTruck {
                    booking: booking.id,
                    truck: booking.truck,
                    helper_match: MatchScore::of(booking.helper.as_ref().and(helper_slot)),
                    driver_match: MatchScore::of(driver_slot),
                    driver: booking.driver,
                    helper: booking.helper,
                    cargo_weight: booking.cargo_weight,
                    price: booking.quote.total,
                    pricing: booking.quote.source,
                }),
                Err(BookingError::Timeout { .. }) => return Err(timed_out(deadline, &succeeded)),
                Err(err) => {
                    tracing::warn!(truck = %truck.id, reason = %err, "truck booking failed");
                    if let Some(slot) = driver_slot.filter(|_| releases_driver(&err)) {
                        drivers.release(slot);
                    }
                    if let Some(slot) = helper_slot {
                        helpers.release(slot);
                    }
                    failed.push(TruckFailure::from_error(truck.id.clone(), &err));
                }
            }
        }

        if succeeded.is_empty() {
            return Err(BookingError::NoTrucksBooked { failures: failed });
        }

        let notice = BookingNotice {
            client: request.client.clone(),
            bookings: succeeded.iter().map(|b| (b.booking, b.truck.clone())).collect(),
            failed_trucks: failed.iter().map(|f| f.truck.clone()).collect(),
            scheduled_at: request.scheduled_at,
        };
        if let Err(err) = self.notifier.booking_created(&notice) {
            tracing::warn!(error = %err, "booking notification failed");
        }

        tracing::info!(
            client = %request.client,
            succeeded = succeeded.len(),
            failed = failed.len(),
            "booking request complete"
        );

        Ok(BookingReport {
            client: request.client,
            scheduled_at: request.scheduled_at,
            succeeded,
            failed,
            total_capacity: distribution.total_capacity,
            total_cargo: request.cargo_weight,
            unassigned_cargo: distribution.remainder,
            route,
        })
    }

    /// Cancel a pending booking and return its resources.
    pub fn cancel(&self, id: BookingId) -> Result<Booking, BookingError> {
        executor::cancel(&self.store, id)
    }

    /// Operational status change (`in_progress`, `picked_up`, `delivered`, ...).
    pub fn update_status(&self, id: BookingId, status: BookingStatus) -> Result<Booking, BookingError> {
        executor::update_status(&self.store, id, status)
    }

    /// Move a pending booking to a new date and time.
    pub fn reschedule(&self, id: BookingId, date: &str, time: &str) -> Result<Booking, BookingError> {
        let scheduled_at = validation::parse_schedule(date, time)?;
        validation::check_lead_time(scheduled_at, self.store.now())?;
        executor::reschedule(&self.store, id, scheduled_at, self.config.cooldown_hours)
    }

    /// Replace the stops of a pending booking, re-estimating and re-pricing it.
    pub fn reroute(&self, id: BookingId, pickup: &StopRequest, dropoff: &StopRequest) -> Result<Booking, BookingError> {
        let pickup = validation::validate_stop("pickup", pickup, &self.config)?;
        let dropoff = validation::validate_stop("dropoff", dropoff, &self.config)?;

        let (booking, truck_type, rate_table) = self.store.read(|state| {
            let booking = state.booking(&id).cloned();
            let truck_type = booking
                .as_ref()
                .and_then(|b| state.truck(&b.truck))
                .map(|t| t.truck_type);
            (booking, truck_type, state.rates().clone())
        });
        let booking = booking.ok_or(BookingError::BookingNotFound { booking: id })?;
        validation::check_lead_time(booking.scheduled_at, self.store.now())?;
        let truck_type = truck_type.ok_or_else(|| BookingError::Persistence {
            message: format!("booking {} references missing truck {}", id, booking.truck),
        })?;

        let route = self.estimate_route(pickup.coordinates, dropoff.coordinates);
        let quote = rates::quote_or_fallback(
            &rate_table,
            truck_type,
            self.config.fallback_pricing,
            route.distance_km,
            booking.cargo_weight,
        );
        executor::reroute(&self.store, id, pickup, dropoff, route, quote)
    }

    fn estimate_route(&self, from: Coordinates, to: Coordinates) -> RouteEstimate {
        self.estimator.estimate(from, to).unwrap_or_else(|| {
            tracing::warn!("route estimator unavailable, using great-circle estimate");
            HaversineEstimator::default().route(from, to)
        })
    }
}

/// A driver who lost the in-transaction re-check is taken elsewhere, so their
/// slot stays consumed for the rest of the request.
fn releases_driver(err: &BookingError) -> bool {
    !matches!(err, BookingError::DriverUnavailable { .. })
}

fn timed_out(deadline: &Deadline, succeeded: &[BookedTruck]) -> BookingError {
    let committed: Vec<BookingId> = succeeded.iter().map(|b| b.booking).collect();
    tracing::warn!(elapsed = ?deadline.elapsed(), committed = committed.len(), "booking request timed out");
    BookingError::Timeout {
        elapsed: deadline.elapsed(),
        committed,
    }
}
