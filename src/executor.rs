//! Atomic per-truck booking writes and booking lifecycle transitions.
//!
//! Each public function here is one store transaction. Either every document
//! it touches (booking, truck, driver, helper) changes, or none does.

use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::conflict::find_conflict;
use crate::error::BookingError;
use crate::model::{
    AllocationState, AssignmentStatus, Availability, Booking, BookingId, BookingStatus, ClientId, Driver,
    DriverId, Helper, HelperId, Quote, RouteEstimate, StaffStatus, Stop, TruckId,
};
use crate::orchestrator::Deadline;
use crate::store::{FleetStore, Transaction};
use crate::validation;

/// Everything needed to write one truck's booking.
#[derive(Debug, Clone)]
pub struct TruckBooking {
    pub client: ClientId,
    pub truck: TruckId,
    pub cargo_weight: f64,
    pub total_cargo_weight: f64,
    pub driver: Option<DriverId>,
    pub helper: Option<HelperId>,
    pub scheduled_at: DateTime<Utc>,
    pub pickup: Stop,
    pub dropoff: Stop,
    pub route: RouteEstimate,
    pub quote: Quote,
}

/// Re-validate the truck and schedule, write the booking and put the truck,
/// driver and helper to work.
///
/// The conflict check runs again here, under the store's write lock, so two
/// requests racing for the same truck cannot both commit. A driver taken by
/// another request since matching aborts the booking; a helper taken since
/// matching only leaves the helper seat open.
#[instrument(skip_all, fields(truck = %request.truck, client = %request.client))]
pub fn book_one_truck(
    store: &FleetStore,
    request: TruckBooking,
    cooldown_hours: i64,
    deadline: &Deadline,
) -> Result<Booking, BookingError> {
    store.transaction(|tx| {
        let mut truck = tx
            .state()
            .truck(&request.truck)
            .cloned()
            .ok_or_else(|| truck_unavailable(&request.truck, "truck not found"))?;
        if !truck.is_operational() {
            return Err(truck_unavailable(&request.truck, &format!("truck is {}", truck.status_label())));
        }
        if !tx.state().has_active_allocation(&request.client, &request.truck) {
            return Err(truck_unavailable(&request.truck, "truck is not allocated to this client"));
        }
        if truck.capacity < request.cargo_weight {
            return Err(BookingError::CapacityExceeded {
                truck: request.truck.clone(),
                requested: request.cargo_weight,
                capacity: truck.capacity,
            });
        }

        if let Some(conflict) = find_conflict(tx.state(), &request.truck, request.scheduled_at, None, cooldown_hours) {
            return Err(conflict.into_error(request.truck.clone()));
        }

        let now = tx.now();
        let mut booking = Booking {
            id: BookingId::new(),
            client: request.client.clone(),
            truck: request.truck.clone(),
            driver: request.driver.clone(),
            helper: request.helper.clone(),
            driver_assignment: seat_status(request.driver.is_some(), AssignmentStatus::AwaitingDriver),
            helper_assignment: seat_status(request.helper.is_some(), AssignmentStatus::AwaitingHelper),
            scheduled_at: request.scheduled_at,
            pickup: request.pickup,
            dropoff: request.dropoff,
            cargo_weight: request.cargo_weight,
            total_cargo_weight: request.total_cargo_weight,
            route: request.route,
            quote: request.quote,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        tx.put_booking(booking.clone());

        truck.availability = Availability::Busy;
        truck.current_booking = tx
            .state()
            .next_active_booking(&truck.id, None)
            .map(|next| next.id);
        tx.put_truck(truck);

        if let Some(driver_id) = &booking.driver {
            let driver = tx
                .state()
                .driver(driver_id)
                .filter(|d| d.is_available())
                .cloned()
                .ok_or_else(|| BookingError::DriverUnavailable {
                    driver: driver_id.clone(),
                })?;
            tx.put_driver(Driver {
                status: StaffStatus::OnDuty,
                ..driver
            });
        }

        if let Some(helper_id) = booking.helper.clone() {
            match tx.state().helper(&helper_id).filter(|h| h.is_available()).cloned() {
                Some(helper) => tx.put_helper(Helper {
                    status: StaffStatus::OnDuty,
                    ..helper
                }),
                None => {
                    tracing::warn!(helper = %helper_id, "helper taken since matching, seat left open");
                    booking.helper = None;
                    booking.helper_assignment = AssignmentStatus::AwaitingHelper;
                    tx.put_booking(booking.clone());
                }
            }
        }

        deadline.check()?;

        tracing::info!(
            booking = %booking.id,
            driver = ?booking.driver,
            helper = ?booking.helper,
            cargo = booking.cargo_weight,
            total = booking.quote.total,
            "booking committed"
        );
        Ok(booking)
    })
}

/// Move a booking to `next`, releasing its resources on terminal states.
#[instrument(skip(store))]
pub fn update_status(store: &FleetStore, id: BookingId, next: BookingStatus) -> Result<Booking, BookingError> {
    store.transaction(|tx| {
        let mut booking = load_booking(tx, id)?;
        if !booking.status.can_transition_to(next) {
            return Err(BookingError::InvalidTransition {
                from: booking.status,
                to: next,
            });
        }
        booking.status = next;
        tx.put_booking(booking.clone());

        if next.is_terminal() {
            release_resources(tx, &booking);
            tracing::info!(booking = %id, status = %next, truck = %booking.truck, "booking closed");
        }
        Ok(booking)
    })
}

/// Cancel a booking that has not started yet.
pub fn cancel(store: &FleetStore, id: BookingId) -> Result<Booking, BookingError> {
    update_status(store, id, BookingStatus::Cancelled)
}

/// Move a pending booking to a new time. The caller has already applied the
/// lead-time rule; the cooldown check runs here, skipping the booking itself.
#[instrument(skip(store))]
pub fn reschedule(
    store: &FleetStore,
    id: BookingId,
    scheduled_at: DateTime<Utc>,
    cooldown_hours: i64,
) -> Result<Booking, BookingError> {
    store.transaction(|tx| {
        let mut booking = load_pending(tx, id)?;
        if let Some(conflict) = find_conflict(tx.state(), &booking.truck, scheduled_at, Some(id), cooldown_hours) {
            return Err(conflict.into_error(booking.truck.clone()));
        }
        booking.scheduled_at = scheduled_at;
        tx.put_booking(booking.clone());

        let mut truck = tx
            .state()
            .truck(&booking.truck)
            .cloned()
            .ok_or_else(|| BookingError::Persistence {
                message: format!("booking {} references missing truck {}", id, booking.truck),
            })?;
        truck.current_booking = tx.state().next_active_booking(&truck.id, None).map(|b| b.id);
        tx.put_truck(truck);
        Ok(booking)
    })
}

/// Replace the stops of a pending booking along with its route and price.
#[instrument(skip_all, fields(booking = %id))]
pub fn reroute(
    store: &FleetStore,
    id: BookingId,
    pickup: Stop,
    dropoff: Stop,
    route: RouteEstimate,
    quote: Quote,
) -> Result<Booking, BookingError> {
    store.transaction(|tx| {
        let mut booking = load_pending(tx, id)?;
        validation::check_lead_time(booking.scheduled_at, tx.now())?;
        booking.pickup = pickup;
        booking.dropoff = dropoff;
        booking.route = route;
        booking.quote = quote;
        tx.put_booking(booking.clone());
        Ok(booking)
    })
}

/// Return the truck, driver and helper of a closed booking to service.
///
/// The truck stays busy if it still has another active booking; otherwise it
/// becomes free (still allocated) or fully unallocated. Fulfilled bookings add
/// their distance and one trip to the truck's running totals.
fn release_resources(tx: &mut Transaction<'_>, booking: &Booking) {
    if let Some(mut truck) = tx.state().truck(&booking.truck).cloned() {
        if booking.status.is_fulfilled() {
            truck.total_distance_km += booking.route.distance_km;
            truck.completed_trips += 1;
        }
        match tx.state().next_active_booking(&truck.id, Some(booking.id)).map(|b| b.id) {
            Some(next) => {
                truck.current_booking = Some(next);
                truck.availability = Availability::Busy;
            }
            None => {
                truck.current_booking = None;
                truck.availability = Availability::Free;
                truck.allocation = if tx.state().truck_is_allocated(&truck.id) {
                    AllocationState::Allocated
                } else {
                    AllocationState::Unallocated
                };
            }
        }
        tx.put_truck(truck);
    }

    if let Some(driver) = booking.driver.as_ref().and_then(|id| tx.state().driver(id)).cloned() {
        if driver.status != StaffStatus::Terminated {
            tx.put_driver(Driver {
                status: StaffStatus::Active,
                ..driver
            });
        }
    }

    if let Some(helper) = booking.helper.as_ref().and_then(|id| tx.state().helper(id)).cloned() {
        if helper.status != StaffStatus::Terminated {
            tx.put_helper(Helper {
                status: StaffStatus::Active,
                ..helper
            });
        }
    }
}

fn load_booking(tx: &Transaction<'_>, id: BookingId) -> Result<Booking, BookingError> {
    tx.state()
        .booking(&id)
        .cloned()
        .ok_or(BookingError::BookingNotFound { booking: id })
}

fn load_pending(tx: &Transaction<'_>, id: BookingId) -> Result<Booking, BookingError> {
    let booking = load_booking(tx, id)?;
    if booking.status != BookingStatus::Pending {
        return Err(BookingError::BookingLocked {
            booking: id,
            status: booking.status,
        });
    }
    Ok(booking)
}

fn seat_status(assigned: bool, awaiting: AssignmentStatus) -> AssignmentStatus {
    if assigned { AssignmentStatus::AwaitingApproval } else { awaiting }
}

fn truck_unavailable(truck: &TruckId, reason: &str) -> BookingError {
    BookingError::TruckUnavailable {
        truck: truck.clone(),
        reason: reason.to_string(),
    }
}
