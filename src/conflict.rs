//! Per-truck cooldown conflict detection.

use chrono::{DateTime, Days, Utc};
use rayon::prelude::*;

use crate::error::BookingError;
use crate::model::{BookingId, ClientId, TruckId};
use crate::store::FleetState;

/// An active booking too close to the requested time.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub booking: BookingId,
    pub scheduled_at: DateTime<Utc>,
    pub client: ClientId,
    pub hours_apart: f64,
}

impl Conflict {
    pub fn into_error(self, truck: TruckId) -> BookingError {
        BookingError::BookingConflict {
            truck,
            conflicting_booking: self.booking,
            scheduled_at: self.scheduled_at,
            client: self.client,
            hours_apart: self.hours_apart,
        }
    }
}

/// Find an active booking of `truck` closer than `cooldown_hours` to
/// `requested_at`, skipping `exclude` (the booking being rescheduled).
///
/// Only bookings on calendar dates within the cooldown span of the requested
/// date are examined; with the default 12h cooldown that is the day before,
/// the day itself and the day after. The nearest offending booking wins.
pub fn find_conflict(
    state: &FleetState,
    truck: &TruckId,
    requested_at: DateTime<Utc>,
    exclude: Option<BookingId>,
    cooldown_hours: i64,
) -> Option<Conflict> {
    let cooldown_secs = cooldown_hours.max(0) * 3600;
    let span = Days::new(window_days(cooldown_hours));
    let date = requested_at.date_naive();
    let from = date.checked_sub_days(span).unwrap_or(date);
    let to = date.checked_add_days(span).unwrap_or(date);

    let candidates = state.bookings_for_truck(truck, from, to);
    tracing::debug!(%truck, %requested_at, candidates = candidates.len(), "scanning for conflicts");

    candidates
        .par_iter()
        .filter(|booking| booking.status.is_active() && Some(booking.id) != exclude)
        .filter_map(|booking| {
            let gap = (booking.scheduled_at - requested_at).num_seconds().abs();
            (gap < cooldown_secs).then(|| (gap, booking))
        })
        .min_by_key(|(gap, _)| *gap)
        .map(|(gap, booking)| Conflict {
            booking: booking.id,
            scheduled_at: booking.scheduled_at,
            client: booking.client.clone(),
            hours_apart: gap as f64 / 3600.0,
        })
}

fn window_days(cooldown_hours: i64) -> u64 {
    let hours = cooldown_hours.max(0) as u64;
    hours.div_ceil(24).max(1)
}
