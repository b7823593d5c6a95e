//! Driver and helper matching for a multi-truck request.
//!
//! Pools are fetched once per request and wrapped in a [`ReservationSet`]:
//! the fetched list stays intact and matching only flips a consumed mark
//! on the chosen index, so the same person is never handed to two trucks
//! of one request. The consumption order is the pool order.

use serde::{Deserialize, Serialize};

use crate::error::BookingError;
use crate::model::{Driver, Helper, TruckId, TruckType};

/// Index of a reserved pool entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(usize);

#[derive(Debug, Clone)]
pub struct ReservationSet<T> {
    pool: Vec<T>,
    consumed: Vec<bool>,
}

impl<T> ReservationSet<T> {
    pub fn new(pool: Vec<T>) -> Self {
        let consumed = vec![false; pool.len()];
        Self { pool, consumed }
    }

    pub fn get(&self, slot: Slot) -> &T {
        &self.pool[slot.0]
    }

    pub fn available_count(&self) -> usize {
        self.consumed.iter().filter(|taken| !**taken).count()
    }

    pub fn available(&self) -> impl Iterator<Item = &T> {
        self.pool
            .iter()
            .zip(&self.consumed)
            .filter(|(_, taken)| !**taken)
            .map(|(item, _)| item)
    }

    /// Reserve the first unconsumed entry accepted by `eligible`.
    pub fn reserve_first(&mut self, eligible: impl Fn(&T) -> bool) -> Option<Slot> {
        let index = self
            .pool
            .iter()
            .enumerate()
            .position(|(i, item)| !self.consumed[i] && eligible(item))?;
        self.consumed[index] = true;
        Some(Slot(index))
    }

    /// Hand a reservation back, e.g. when the truck it was made for failed.
    pub fn release(&mut self, slot: Slot) {
        self.consumed[slot.0] = false;
    }
}

/// Binary assignment score recorded for auditing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchScore {
    Matched,
    Unmatched,
}

impl MatchScore {
    pub fn of(slot: Option<Slot>) -> Self {
        if slot.is_some() { MatchScore::Matched } else { MatchScore::Unmatched }
    }
}

/// First available driver licensed for `truck_type`.
pub fn match_driver(truck_type: TruckType, drivers: &mut ReservationSet<Driver>) -> Option<Slot> {
    let slot = drivers.reserve_first(|driver| driver.can_drive(truck_type));
    tracing::debug!(%truck_type, matched = slot.is_some(), "driver match");
    slot
}

/// First available helper. Helpers carry no license constraint.
pub fn match_helper(helpers: &mut ReservationSet<Helper>) -> Option<Slot> {
    helpers.reserve_first(|helper| helper.is_available())
}

/// Check, before any write, that every truck can be given its own driver.
///
/// Runs the real matching order against a scratch copy of the pool so a
/// request that would strand one truck without a driver is rejected whole.
pub fn ensure_driver_coverage(trucks: &[(TruckId, TruckType)], drivers: &ReservationSet<Driver>) -> Result<(), BookingError> {
    let available = drivers.available_count();
    if available == 0 {
        if let Some((truck, truck_type)) = trucks.first() {
            return Err(BookingError::NoDriversAvailable {
                truck: truck.clone(),
                truck_type: *truck_type,
            });
        }
        return Ok(());
    }
    if available < trucks.len() {
        return Err(BookingError::InsufficientDrivers {
            needed: trucks.len(),
            available,
        });
    }

    let mut scratch = drivers.clone();
    for (truck, truck_type) in trucks {
        if match_driver(*truck_type, &mut scratch).is_none() {
            return Err(BookingError::NoDriversAvailable {
                truck: truck.clone(),
                truck_type: *truck_type,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LicenseTier, StaffStatus};

    fn drivers(roster: &[(&str, LicenseTier)]) -> ReservationSet<Driver> {
        ReservationSet::new(
            roster.iter()
                .map(|(id, tier)| Driver::new(*id, format!("Driver {}", id), *tier))
                .collect(),
        )
    }

    #[test]
    fn test_basic_driver_never_matched_to_large_truck() {
        for truck_type in TruckType::ALL {
            let mut pool = drivers(&[("b1", LicenseTier::Basic), ("b2", LicenseTier::Basic)]);
            let slot = match_driver(truck_type, &mut pool);
            assert_eq!(slot.is_some(), truck_type.is_small(), "{}", truck_type);
        }
    }

    #[test]
    fn test_large_truck_skips_basic_driver() {
        let mut pool = drivers(&[("b1", LicenseTier::Basic), ("f1", LicenseTier::Full)]);
        let slot = match_driver(TruckType::TenWheeler, &mut pool).unwrap();
        assert_eq!(pool.get(slot).id.as_str(), "f1");

        // The basic driver is still free for a small truck.
        let slot = match_driver(TruckType::Mini, &mut pool).unwrap();
        assert_eq!(pool.get(slot).id.as_str(), "b1");
    }

    #[test]
    fn test_no_driver_reserved_twice() {
        let mut pool = drivers(&[("f1", LicenseTier::Full), ("f2", LicenseTier::Full)]);
        let first = match_driver(TruckType::Mini, &mut pool).unwrap();
        let second = match_driver(TruckType::Mini, &mut pool).unwrap();
        assert_ne!(first, second);
        assert!(match_driver(TruckType::Mini, &mut pool).is_none());
        assert_eq!(pool.available_count(), 0);
    }

    #[test]
    fn test_release_returns_driver_to_pool() {
        let mut pool = drivers(&[("f1", LicenseTier::Full)]);
        let slot = match_driver(TruckType::SixWheeler, &mut pool).unwrap();
        pool.release(slot);
        assert_eq!(match_driver(TruckType::SixWheeler, &mut pool), Some(slot));
    }

    #[test]
    fn test_inactive_driver_skipped() {
        let mut off = Driver::new("f0", "Off", LicenseTier::Full);
        off.status = StaffStatus::OnDuty;
        let mut pool = ReservationSet::new(vec![off, Driver::new("f1", "On", LicenseTier::Full)]);
        let slot = match_driver(TruckType::Mini, &mut pool).unwrap();
        assert_eq!(pool.get(slot).id.as_str(), "f1");
    }

    #[test]
    fn test_helper_matching_in_pool_order() {
        let mut pool = ReservationSet::new(vec![Helper::new("h1", "A"), Helper::new("h2", "B")]);
        let first = match_helper(&mut pool).unwrap();
        assert_eq!(pool.get(first).id.as_str(), "h1");
        let second = match_helper(&mut pool).unwrap();
        assert_eq!(pool.get(second).id.as_str(), "h2");
        assert_eq!(MatchScore::of(match_helper(&mut pool)), MatchScore::Unmatched);
    }

    #[test]
    fn test_coverage_counts_drivers() {
        let pool = drivers(&[("f1", LicenseTier::Full)]);
        let trucks = vec![
            (TruckId::new("t1"), TruckType::Mini),
            (TruckId::new("t2"), TruckType::Mini),
        ];
        let err = ensure_driver_coverage(&trucks, &pool).unwrap_err();
        assert!(matches!(err, BookingError::InsufficientDrivers { needed: 2, available: 1 }));
    }

    #[test]
    fn test_coverage_respects_license_tiers() {
        let pool = drivers(&[("b1", LicenseTier::Basic), ("b2", LicenseTier::Basic)]);
        let trucks = vec![
            (TruckId::new("t1"), TruckType::Mini),
            (TruckId::new("t2"), TruckType::EightWheeler),
        ];
        let err = ensure_driver_coverage(&trucks, &pool).unwrap_err();
        match err {
            BookingError::NoDriversAvailable { truck, truck_type } => {
                assert_eq!(truck.as_str(), "t2");
                assert_eq!(truck_type, TruckType::EightWheeler);
            }
            other => panic!("unexpected error: {other}"),
        }
        // The scratch run must not consume the real pool.
        assert_eq!(pool.available_count(), 2);
    }

    #[test]
    fn test_empty_pool_has_no_drivers() {
        let pool: ReservationSet<Driver> = ReservationSet::new(Vec::new());
        let trucks = vec![(TruckId::new("t1"), TruckType::Mini)];
        assert!(matches!(
            ensure_driver_coverage(&trucks, &pool),
            Err(BookingError::NoDriversAvailable { .. })
        ));
    }
}
