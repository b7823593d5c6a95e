//! Read-only resource queries over the committed fleet state.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::model::{ClientId, Driver, Helper, Truck, TruckId};
use crate::store::FleetState;

/// Trucks actively allocated to `client` and operationally active.
pub fn list_eligible_trucks(state: &FleetState, client: &ClientId) -> Vec<Truck> {
    let allocated: HashSet<&TruckId> = state
        .allocations()
        .iter()
        .filter(|a| a.is_active() && &a.client == client)
        .map(|a| &a.truck)
        .collect();
    if allocated.is_empty() {
        return Vec::new();
    }

    let trucks: Vec<&Truck> = state.trucks().collect();
    trucks
        .par_iter()
        .filter(|truck| allocated.contains(&truck.id) && truck.is_operational())
        .map(|truck| (*truck).clone())
        .collect()
}

pub fn list_available_drivers(state: &FleetState) -> Vec<Driver> {
    state.drivers().filter(|d| d.is_available()).cloned().collect()
}

pub fn list_available_helpers(state: &FleetState) -> Vec<Helper> {
    state.helpers().filter(|h| h.is_available()).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LicenseTier, OperationalStatus, StaffStatus, TruckType};
    use crate::store::FleetStore;

    #[test]
    fn test_eligible_trucks_require_allocation_and_active() {
        let store = FleetStore::new();
        let client = ClientId::new("c1");
        store.insert_truck(Truck::new("t1", "AAA-111", TruckType::Mini, 2.0));
        let mut broken = Truck::new("t2", "BBB-222", TruckType::SixWheeler, 8.0);
        broken.operational = OperationalStatus::Maintenance;
        store.insert_truck(broken);
        store.insert_truck(Truck::new("t3", "CCC-333", TruckType::SixWheeler, 8.0));

        store.allocate(&client, &TruckId::new("t1"));
        store.allocate(&client, &TruckId::new("t2"));
        store.allocate(&ClientId::new("other"), &TruckId::new("t3"));

        let eligible = store.read(|state| list_eligible_trucks(state, &client));
        let ids: Vec<_> = eligible.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1"]);
    }

    #[test]
    fn test_empty_fleet_returns_empty_lists() {
        let store = FleetStore::new();
        store.read(|state| {
            assert!(list_eligible_trucks(state, &ClientId::new("nobody")).is_empty());
            assert!(list_available_drivers(state).is_empty());
            assert!(list_available_helpers(state).is_empty());
        });
    }

    #[test]
    fn test_only_active_staff_listed() {
        let store = FleetStore::new();
        store.insert_driver(Driver::new("d1", "Ana", LicenseTier::Full));
        let mut busy = Driver::new("d2", "Ben", LicenseTier::Full);
        busy.status = StaffStatus::OnDuty;
        store.insert_driver(busy);
        store.insert_helper(Helper::new("h1", "Cy"));
        let mut gone = Helper::new("h2", "Di");
        gone.status = StaffStatus::Terminated;
        store.insert_helper(gone);

        let (drivers, helpers) = store.read(|state| (list_available_drivers(state), list_available_helpers(state)));
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].id.as_str(), "d1");
        assert_eq!(helpers.len(), 1);
        assert_eq!(helpers[0].id.as_str(), "h1");
    }
}
