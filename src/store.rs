//! In-memory fleet document store.
//!
//! Documents (trucks, drivers, helpers, bookings) live behind a single
//! read/write lock. [`FleetStore::transaction`] holds the write lock for the
//! whole closure, which makes transactions serializable, and journals every
//! write so that an `Err` (or a panic) leaves no partial mutation behind.
//!
//! There is no per-truck locking: commits for unrelated trucks queue on the
//! same write lock. A transaction only touches in-memory maps, so the hold
//! time is a few map writes. Reads never wait on each other, and the
//! orchestrator does its matching, routing and pricing outside the lock.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;

use crate::model::{
    Allocation, AllocationId, AllocationState, AllocationStatus, Availability, Booking, BookingId, ClientId,
    Driver, DriverId, Helper, HelperId, Truck, TruckId,
};
use crate::rates::{RateRecord, RateTable};
use crate::traits::{Clock, SystemClock};

/// Committed view of every document in the store.
#[derive(Debug, Default, Clone)]
pub struct FleetState {
    trucks: BTreeMap<TruckId, Truck>,
    drivers: BTreeMap<DriverId, Driver>,
    helpers: BTreeMap<HelperId, Helper>,
    allocations: Vec<Allocation>,
    bookings: HashMap<BookingId, Booking>,
    /// (truck, scheduled date, booking) index for the conflict window query.
    schedule: BTreeSet<(TruckId, NaiveDate, BookingId)>,
    rates: RateTable,
}

impl FleetState {
    pub fn truck(&self, id: &TruckId) -> Option<&Truck> {
        self.trucks.get(id)
    }

    pub fn trucks(&self) -> impl Iterator<Item = &Truck> {
        self.trucks.values()
    }

    pub fn driver(&self, id: &DriverId) -> Option<&Driver> {
        self.drivers.get(id)
    }

    pub fn drivers(&self) -> impl Iterator<Item = &Driver> {
        self.drivers.values()
    }

    pub fn helper(&self, id: &HelperId) -> Option<&Helper> {
        self.helpers.get(id)
    }

    pub fn helpers(&self) -> impl Iterator<Item = &Helper> {
        self.helpers.values()
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn has_active_allocation(&self, client: &ClientId, truck: &TruckId) -> bool {
        self.allocations
            .iter()
            .any(|a| a.is_active() && &a.client == client && &a.truck == truck)
    }

    pub fn truck_is_allocated(&self, truck: &TruckId) -> bool {
        self.allocations.iter().any(|a| a.is_active() && &a.truck == truck)
    }

    pub fn booking(&self, id: &BookingId) -> Option<&Booking> {
        self.bookings.get(id)
    }

    pub fn bookings(&self) -> impl Iterator<Item = &Booking> {
        self.bookings.values()
    }

    /// Bookings of `truck` scheduled on any date in `from..=to`.
    pub fn bookings_for_truck(&self, truck: &TruckId, from: NaiveDate, to: NaiveDate) -> Vec<&Booking> {
        let lower = (truck.clone(), from, BookingId::MIN);
        let upper = (truck.clone(), to, BookingId::MAX);
        self.schedule
            .range(lower..=upper)
            .filter_map(|(_, _, id)| self.bookings.get(id))
            .collect()
    }

    /// Earliest active booking of `truck`, ignoring `exclude`.
    pub fn next_active_booking(&self, truck: &TruckId, exclude: Option<BookingId>) -> Option<&Booking> {
        self.bookings_for_truck(truck, NaiveDate::MIN, NaiveDate::MAX)
            .into_iter()
            .filter(|b| b.status.is_active() && Some(b.id) != exclude)
            .min_by_key(|b| b.scheduled_at)
    }

    pub fn rates(&self) -> &RateTable {
        &self.rates
    }

    fn restore_truck(&mut self, id: TruckId, previous: Option<Truck>) {
        match previous {
            Some(truck) => {
                self.trucks.insert(id, truck);
            }
            None => {
                self.trucks.remove(&id);
            }
        }
    }

    fn restore_driver(&mut self, id: DriverId, previous: Option<Driver>) {
        match previous {
            Some(driver) => {
                self.drivers.insert(id, driver);
            }
            None => {
                self.drivers.remove(&id);
            }
        }
    }

    fn restore_helper(&mut self, id: HelperId, previous: Option<Helper>) {
        match previous {
            Some(helper) => {
                self.helpers.insert(id, helper);
            }
            None => {
                self.helpers.remove(&id);
            }
        }
    }

    /// Replace (or remove) a booking document, keeping the schedule index in step.
    fn write_booking(&mut self, id: BookingId, booking: Option<Booking>) -> Option<Booking> {
        let previous = match booking {
            Some(booking) => {
                self.schedule.insert((booking.truck.clone(), booking.scheduled_date(), id));
                self.bookings.insert(id, booking)
            }
            None => self.bookings.remove(&id),
        };
        if let Some(old) = &previous {
            let still_indexed = self
                .bookings
                .get(&id)
                .is_some_and(|b| b.truck == old.truck && b.scheduled_date() == old.scheduled_date());
            if !still_indexed {
                self.schedule.remove(&(old.truck.clone(), old.scheduled_date(), id));
            }
        }
        previous
    }
}

enum Undo {
    Truck(TruckId, Option<Truck>),
    Driver(DriverId, Option<Driver>),
    Helper(HelperId, Option<Helper>),
    Booking(BookingId, Option<Booking>),
}

/// Open transaction. Writes are applied in place and undone on drop unless
/// the transaction committed.
pub struct Transaction<'a> {
    state: &'a mut FleetState,
    journal: Vec<Undo>,
    now: DateTime<Utc>,
}

impl<'a> Transaction<'a> {
    fn new(state: &'a mut FleetState, now: DateTime<Utc>) -> Self {
        Self {
            state,
            journal: Vec::new(),
            now,
        }
    }

    pub fn state(&self) -> &FleetState {
        self.state
    }

    /// Server-assigned timestamp for every write in this transaction.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn put_truck(&mut self, truck: Truck) {
        let id = truck.id.clone();
        let previous = self.state.trucks.insert(id.clone(), truck);
        self.journal.push(Undo::Truck(id, previous));
    }

    pub fn put_driver(&mut self, driver: Driver) {
        let id = driver.id.clone();
        let previous = self.state.drivers.insert(id.clone(), driver);
        self.journal.push(Undo::Driver(id, previous));
    }

    pub fn put_helper(&mut self, helper: Helper) {
        let id = helper.id.clone();
        let previous = self.state.helpers.insert(id.clone(), helper);
        self.journal.push(Undo::Helper(id, previous));
    }

    pub fn put_booking(&mut self, mut booking: Booking) {
        booking.updated_at = self.now;
        let id = booking.id;
        let previous = self.state.write_booking(id, Some(booking));
        self.journal.push(Undo::Booking(id, previous));
    }

    fn commit(&mut self) {
        self.journal.clear();
    }

    fn rollback(&mut self) {
        while let Some(undo) = self.journal.pop() {
            match undo {
                Undo::Truck(id, previous) => self.state.restore_truck(id, previous),
                Undo::Driver(id, previous) => self.state.restore_driver(id, previous),
                Undo::Helper(id, previous) => self.state.restore_helper(id, previous),
                Undo::Booking(id, previous) => {
                    self.state.write_booking(id, previous);
                }
            }
        }
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.journal.is_empty() {
            tracing::debug!(writes = self.journal.len(), "rolling back transaction");
            self.rollback();
        }
    }
}

/// Shared fleet store with serializable transactions.
///
/// One store-wide write lock serializes every commit, including commits for
/// different trucks.
pub struct FleetStore {
    state: RwLock<FleetState>,
    clock: Arc<dyn Clock>,
}

impl Default for FleetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FleetStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RwLock::new(FleetState::default()),
            clock,
        }
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Run a read-only query against the committed state.
    pub fn read<R>(&self, query: impl FnOnce(&FleetState) -> R) -> R {
        query(&*self.state.read())
    }

    /// Run `body` atomically. On `Ok` every write commits; on `Err` none do.
    pub fn transaction<T, E>(&self, body: impl FnOnce(&mut Transaction<'_>) -> Result<T, E>) -> Result<T, E> {
        let now = self.clock.now();
        let mut guard = self.state.write();
        let mut tx = Transaction::new(&mut *guard, now);
        let outcome = body(&mut tx);
        if outcome.is_ok() {
            tx.commit();
        }
        outcome
    }

    pub fn booking(&self, id: &BookingId) -> Option<Booking> {
        self.read(|state| state.booking(id).cloned())
    }

    pub fn truck(&self, id: &TruckId) -> Option<Truck> {
        self.read(|state| state.truck(id).cloned())
    }

    pub fn driver(&self, id: &DriverId) -> Option<Driver> {
        self.read(|state| state.driver(id).cloned())
    }

    pub fn helper(&self, id: &HelperId) -> Option<Helper> {
        self.read(|state| state.helper(id).cloned())
    }

    // ------------------------------------------------------------------------
    // Fleet administration. The CRUD surface around the engine uses these;
    // the engine itself only reads them back.
    // ------------------------------------------------------------------------

    pub fn insert_truck(&self, truck: Truck) {
        self.state.write().trucks.insert(truck.id.clone(), truck);
    }

    pub fn insert_driver(&self, driver: Driver) {
        self.state.write().drivers.insert(driver.id.clone(), driver);
    }

    pub fn insert_helper(&self, helper: Helper) {
        self.state.write().helpers.insert(helper.id.clone(), helper);
    }

    pub fn insert_rate(&self, rate: RateRecord) {
        self.state.write().rates.insert(rate);
    }

    /// Write a booking document as-is, e.g. when importing existing data.
    pub fn insert_booking(&self, booking: Booking) {
        self.state.write().write_booking(booking.id, Some(booking));
    }

    /// Grant `client` long-term access to `truck`.
    pub fn allocate(&self, client: &ClientId, truck: &TruckId) -> AllocationId {
        let mut state = self.state.write();
        let id = AllocationId::new(format!("alloc-{}", state.allocations.len() + 1));
        state.allocations.push(Allocation {
            id: id.clone(),
            client: client.clone(),
            truck: truck.clone(),
            status: AllocationStatus::Active,
        });
        if let Some(t) = state.trucks.get_mut(truck) {
            t.allocation = AllocationState::Allocated;
        }
        id
    }

    /// End an allocation. The truck drops to unallocated once no active
    /// allocation references it.
    pub fn return_allocation(&self, id: &AllocationId) -> bool {
        let mut state = self.state.write();
        let Some(allocation) = state.allocations.iter_mut().find(|a| &a.id == id && a.is_active()) else {
            return false;
        };
        allocation.status = AllocationStatus::Returned;
        let truck = allocation.truck.clone();
        if !state.truck_is_allocated(&truck) {
            if let Some(t) = state.trucks.get_mut(&truck) {
                t.allocation = AllocationState::Unallocated;
                if t.current_booking.is_none() {
                    t.availability = Availability::Free;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LicenseTier, StaffStatus, TruckType};

    fn store_with_truck() -> FleetStore {
        let store = FleetStore::new();
        store.insert_truck(Truck::new("t1", "AAA-111", TruckType::Mini, 2.0));
        store.insert_driver(Driver::new("d1", "Dana", LicenseTier::Basic));
        store
    }

    #[test]
    fn test_readers_do_not_block_each_other() {
        let store = store_with_truck();
        let seen = store.read(|outer| {
            let inner = std::thread::scope(|scope| scope.spawn(|| store.truck(&TruckId::new("t1"))).join());
            (outer.truck(&TruckId::new("t1")).is_some(), inner.ok().flatten().is_some())
        });
        assert_eq!(seen, (true, true));
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let store = store_with_truck();
        let result: Result<(), String> = store.transaction(|tx| {
            let mut truck = tx.state().truck(&TruckId::new("t1")).cloned().ok_or("missing")?;
            truck.availability = Availability::Busy;
            tx.put_truck(truck);
            Ok(())
        });
        assert!(result.is_ok());
        assert_eq!(store.truck(&TruckId::new("t1")).unwrap().availability, Availability::Busy);
    }

    #[test]
    fn test_transaction_rolls_back_every_write_on_err() {
        let store = store_with_truck();
        let result: Result<(), &str> = store.transaction(|tx| {
            let mut truck = tx.state().truck(&TruckId::new("t1")).cloned().unwrap();
            truck.availability = Availability::Busy;
            tx.put_truck(truck);

            let mut driver = tx.state().driver(&DriverId::new("d1")).cloned().unwrap();
            driver.status = StaffStatus::OnDuty;
            tx.put_driver(driver);

            tx.put_helper(Helper::new("h-new", "Hal"));
            Err("abort")
        });

        assert_eq!(result, Err("abort"));
        assert_eq!(store.truck(&TruckId::new("t1")).unwrap().availability, Availability::Free);
        assert_eq!(store.driver(&DriverId::new("d1")).unwrap().status, StaffStatus::Active);
        assert!(store.helper(&HelperId::new("h-new")).is_none());
    }

    #[test]
    fn test_allocation_lifecycle_updates_truck_axis() {
        let store = store_with_truck();
        let client = ClientId::new("c1");
        let truck = TruckId::new("t1");

        let first = store.allocate(&client, &truck);
        let second = store.allocate(&ClientId::new("c2"), &truck);
        assert_eq!(store.truck(&truck).unwrap().allocation, AllocationState::Allocated);

        assert!(store.return_allocation(&first));
        assert_eq!(store.truck(&truck).unwrap().allocation, AllocationState::Allocated);

        assert!(store.return_allocation(&second));
        assert_eq!(store.truck(&truck).unwrap().allocation, AllocationState::Unallocated);
        assert!(!store.return_allocation(&second));
    }
}
