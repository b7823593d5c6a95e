//! Fleet domain records: trucks, allocations, staff and bookings.
//!
//! Every status is a single strongly typed enum. Legacy spellings found in
//! older documents are accepted on deserialization through serde aliases;
//! serialization always writes the canonical snake_case form.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Client account that books deliveries.
    ClientId
);
string_id!(TruckId);
string_id!(DriverId);
string_id!(HelperId);
string_id!(AllocationId);

/// Server-assigned booking identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(pub Uuid);

impl BookingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub(crate) const MIN: BookingId = BookingId(Uuid::nil());
    pub(crate) const MAX: BookingId = BookingId(Uuid::from_u128(u128::MAX));
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ============================================================================
// Trucks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TruckType {
    #[serde(rename = "mini", alias = "Mini", alias = "mini_truck", alias = "mini-truck")]
    Mini,
    #[serde(rename = "4_wheeler", alias = "4-wheeler", alias = "4 Wheeler", alias = "four_wheeler")]
    FourWheeler,
    #[serde(rename = "6_wheeler", alias = "6-wheeler", alias = "6 Wheeler", alias = "six_wheeler")]
    SixWheeler,
    #[serde(rename = "8_wheeler", alias = "8-wheeler", alias = "8 Wheeler", alias = "eight_wheeler")]
    EightWheeler,
    #[serde(rename = "10_wheeler", alias = "10-wheeler", alias = "10 Wheeler", alias = "ten_wheeler")]
    TenWheeler,
}

impl TruckType {
    pub const ALL: [TruckType; 5] = [
        TruckType::Mini,
        TruckType::FourWheeler,
        TruckType::SixWheeler,
        TruckType::EightWheeler,
        TruckType::TenWheeler,
    ];

    /// Small vehicles may be driven on a basic license.
    pub fn is_small(self) -> bool {
        matches!(self, TruckType::Mini | TruckType::FourWheeler)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TruckType::Mini => "mini",
            TruckType::FourWheeler => "4_wheeler",
            TruckType::SixWheeler => "6_wheeler",
            TruckType::EightWheeler => "8_wheeler",
            TruckType::TenWheeler => "10_wheeler",
        }
    }
}

impl fmt::Display for TruckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the truck is currently allocated to at least one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationState {
    #[serde(alias = "Unallocated", alias = "available")]
    Unallocated,
    #[serde(alias = "Allocated")]
    Allocated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationalStatus {
    #[serde(alias = "Active")]
    Active,
    #[serde(alias = "Maintenance", alias = "under_maintenance")]
    Maintenance,
    #[serde(alias = "Out of Service", alias = "out-of-service", alias = "outOfService")]
    OutOfService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    #[serde(alias = "Free", alias = "idle")]
    Free,
    #[serde(alias = "Busy", alias = "in_use", alias = "In Use", alias = "in-use", alias = "inUse")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Truck {
    pub id: TruckId,
    pub plate: String,
    pub truck_type: TruckType,
    /// Maximum cargo weight in tonnes.
    pub capacity: f64,
    pub allocation: AllocationState,
    pub operational: OperationalStatus,
    pub availability: Availability,
    pub current_booking: Option<BookingId>,
    pub total_distance_km: f64,
    pub completed_trips: u32,
}

impl Truck {
    pub fn new(id: impl Into<String>, plate: impl Into<String>, truck_type: TruckType, capacity: f64) -> Self {
        Self {
            id: TruckId::new(id),
            plate: plate.into(),
            truck_type,
            capacity,
            allocation: AllocationState::Unallocated,
            operational: OperationalStatus::Active,
            availability: Availability::Free,
            current_booking: None,
            total_distance_km: 0.0,
            completed_trips: 0,
        }
    }

    pub fn is_operational(&self) -> bool {
        self.operational == OperationalStatus::Active
    }

    /// Dashboard label combining the three status axes.
    pub fn status_label(&self) -> &'static str {
        match (self.operational, self.availability, self.allocation) {
            (OperationalStatus::Maintenance, _, _) => "maintenance",
            (OperationalStatus::OutOfService, _, _) => "out_of_service",
            (OperationalStatus::Active, Availability::Busy, _) => "in_use",
            (OperationalStatus::Active, Availability::Free, AllocationState::Allocated) => "free",
            (OperationalStatus::Active, Availability::Free, AllocationState::Unallocated) => "available",
        }
    }
}

// ============================================================================
// Allocations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    #[serde(alias = "Active", alias = "allocated")]
    Active,
    #[serde(alias = "Returned", alias = "deallocated")]
    Returned,
}

/// Long-term grant of a truck to a client, independent of any booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: AllocationId,
    pub client: ClientId,
    pub truck: TruckId,
    pub status: AllocationStatus,
}

impl Allocation {
    pub fn is_active(&self) -> bool {
        self.status == AllocationStatus::Active
    }
}

// ============================================================================
// Staff
// ============================================================================

/// Coarse license tier carried by drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseTier {
    #[serde(alias = "Basic", alias = "non_professional", alias = "non-professional")]
    Basic,
    #[serde(alias = "Full", alias = "professional")]
    Full,
}

impl LicenseTier {
    pub fn authorizes(self, truck_type: TruckType) -> bool {
        match self {
            LicenseTier::Full => true,
            LicenseTier::Basic => truck_type.is_small(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffStatus {
    #[serde(alias = "Active", alias = "available", alias = "Available")]
    Active,
    #[serde(alias = "On Duty", alias = "on-duty", alias = "onDuty", alias = "OnDuty")]
    OnDuty,
    #[serde(alias = "Unavailable", alias = "inactive")]
    Unavailable,
    #[serde(alias = "Terminated")]
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    pub license: LicenseTier,
    pub status: StaffStatus,
}

impl Driver {
    pub fn new(id: impl Into<String>, name: impl Into<String>, license: LicenseTier) -> Self {
        Self {
            id: DriverId::new(id),
            name: name.into(),
            license,
            status: StaffStatus::Active,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == StaffStatus::Active
    }

    pub fn can_drive(&self, truck_type: TruckType) -> bool {
        self.is_available() && self.license.authorizes(truck_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Helper {
    pub id: HelperId,
    pub name: String,
    pub status: StaffStatus,
}

impl Helper {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: HelperId::new(id),
            name: name.into(),
            status: StaffStatus::Active,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == StaffStatus::Active
    }
}

// ============================================================================
// Route and pricing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub phone: String,
}

/// A validated pickup or dropoff point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub location: String,
    pub coordinates: Coordinates,
    pub contact: Contact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    Osrm,
    Haversine,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub source: RouteSource,
}

/// Which formula produced a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingSource {
    RateTable,
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub source: PricingSource,
    pub base_rate: f64,
    pub rate_per_km: f64,
    pub distance_cost: f64,
    pub weight_cost: f64,
    pub total: f64,
}

// ============================================================================
// Bookings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[serde(alias = "Pending")]
    Pending,
    #[serde(alias = "In Progress", alias = "in-progress", alias = "inProgress", alias = "InProgress")]
    InProgress,
    #[serde(alias = "Started")]
    Started,
    #[serde(alias = "Picked Up", alias = "picked-up", alias = "pickedUp", alias = "PickedUp")]
    PickedUp,
    #[serde(alias = "Delivered")]
    Delivered,
    #[serde(alias = "Completed")]
    Completed,
    #[serde(alias = "Cancelled", alias = "canceled")]
    Cancelled,
}

impl BookingStatus {
    /// Active bookings hold their truck's cooldown window.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::InProgress | BookingStatus::Started | BookingStatus::PickedUp
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingStatus::Delivered | BookingStatus::Completed | BookingStatus::Cancelled
        )
    }

    /// Terminal states that count as a finished trip for the truck.
    pub fn is_fulfilled(self) -> bool {
        matches!(self, BookingStatus::Delivered | BookingStatus::Completed)
    }

    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;
        match (self, next) {
            (Pending, InProgress | Cancelled) => true,
            (InProgress, Started | PickedUp | Delivered | Completed) => true,
            (Started, PickedUp | Delivered | Completed) => true,
            (PickedUp, Delivered | Completed) => true,
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Started => "started",
            BookingStatus::PickedUp => "picked_up",
            BookingStatus::Delivered => "delivered",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Staffing state of one seat (driver or helper) on a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    #[serde(alias = "awaiting-approval", alias = "awaitingApproval")]
    AwaitingApproval,
    #[serde(alias = "awaiting-driver", alias = "awaitingDriver")]
    AwaitingDriver,
    #[serde(alias = "awaiting-helper", alias = "awaitingHelper")]
    AwaitingHelper,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub client: ClientId,
    pub truck: TruckId,
    pub driver: Option<DriverId>,
    pub helper: Option<HelperId>,
    pub driver_assignment: AssignmentStatus,
    pub helper_assignment: AssignmentStatus,
    pub scheduled_at: DateTime<Utc>,
    pub pickup: Stop,
    pub dropoff: Stop,
    /// This truck's share of the request, in tonnes.
    pub cargo_weight: f64,
    pub total_cargo_weight: f64,
    pub route: RouteEstimate,
    pub quote: Quote,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn scheduled_date(&self) -> NaiveDate {
        self.scheduled_at.date_naive()
    }
}
