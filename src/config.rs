//! Engine configuration.

use std::time::Duration;

use crate::model::Coordinates;

/// Minimum notice between booking time and schedule. Not configurable.
pub const MIN_LEAD_TIME_HOURS: i64 = 24;

/// What to do when the requested trucks cannot carry the whole load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapacityPolicy {
    /// Abort the request before any booking is written.
    Reject,
    /// Book what fits and report the shortfall.
    #[default]
    WarnAndProceed,
}

/// Distance/weight heuristic used when a truck type has no rate row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackPricing {
    pub per_km: f64,
    pub per_weight_unit: f64,
}

impl Default for FallbackPricing {
    fn default() -> Self {
        Self {
            per_km: 15.0,
            per_weight_unit: 50.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum gap between two active bookings of one truck.
    pub cooldown_hours: i64,
    /// Overall budget for one booking request.
    pub request_timeout: Duration,
    pub capacity_policy: CapacityPolicy,
    pub fallback_pricing: FallbackPricing,
    /// Substituted for missing pickup/dropoff coordinates.
    pub depot: Coordinates,
    /// Shortest accepted pickup/dropoff location text.
    pub min_location_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cooldown_hours: 12,
            request_timeout: Duration::from_secs(30),
            capacity_policy: CapacityPolicy::default(),
            fallback_pricing: FallbackPricing::default(),
            depot: Coordinates::new(14.5995, 120.9842),
            min_location_len: 5,
        }
    }
}

impl EngineConfig {
    pub fn with_capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.capacity_policy = policy;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_cooldown_hours(mut self, hours: i64) -> Self {
        self.cooldown_hours = hours;
        self
    }
}
