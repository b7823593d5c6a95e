//! Job pricing from the per-vehicle-type rate table.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::FallbackPricing;
use crate::error::BookingError;
use crate::model::{PricingSource, Quote, TruckType};

/// Configured fare for one vehicle type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub truck_type: TruckType,
    pub base_rate: f64,
    pub rate_per_km: f64,
}

#[derive(Debug, Clone, Default)]
pub struct RateTable {
    rates: HashMap<TruckType, RateRecord>,
}

impl RateTable {
    pub fn insert(&mut self, rate: RateRecord) {
        self.rates.insert(rate.truck_type, rate);
    }

    pub fn get(&self, truck_type: TruckType) -> Option<&RateRecord> {
        self.rates.get(&truck_type)
    }
}

impl FromIterator<RateRecord> for RateTable {
    fn from_iter<I: IntoIterator<Item = RateRecord>>(iter: I) -> Self {
        let mut table = RateTable::default();
        for rate in iter {
            table.insert(rate);
        }
        table
    }
}

/// How a job is priced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PricingStrategy {
    /// `base_rate + rate_per_km * distance`.
    RateTable(RateRecord),
    /// `distance * per_km + weight * per_weight_unit`, for unconfigured vehicle types.
    Heuristic(FallbackPricing),
}

impl PricingStrategy {
    pub fn quote(&self, distance_km: f64, cargo_weight: f64) -> Quote {
        match self {
            PricingStrategy::RateTable(rate) => {
                let distance_cost = round_cents(rate.rate_per_km * distance_km);
                Quote {
                    source: PricingSource::RateTable,
                    base_rate: rate.base_rate,
                    rate_per_km: rate.rate_per_km,
                    distance_cost,
                    weight_cost: 0.0,
                    total: round_cents(rate.base_rate + distance_cost),
                }
            }
            PricingStrategy::Heuristic(fallback) => {
                let distance_cost = round_cents(fallback.per_km * distance_km);
                let weight_cost = round_cents(fallback.per_weight_unit * cargo_weight);
                Quote {
                    source: PricingSource::Heuristic,
                    base_rate: 0.0,
                    rate_per_km: fallback.per_km,
                    distance_cost,
                    weight_cost,
                    total: round_cents(distance_cost + weight_cost),
                }
            }
        }
    }
}

/// Price a job strictly from the rate table.
pub fn price(table: &RateTable, truck_type: TruckType, distance_km: f64, cargo_weight: f64) -> Result<Quote, BookingError> {
    let rate = table
        .get(truck_type)
        .ok_or(BookingError::RateNotConfigured { truck_type })?;
    Ok(PricingStrategy::RateTable(*rate).quote(distance_km, cargo_weight))
}

/// Price from the rate table, degrading to the heuristic formula when the
/// vehicle type has no configured rate.
pub fn quote_or_fallback(
    table: &RateTable,
    truck_type: TruckType,
    fallback: FallbackPricing,
    distance_km: f64,
    cargo_weight: f64,
) -> Quote {
    match price(table, truck_type, distance_km, cargo_weight) {
        Ok(quote) => quote,
        Err(err) => {
            tracing::warn!(%truck_type, reason = %err, "using heuristic pricing");
            PricingStrategy::Heuristic(fallback).quote(distance_km, cargo_weight)
        }
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
