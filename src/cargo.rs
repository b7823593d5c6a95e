//! Greedy cargo split across the requested trucks.

use crate::model::TruckId;

/// Leftover weight below this is treated as zero.
const WEIGHT_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct TruckCapacity {
    pub truck: TruckId,
    pub capacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CargoAssignment {
    pub truck: TruckId,
    pub capacity: f64,
    pub assigned: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    /// Trucks that received cargo, largest first.
    pub assignments: Vec<CargoAssignment>,
    /// Trucks left empty because the load ran out before reaching them.
    pub unused: Vec<TruckId>,
    /// Weight no truck could take.
    pub remainder: f64,
    pub total_capacity: f64,
}

impl Distribution {
    pub fn assigned_total(&self) -> f64 {
        self.assignments.iter().map(|a| a.assigned).sum()
    }

    pub fn is_short(&self) -> bool {
        self.remainder > 0.0
    }
}

/// Fill trucks largest-capacity first until `total_weight` is placed.
///
/// The sort is stable, so equal capacities keep their input order and the
/// result is the same for the same input every time.
pub fn distribute(total_weight: f64, trucks: &[TruckCapacity]) -> Distribution {
    let mut order: Vec<&TruckCapacity> = trucks.iter().collect();
    order.sort_by(|a, b| b.capacity.total_cmp(&a.capacity));

    let mut remaining = total_weight.max(0.0);
    let mut assignments = Vec::new();
    let mut unused = Vec::new();

    for truck in order {
        if remaining <= WEIGHT_EPSILON || truck.capacity <= 0.0 {
            unused.push(truck.truck.clone());
            continue;
        }
        let assigned = remaining.min(truck.capacity);
        remaining -= assigned;
        assignments.push(CargoAssignment {
            truck: truck.truck.clone(),
            capacity: truck.capacity,
            assigned,
        });
    }

    if remaining <= WEIGHT_EPSILON {
        remaining = 0.0;
    }

    Distribution {
        assignments,
        unused,
        remainder: remaining,
        total_capacity: trucks.iter().map(|t| t.capacity.max(0.0)).sum(),
    }
}
