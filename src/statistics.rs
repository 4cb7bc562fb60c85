use crate::fuel_record::{FuelRecord, FuelType};
use crate::monthly_costs::MonthlyCosts;
use bigdecimal::{BigDecimal, Zero};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumptionUnit {
    LitersPer100Km,
    KwhPer100Km,
}

impl ConsumptionUnit {
    pub fn label(self) -> &'static str {
        match self {
            ConsumptionUnit::LitersPer100Km => "L/100km",
            ConsumptionUnit::KwhPer100Km => "kWh/100km",
        }
    }
}

impl fmt::Display for ConsumptionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct FuelStatistics {
    pub record_count: usize,
    pub total_cost: BigDecimal,
    /// Sum of positive odometer deltas, in km.
    pub total_distance: i64,
    /// Fuel attributed to the counted intervals.
    pub total_fuel: BigDecimal,
    pub average_consumption: BigDecimal,
    pub consumption_unit: ConsumptionUnit,
    pub cost_per_distance: BigDecimal,
    pub monthly_costs: MonthlyCosts,
}

/// Records ordered by date, oldest first. Records with equal dates keep their input order.
pub fn sorted_chronologically(records: &[FuelRecord]) -> Vec<&FuelRecord> {
    let mut sorted: Vec<&FuelRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.date.timestamp());
    sorted
}

pub fn calculate_fuel_statistics(records: &[FuelRecord]) -> FuelStatistics {
    let sorted = sorted_chronologically(records);

    let mut total_cost = BigDecimal::zero();
    let mut monthly_costs = MonthlyCosts::default();
    for record in &sorted {
        total_cost += &record.total_cost;
        monthly_costs.add(record.year_month(), &record.total_cost);
    }

    let mut total_distance: i64 = 0;
    let mut total_fuel = BigDecimal::zero();
    for pair in sorted.windows(2) {
        let (previous, current) = (pair[0], pair[1]);
        let distance = current.mileage.saturating_sub(previous.mileage);
        if distance <= 0 {
            log::debug!(
                "Ignoring interval {} -> {}: mileage went from {} to {}",
                previous.date.date(),
                current.date.date(),
                previous.mileage,
                current.mileage
            );
            continue;
        }
        total_distance += distance;
        // The fuel bought at the start of an interval is what got the vehicle to the next stop.
        if current.fuel_type == previous.fuel_type && current.fuel_type.is_combustible() {
            total_fuel += &previous.amount;
        }
    }

    let distance = BigDecimal::from(total_distance);
    let average_consumption = if total_distance > 0 && total_fuel > BigDecimal::zero() {
        &total_fuel / &distance * BigDecimal::from(100)
    } else {
        BigDecimal::zero()
    };
    // Decided by the first record alone, even when the vehicle later switched fuel types.
    let consumption_unit = match sorted.first() {
        Some(first) if first.fuel_type == FuelType::Elektro => ConsumptionUnit::KwhPer100Km,
        _ => ConsumptionUnit::LitersPer100Km,
    };
    let cost_per_distance = if total_distance > 0 {
        &total_cost / &distance
    } else {
        BigDecimal::zero()
    };

    log::debug!(
        "Calculated statistics over {} records: {} km, {} fuel, {} total cost",
        sorted.len(),
        total_distance,
        total_fuel,
        total_cost
    );

    FuelStatistics {
        record_count: records.len(),
        total_cost,
        total_distance,
        total_fuel,
        average_consumption,
        consumption_unit,
        cost_per_distance,
        monthly_costs,
    }
}
