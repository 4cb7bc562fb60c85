use crate::monthly_costs::YearMonth;
use bigdecimal::BigDecimal;
use jiff::Zoned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuelType {
    Diesel,
    Benzin,
    Gas,
    Elektro,
}

impl FuelType {
    /// Liquid and gaseous fuels. Only refills of these count towards consumption.
    pub fn is_combustible(self) -> bool {
        matches!(self, FuelType::Diesel | FuelType::Benzin | FuelType::Gas)
    }

    /// Unit the dispensed amount is measured in.
    pub fn amount_unit(self) -> &'static str {
        match self {
            FuelType::Elektro => "kWh",
            FuelType::Diesel | FuelType::Benzin | FuelType::Gas => "L",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FuelType::Diesel => "Diesel",
            FuelType::Benzin => "Benzin",
            FuelType::Gas => "Gas",
            FuelType::Elektro => "Elektro",
        }
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown fuel type {0:?}")]
pub struct UnknownFuelType(pub String);

impl FromStr for FuelType {
    type Err = UnknownFuelType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "diesel" => Ok(FuelType::Diesel),
            "benzin" | "gasoline" | "petrol" => Ok(FuelType::Benzin),
            "gas" | "lpg" | "cng" | "autogas" => Ok(FuelType::Gas),
            "elektro" | "electric" | "strom" => Ok(FuelType::Elektro),
            _ => Err(UnknownFuelType(s.to_owned())),
        }
    }
}

/// One refueling (or recharging) event of a vehicle.
#[derive(Debug, Clone)]
pub struct FuelRecord {
    pub id: Option<String>,
    pub date: Zoned,
    pub fuel_type: FuelType,
    /// Liters, or kWh for [`FuelType::Elektro`].
    pub amount: BigDecimal,
    pub price_per_unit: BigDecimal,
    pub total_cost: BigDecimal,
    /// Odometer reading in km.
    pub mileage: i64,
    pub location: Option<String>,
    pub receipt_number: Option<String>,
    pub notes: Option<String>,
}

impl FuelRecord {
    pub fn year_month(&self) -> YearMonth {
        YearMonth::of(&self.date)
    }
}

/// Descriptive header of the vehicle the records belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    #[serde(default, deserialize_with = "crate::record_loader::lenient_text")]
    pub id: Option<String>,
    #[serde(default)]
    pub license_plate: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

impl Vehicle {
    /// `"VW Golf (B-XY 123)"`, or whatever parts of it are known.
    pub fn title(&self) -> Option<String> {
        let name = [self.brand.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let plate = self
            .license_plate
            .as_deref()
            .map(str::trim)
            .filter(|plate| !plate.is_empty());
        match (name.is_empty(), plate) {
            (false, Some(plate)) => Some(format!("{} ({})", name, plate)),
            (false, None) => Some(name),
            (true, Some(plate)) => Some(plate.to_owned()),
            (true, None) => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use jiff::civil::Date;
    use jiff::tz::TimeZone;

    /// Record dated at midnight UTC on `date` (`YYYY-MM-DD`).
    pub fn record(
        date: &str,
        fuel_type: FuelType,
        amount: &str,
        total_cost: &str,
        mileage: i64,
    ) -> FuelRecord {
        FuelRecord {
            id: None,
            date: Date::from_str(date)
                .unwrap()
                .to_zoned(TimeZone::UTC)
                .unwrap(),
            fuel_type,
            amount: BigDecimal::from_str(amount).unwrap(),
            price_per_unit: BigDecimal::from(0),
            total_cost: BigDecimal::from_str(total_cost).unwrap(),
            mileage,
            location: None,
            receipt_number: None,
            notes: None,
        }
    }
}
