use crate::formatting::{format_currency, format_date, format_number, month_label};
use crate::fuel_record::{FuelRecord, Vehicle};
use crate::monthly_costs::YearMonth;
use crate::statistics::{FuelStatistics, sorted_chronologically};
use bigdecimal::{BigDecimal, RoundingMode};
use serde::Serialize;
use std::io::{self, Write};

/// Everything shown on a vehicle's fuel page, ready to be rendered.
pub struct Report<'a> {
    pub vehicle: Option<&'a Vehicle>,
    pub statistics: &'a FuelStatistics,
    /// Chronological; `None` when the record table is not wanted.
    pub records: Option<Vec<&'a FuelRecord>>,
    pub monthly: Vec<(YearMonth, BigDecimal)>,
    pub current_year: i16,
}

impl<'a> Report<'a> {
    pub fn new(
        vehicle: Option<&'a Vehicle>,
        records: &'a [FuelRecord],
        statistics: &'a FuelStatistics,
        today: YearMonth,
        months: usize,
        with_records: bool,
    ) -> Self {
        Self {
            vehicle,
            statistics,
            records: with_records.then(|| sorted_chronologically(records)),
            monthly: statistics.monthly_costs.trailing_months(today, months),
            current_year: today.year,
        }
    }

    pub fn write_text(&self, out: &mut impl Write) -> io::Result<()> {
        let stats = self.statistics;
        if let Some(title) = self.vehicle.and_then(Vehicle::title) {
            writeln!(out, "{}", title)?;
            writeln!(out)?;
        }
        let summary = [
            ("Tankeinträge", stats.record_count.to_string()),
            (
                "Durchschnittsverbrauch",
                format!(
                    "{} {}",
                    format_number(&stats.average_consumption, 2),
                    stats.consumption_unit
                ),
            ),
            ("Tankkosten gesamt", format_currency(&stats.total_cost)),
            (
                "Kosten pro km",
                format!("{}/km", format_currency(&stats.cost_per_distance)),
            ),
            (
                "Gefahrene Kilometer",
                format!(
                    "{} km",
                    format_number(&BigDecimal::from(stats.total_distance), 0)
                ),
            ),
        ];
        for (label, value) in summary {
            writeln!(out, "{:<24}{}", format!("{}:", label), value)?;
        }
        writeln!(
            out,
            "{:<24}{}",
            format!("Kosten {}:", self.current_year),
            format_currency(&stats.monthly_costs.total_for_year(self.current_year))
        )?;

        if let Some(records) = &self.records {
            writeln!(out)?;
            write_record_table(out, records)?;
        }

        if !self.monthly.is_empty() {
            writeln!(out)?;
            writeln!(out, "Monatliche Tankkosten:")?;
            for (month, cost) in &self.monthly {
                writeln!(out, "  {:<10} {:>14}", month_label(*month), format_currency(cost))?;
            }
        }
        Ok(())
    }

    pub fn to_document(&self) -> ReportDocument {
        let stats = self.statistics;
        ReportDocument {
            vehicle: self.vehicle.cloned(),
            record_count: stats.record_count,
            total_cost: stats.total_cost.clone(),
            total_distance: stats.total_distance,
            total_fuel: stats.total_fuel.clone(),
            average_consumption: stats
                .average_consumption
                .with_scale_round(2, RoundingMode::HalfUp),
            consumption_unit: stats.consumption_unit.label(),
            cost_per_distance: stats
                .cost_per_distance
                .with_scale_round(4, RoundingMode::HalfUp),
            current_year: self.current_year,
            current_year_cost: stats.monthly_costs.total_for_year(self.current_year),
            monthly_costs: stats
                .monthly_costs
                .iter()
                .map(|(month, total)| MonthlyCostEntry::new(month, total.clone()))
                .collect(),
            trailing_months: self
                .monthly
                .iter()
                .map(|(month, total)| MonthlyCostEntry::new(*month, total.clone()))
                .collect(),
            records: self
                .records
                .as_ref()
                .map(|records| records.iter().map(|record| RecordRow::from(*record)).collect()),
        }
    }
}

fn write_record_table(out: &mut impl Write, records: &[&FuelRecord]) -> io::Result<()> {
    if records.is_empty() {
        return writeln!(out, "Keine Tankkosten gefunden.");
    }
    writeln!(
        out,
        "{:<10}  {:<10}  {:>12}  {:>12}  {:>12}  {:>14}",
        "Datum", "Kraftstoff", "Menge", "Preis/Einh.", "Gesamt", "Kilometerstand"
    )?;
    for record in records {
        writeln!(
            out,
            "{:<10}  {:<10}  {:>12}  {:>12}  {:>12}  {:>14}",
            format_date(&record.date),
            record.fuel_type,
            format!(
                "{} {}",
                format_number(&record.amount, 2),
                record.fuel_type.amount_unit()
            ),
            format_currency(&record.price_per_unit),
            format_currency(&record.total_cost),
            format!("{} km", record.mileage),
        )?;
    }
    Ok(())
}

/// JSON form of a [`Report`]. Decimals serialize as strings.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    pub record_count: usize,
    pub total_cost: BigDecimal,
    pub total_distance: i64,
    pub total_fuel: BigDecimal,
    pub average_consumption: BigDecimal,
    pub consumption_unit: &'static str,
    pub cost_per_distance: BigDecimal,
    pub current_year: i16,
    pub current_year_cost: BigDecimal,
    pub monthly_costs: Vec<MonthlyCostEntry>,
    pub trailing_months: Vec<MonthlyCostEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<Vec<RecordRow>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCostEntry {
    pub year: i16,
    pub month: i8,
    pub label: String,
    pub total: BigDecimal,
}

impl MonthlyCostEntry {
    fn new(month: YearMonth, total: BigDecimal) -> Self {
        Self {
            year: month.year,
            month: month.month,
            label: month_label(month),
            total,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: String,
    pub fuel_type: &'static str,
    pub amount: BigDecimal,
    pub unit: &'static str,
    pub price_per_unit: BigDecimal,
    pub total_cost: BigDecimal,
    pub mileage: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<&FuelRecord> for RecordRow {
    fn from(record: &FuelRecord) -> Self {
        Self {
            id: record.id.clone(),
            date: record.date.strftime("%Y-%m-%dT%H:%M:%S%:z").to_string(),
            fuel_type: record.fuel_type.name(),
            amount: record.amount.clone(),
            unit: record.fuel_type.amount_unit(),
            price_per_unit: record.price_per_unit.clone(),
            total_cost: record.total_cost.clone(),
            mileage: record.mileage,
            location: record.location.clone(),
            receipt_number: record.receipt_number.clone(),
            notes: record.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuel_record::FuelType;
    use crate::fuel_record::fixtures::record;
    use crate::statistics::calculate_fuel_statistics;

    fn sample_records() -> Vec<FuelRecord> {
        vec![
            record("2024-02-10", FuelType::Diesel, "35", "59.50", 1500),
            record("2023-12-20", FuelType::Diesel, "40", "68.40", 1000),
        ]
    }

    fn render(report: &Report) -> String {
        let mut out = Vec::new();
        report.write_text(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn text_summary_shows_german_values() {
        let records = sample_records();
        let stats = calculate_fuel_statistics(&records);
        let vehicle = Vehicle {
            id: None,
            license_plate: Some("B-XY 123".to_owned()),
            brand: Some("VW".to_owned()),
            model: Some("Golf".to_owned()),
        };
        let report = Report::new(
            Some(&vehicle),
            &records,
            &stats,
            YearMonth::new(2024, 3),
            3,
            false,
        );
        let text = render(&report);

        assert!(text.starts_with("VW Golf (B-XY 123)\n"));
        assert!(text.contains("Durchschnittsverbrauch: 8,00 L/100km\n"));
        assert!(text.contains("Tankkosten gesamt:      127,90 €\n"));
        assert!(text.contains("Kosten pro km:          0,26 €/km\n"));
        assert!(text.contains("Gefahrene Kilometer:    500 km\n"));
        assert!(text.contains("Kosten 2024:            59,50 €\n"));
        assert!(text.contains("Jan. 2024"));
        assert!(!text.contains("Dez. 2023"));
        assert!(!text.contains("Datum"));
    }

    #[test]
    fn record_table_is_chronological() {
        let records = sample_records();
        let stats = calculate_fuel_statistics(&records);
        let report = Report::new(None, &records, &stats, YearMonth::new(2024, 3), 12, true);
        let text = render(&report);

        let december = text.find("20.12.2023").unwrap();
        let february = text.find("10.02.2024").unwrap();
        assert!(december < february);
        assert!(text.contains("40,00 L"));
        assert!(text.contains("1500 km"));

        let lines: Vec<&str> = text.lines().collect();
        let header = lines.iter().position(|line| line.starts_with("Datum")).unwrap();
        let amount_end = lines[header].find("Menge").unwrap() + "Menge".len();
        assert_eq!(
            lines[header].chars().count(),
            lines[header + 1].chars().count()
        );
        assert_eq!(&lines[header + 1][amount_end - 7..amount_end], "40,00 L");
        assert!(lines[header + 1].starts_with("20.12.2023  Diesel      "));
    }

    #[test]
    fn empty_table_says_so() {
        let stats = calculate_fuel_statistics(&[]);
        let report = Report::new(None, &[], &stats, YearMonth::new(2024, 3), 12, true);
        let text = render(&report);
        assert!(text.contains("Keine Tankkosten gefunden."));
        assert!(text.contains("Tankkosten gesamt:      0,00 €"));
    }

    #[test]
    fn json_document_carries_monthly_series() {
        let records = sample_records();
        let stats = calculate_fuel_statistics(&records);
        let report = Report::new(None, &records, &stats, YearMonth::new(2024, 2), 3, true);
        let json = serde_json::to_value(report.to_document()).unwrap();

        assert_eq!(json["recordCount"], 2);
        assert_eq!(json["totalDistance"], 500);
        assert_eq!(json["consumptionUnit"], "L/100km");
        assert_eq!(json["monthlyCosts"].as_array().unwrap().len(), 2);
        let trailing = json["trailingMonths"].as_array().unwrap();
        assert_eq!(trailing.len(), 3);
        assert_eq!(trailing[0]["label"], "Dez. 2023");
        assert_eq!(trailing[1]["month"], 1);
        assert_eq!(json["records"][0]["fuelType"], "Diesel");
        assert_eq!(json["records"][0]["date"], "2023-12-20T00:00:00+00:00");
        assert!(json.get("vehicle").is_none());
    }
}
