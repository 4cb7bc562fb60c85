use crate::fuel_record::{FuelRecord, FuelType, UnknownFuelType, Vehicle};
use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};
use csv::StringRecord;
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use jiff::{Timestamp, Zoned};
use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot tell the format of {} from its extension, pass --format", .0.display())]
    UnknownFormat(PathBuf),
    #[error("malformed JSON input")]
    Json(#[from] serde_json::Error),
    #[error("malformed CSV input")]
    Csv(#[from] csv::Error),
    #[error("CSV input is missing the required column `{0}`")]
    MissingColumn(&'static str),
    #[error("record {index}: no date given")]
    MissingDate { index: usize },
    #[error("record {index}: invalid date {value:?}")]
    InvalidDate {
        index: usize,
        value: String,
        #[source]
        source: jiff::Error,
    },
    #[error("record {index}: {source}")]
    FuelType {
        index: usize,
        #[source]
        source: UnknownFuelType,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(InputFormat::Csv),
            Some("json") => Ok(InputFormat::Json),
            _ => Err(LoadError::UnknownFormat(path.to_owned())),
        }
    }
}

#[derive(Debug)]
pub struct LoadedRecords {
    pub vehicle: Option<Vehicle>,
    pub records: Vec<FuelRecord>,
}

pub fn load_records(
    path: &Path,
    format: InputFormat,
    time_zone: &TimeZone,
) -> Result<LoadedRecords, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_owned(),
        source,
    })?;
    let reader = BufReader::new(file);
    match format {
        InputFormat::Csv => parse_csv(reader, time_zone),
        InputFormat::Json => parse_json(reader, time_zone),
    }
}

/// Fuel record as delivered by the fleet manager, before any interpretation.
/// Every field is kept as text so JSON numbers and CSV cells go through the same coercion.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFuelRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    fuel_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    amount: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    price_per_unit: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    total_cost: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    mileage: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    receipt_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    notes: Option<String>,
}

impl RawFuelRecord {
    /// `index` is 1-based and only used for diagnostics.
    fn into_record(self, index: usize, time_zone: &TimeZone) -> Result<FuelRecord, LoadError> {
        let date_text = non_empty(self.date).ok_or(LoadError::MissingDate { index })?;
        let date = parse_date(&date_text, time_zone).map_err(|source| LoadError::InvalidDate {
            index,
            value: date_text.clone(),
            source,
        })?;
        let fuel_type = FuelType::from_str(self.fuel_type.as_deref().unwrap_or_default())
            .map_err(|source| LoadError::FuelType { index, source })?;

        let amount = parse_decimal(index, "amount", self.amount.as_deref()).unwrap_or_default();
        let price_per_unit =
            parse_decimal(index, "pricePerUnit", self.price_per_unit.as_deref())
                .unwrap_or_default();
        let total_cost = match parse_decimal(index, "totalCost", self.total_cost.as_deref()) {
            Some(total_cost) => total_cost,
            None if amount > BigDecimal::zero() && price_per_unit > BigDecimal::zero() => {
                (&amount * &price_per_unit).with_scale_round(2, RoundingMode::HalfUp)
            }
            None => {
                log::warn!("Record {}: no total cost and no price to derive it from", index);
                BigDecimal::zero()
            }
        };
        let mileage = parse_decimal(index, "mileage", self.mileage.as_deref())
            .map(|mileage| {
                mileage.with_scale(0).to_i64().unwrap_or_else(|| {
                    log::warn!("Record {}: mileage {} out of range, using 0", index, mileage);
                    0
                })
            })
            .unwrap_or_default();

        Ok(FuelRecord {
            id: non_empty(self.id),
            date,
            fuel_type,
            amount,
            price_per_unit,
            total_cost,
            mileage,
            location: non_empty(self.location),
            receipt_number: non_empty(self.receipt_number),
            notes: non_empty(self.notes),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

/// Largest decimal exponent accepted in a numeric field. Anything beyond is garbage, and
/// rescaling it would allocate one digit per unit of exponent.
const MAX_EXPONENT: i64 = 64;

/// `None` for an absent or blank value. Anything else that is not a number counts as zero.
fn parse_decimal(index: usize, field: &str, value: Option<&str>) -> Option<BigDecimal> {
    let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
        log::debug!("Record {}: no {} given", index, field);
        return None;
    };
    let parsed = BigDecimal::from_str(value)
        .ok()
        .filter(|parsed| parsed.as_bigint_and_exponent().1.abs() <= MAX_EXPONENT);
    Some(parsed.unwrap_or_else(|| {
        log::warn!("Record {}: {} {:?} is not a number, using 0", index, field, value);
        BigDecimal::zero()
    }))
}

/// Accepts RFC 3339 timestamps as well as civil datetimes and dates. The latter two are
/// taken to be in `time_zone`.
fn parse_date(value: &str, time_zone: &TimeZone) -> Result<Zoned, jiff::Error> {
    let value = value.trim();
    if let Ok(timestamp) = Timestamp::from_str(value) {
        return Ok(timestamp.to_zoned(time_zone.clone()));
    }
    if let Ok(datetime) = DateTime::from_str(value) {
        return datetime.to_zoned(time_zone.clone());
    }
    Date::from_str(value)?.to_zoned(time_zone.clone())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonDocument {
    Bare(Vec<RawFuelRecord>),
    Envelope(FuelCostsEnvelope),
}

/// Response body of the vehicle fuel costs endpoint.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FuelCostsEnvelope {
    #[serde(default)]
    fuel_costs: Option<Vec<RawFuelRecord>>,
    #[serde(default)]
    vehicle: Option<Vehicle>,
}

pub fn parse_json(reader: impl Read, time_zone: &TimeZone) -> Result<LoadedRecords, LoadError> {
    let (raw_records, vehicle) = match serde_json::from_reader(reader)? {
        JsonDocument::Bare(records) => (records, None),
        JsonDocument::Envelope(envelope) => {
            (envelope.fuel_costs.unwrap_or_default(), envelope.vehicle)
        }
    };
    let records = raw_records
        .into_iter()
        .enumerate()
        .map(|(i, raw)| raw.into_record(i + 1, time_zone))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LoadedRecords { vehicle, records })
}

/// Column positions in a CSV export, looked up by header name.
struct CsvColumns {
    id: Option<usize>,
    date: usize,
    fuel_type: usize,
    amount: usize,
    price_per_unit: Option<usize>,
    total_cost: Option<usize>,
    mileage: usize,
    location: Option<usize>,
    receipt_number: Option<usize>,
    notes: Option<usize>,
}

impl CsvColumns {
    fn from_headers(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|header| header == name);
        let required = |name: &'static str| find(name).ok_or(LoadError::MissingColumn(name));
        Ok(Self {
            id: find("id"),
            date: required("date")?,
            fuel_type: required("fuelType")?,
            amount: required("amount")?,
            price_per_unit: find("pricePerUnit"),
            total_cost: find("totalCost"),
            mileage: required("mileage")?,
            location: find("location"),
            receipt_number: find("receiptNumber"),
            notes: find("notes"),
        })
    }

    fn raw_record(&self, record: &StringRecord) -> RawFuelRecord {
        let cell = |column: Option<usize>| {
            column
                .and_then(|column| record.get(column))
                .map(str::to_owned)
        };
        RawFuelRecord {
            id: cell(self.id),
            date: cell(Some(self.date)),
            fuel_type: cell(Some(self.fuel_type)),
            amount: cell(Some(self.amount)),
            price_per_unit: cell(self.price_per_unit),
            total_cost: cell(self.total_cost),
            mileage: cell(Some(self.mileage)),
            location: cell(self.location),
            receipt_number: cell(self.receipt_number),
            notes: cell(self.notes),
        }
    }
}

pub fn parse_csv(reader: impl Read, time_zone: &TimeZone) -> Result<LoadedRecords, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = CsvColumns::from_headers(csv_reader.headers()?)?;
    let records = csv_reader
        .records()
        .enumerate()
        .map(|(i, record)| columns.raw_record(&record?).into_record(i + 1, time_zone))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LoadedRecords {
        vehicle: None,
        records,
    })
}

/// Deserializes strings and numbers alike into text. Null becomes `None`.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct LenientText;

    impl<'de> Visitor<'de> for LenientText {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(Some(v.to_owned()))
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            Ok(Some(v))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(self)
        }
    }

    deserializer.deserialize_any(LenientText)
}
