mod formatting;
mod fuel_record;
mod monthly_costs;
mod record_loader;
mod report;
mod statistics;

use crate::monthly_costs::YearMonth;
use crate::record_loader::{InputFormat, LoadError, load_records};
use crate::report::Report;
use crate::statistics::calculate_fuel_statistics;
use clap::{Parser, ValueEnum};
use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use std::error::Error as _;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Fuel statistics for a single fleet vehicle.
/// Reads the vehicle's fuel purchases, as returned by the fleet manager's fuel costs endpoint
/// or exported as CSV, and reports average consumption, fuel costs, cost per kilometer and
/// the monthly cost history.
#[derive(Parser, Debug)]
#[command(version, long_about)]
struct FuelStats {
    /// JSON file with a `fuelCosts` list (and optionally a `vehicle`), or a CSV export with
    /// `date`, `fuelType`, `amount` and `mileage` columns. `pricePerUnit` and `totalCost`
    /// are optional; a missing total cost is derived from amount and price.
    #[arg(value_name = "RECORDS", long_help)]
    input: PathBuf,
    /// Input format. `auto` decides by file extension.
    #[arg(short, long, value_enum, default_value_t = FormatArg::Auto)]
    format: FormatArg,
    /// Time zone used to place records in calendar months, e.g. `Europe/Berlin`.
    /// Defaults to the system time zone.
    #[arg(short = 'z', long, env = "FUEL_STATS_TZ", long_help)]
    time_zone: Option<String>,
    /// Reference date for the current year and the end of the monthly history.
    /// Defaults to today.
    #[arg(long, value_name = "YYYY-MM-DD")]
    today: Option<Date>,
    /// Number of months in the monthly cost history.
    #[arg(short, long, default_value_t = 12, value_parser = clap::value_parser!(u16).range(1..=120))]
    months: u16,
    /// Also list every fuel record.
    #[arg(short, long)]
    records: bool,
    #[arg(short, long, value_enum, default_value_t = OutputArg::Text)]
    output: OutputArg,
}

#[derive(ValueEnum, Copy, Clone, PartialEq, Eq, Debug)]
enum FormatArg {
    Auto,
    Csv,
    Json,
}

#[derive(ValueEnum, Copy, Clone, PartialEq, Eq, Debug)]
enum OutputArg {
    Text,
    Json,
}

#[derive(Debug, Error)]
enum RunError {
    #[error("failed to load fuel records")]
    Load(#[from] LoadError),
    #[error("unknown time zone {name:?}")]
    TimeZone {
        name: String,
        #[source]
        source: jiff::Error,
    },
    #[error("failed to serialize report")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write report")]
    Output(#[from] io::Error),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = FuelStats::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let mut message = err.to_string();
            let mut source = err.source();
            while let Some(cause) = source {
                message.push_str(": ");
                message.push_str(&cause.to_string());
                source = cause.source();
            }
            log::error!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &FuelStats) -> Result<(), RunError> {
    let time_zone = match &args.time_zone {
        Some(name) => TimeZone::get(name).map_err(|source| RunError::TimeZone {
            name: name.clone(),
            source,
        })?,
        None => TimeZone::system(),
    };
    let format = match args.format {
        FormatArg::Auto => InputFormat::from_path(&args.input)?,
        FormatArg::Csv => InputFormat::Csv,
        FormatArg::Json => InputFormat::Json,
    };

    let loaded = load_records(&args.input, format, &time_zone)?;
    log::info!(
        "Found {} fuel records in {}",
        loaded.records.len(),
        args.input.display()
    );
    let statistics = calculate_fuel_statistics(&loaded.records);

    let today = args
        .today
        .unwrap_or_else(|| Timestamp::now().to_zoned(time_zone.clone()).date());
    let report = Report::new(
        loaded.vehicle.as_ref(),
        &loaded.records,
        &statistics,
        YearMonth::from_date(today),
        usize::from(args.months),
        args.records,
    );

    let mut out = io::stdout().lock();
    match args.output {
        OutputArg::Text => report.write_text(&mut out)?,
        OutputArg::Json => {
            serde_json::to_writer_pretty(&mut out, &report.to_document())?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}
