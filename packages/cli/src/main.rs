#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line barangay crime-risk report.
//!
//! Reads areas and incidents either from the hosted document database
//! (configured through `APPWRITE_*` environment variables or `--config`)
//! or from a pair of local JSON snapshot files, scores every area, and
//! prints the records or the risk distribution.

mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use barangay_risk::{IncidentFilter, RiskDataSource, compute_area_risk_filtered, filter_by_area};
use barangay_risk_cli_utils::MultiProgress;
use barangay_risk_models::{AreaRiskRecord, RiskSummary};
use barangay_risk_store::{DocumentStore, SnapshotSource, StoreConfig};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "barangay_risk", about = "Barangay crime-risk report")]
struct Cli {
    /// TOML store config. Defaults to `APPWRITE_*` environment variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Read areas from this JSON snapshot instead of the store.
    #[arg(long, global = true)]
    areas_file: Option<PathBuf>,
    /// Read incidents from this JSON snapshot instead of the store.
    #[arg(long, global = true)]
    incidents_file: Option<PathBuf>,
    /// Only count incidents committed on or after this date (YYYY-MM-DD).
    #[arg(long, global = true, value_parser = parse_since)]
    since: Option<DateTime<Utc>>,
    /// Only count incidents committed on or before this date (YYYY-MM-DD).
    #[arg(long, global = true, value_parser = parse_until)]
    until: Option<DateTime<Utc>>,
    /// Only count incidents with this offense (case-insensitive).
    #[arg(long, global = true)]
    offense: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one row per barangay
    Records {
        /// Only show barangays with this name (case-insensitive)
        #[arg(long)]
        area: Option<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print how many barangays fall into each risk level
    Summary {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{s}': {e}. Expected format: YYYY-MM-DD"))
}

fn parse_since(s: &str) -> Result<DateTime<Utc>, String> {
    parse_date(s)?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("Invalid date '{s}'"))
}

fn parse_until(s: &str) -> Result<DateTime<Utc>, String> {
    parse_date(s)?
        .and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("Invalid date '{s}'"))
}

/// Returns the snapshot file pair, if one was given. Either file alone is an
/// error naming the missing flag.
fn snapshot_paths(cli: &Cli) -> Result<Option<(&PathBuf, &PathBuf)>, String> {
    match (&cli.areas_file, &cli.incidents_file) {
        (Some(areas), Some(incidents)) => Ok(Some((areas, incidents))),
        (None, None) => Ok(None),
        (Some(_), None) => Err("--areas-file requires --incidents-file".to_string()),
        (None, Some(_)) => Err("--incidents-file requires --areas-file".to_string()),
    }
}

fn build_source(cli: &Cli) -> Result<Box<dyn RiskDataSource>, Box<dyn std::error::Error>> {
    if let Some((areas, incidents)) = snapshot_paths(cli)? {
        log::info!(
            "Reading snapshot {} + {}",
            areas.display(),
            incidents.display()
        );
        return Ok(Box::new(SnapshotSource::new(areas, incidents)));
    }

    let config = match &cli.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::from_env()?,
    };
    log::info!("Reading from {}", config.endpoint);
    Ok(Box::new(DocumentStore::new(config)?))
}

#[tokio::main]
async fn main() -> ExitCode {
    let multi = barangay_risk_cli_utils::init_logger();
    let cli = Cli::parse();

    match run(cli, &multi).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", render::error_chain(&*e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    let source = build_source(&cli)?;
    let filter = IncidentFilter {
        since: cli.since,
        until: cli.until,
        offense: cli.offense.clone(),
    };

    let spinner = barangay_risk_cli_utils::spinner(multi, "Scoring barangays...");
    let result = compute_area_risk_filtered(source.as_ref(), &filter).await;
    spinner.finish_and_clear();
    let records = result?;

    match cli.command {
        Commands::Records { area, json } => {
            let shown: Vec<&AreaRiskRecord> = match &area {
                Some(name) => filter_by_area(&records, name),
                None => records.iter().collect(),
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                print!("{}", render::records_table(&shown));
            }
        }
        Commands::Summary { json } => {
            let summary = RiskSummary::from_records(&records);
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", render::summary_text(&summary));
            }
        }
    }

    Ok(())
}
