#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the rent-control data importer.

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use rent_insights_cli_utils::IndicatifProgress;
use rent_insights_database_models::HashComposition;
use rent_insights_ingest::{ImportConfig, ImportTargets};

#[derive(Parser)]
#[command(
    name = "rent_insights_ingest",
    about = "Import Paris districts and rent-control reference data"
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Import districts only
    #[arg(long)]
    districts: bool,
    /// Import rent records only
    #[arg(long)]
    rent: bool,
    /// Truncate the selected tables before importing
    #[arg(long)]
    force: bool,
    /// Skip the confirmation prompt of `--force`
    #[arg(long)]
    yes: bool,
    /// District CSV (defaults to `data/dataset/quartier_paris.csv`)
    #[arg(long)]
    districts_csv: Option<PathBuf>,
    /// Rent-control CSV (defaults to `data/dataset/logement-encadrement-des-loyers.csv`)
    #[arg(long)]
    rent_csv: Option<PathBuf>,
    /// `DuckDB` file (defaults to `data/rent_insights.duckdb`)
    #[arg(long)]
    database: Option<PathBuf>,
    /// Fields hashed to identify a rent record (`core` or `extended`)
    #[arg(long, default_value = "core")]
    hash_composition: HashComposition,
}

impl Cli {
    fn import_config(&self) -> ImportConfig {
        let defaults = ImportConfig::default();
        ImportConfig {
            districts_csv: self
                .districts_csv
                .clone()
                .unwrap_or(defaults.districts_csv),
            rent_csv: self.rent_csv.clone().unwrap_or(defaults.rent_csv),
            database: self.database.clone().unwrap_or(defaults.database),
            hash_composition: self.hash_composition,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = rent_insights_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = cli.import_config();
    let targets = ImportTargets::from_flags(cli.districts, cli.rent);

    let conn = rent_insights_database::open(&config.database)?;

    if cli.force {
        let prompt = if targets.districts {
            "Delete all stored districts and rent records before importing?"
        } else {
            "Delete all stored rent records before importing?"
        };

        if !cli.yes && !rent_insights_cli_utils::confirm(prompt)? {
            log::info!("Aborted, nothing was changed.");
            return Ok(());
        }

        rent_insights_ingest::truncate(&conn, targets)?;
    }

    let start = Instant::now();

    if targets.districts {
        let progress = IndicatifProgress::rows_bar(&multi, "Importing districts");
        let summary = rent_insights_ingest::import_districts_file(&conn, &config, &progress)?;
        log::info!("Districts: {summary}");
    }

    if targets.rent {
        let progress = IndicatifProgress::rows_bar(&multi, "Importing rent records");
        let summary = rent_insights_ingest::import_units_file(&conn, &config, &progress)?;
        log::info!("Rent records: {summary}");
    }

    log::info!(
        "Import finished in {:.1}s",
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
