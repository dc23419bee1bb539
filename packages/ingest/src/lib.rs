#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Idempotent CSV importer for Paris districts and rent-control data.
//!
//! Districts are keyed on `district_number` and rent records on their
//! content hash, so running the same import twice stores nothing new. Rows
//! that fail validation are logged and counted as rejected; they never stop
//! the batch.

pub mod rows;

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use duckdb::Connection;
use rent_insights_cli_utils::ProgressCallback;
use rent_insights_database::{DbError, districts, paths, units};
use rent_insights_database_models::HashComposition;
use serde::de::DeserializeOwned;

use crate::rows::{DistrictCsvRow, RentCsvRow, RowError};

/// Field delimiter of both published files.
pub const CSV_DELIMITER: u8 = b';';

/// Errors that abort an import.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A CSV file could not be opened.
    #[error("Cannot read {path}: {source}")]
    Io {
        /// The file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The CSV header or framing is broken.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The store rejected a read or write.
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Explicit importer configuration, built by the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    /// District CSV (`quartier_paris.csv`).
    pub districts_csv: PathBuf,
    /// Rent-control CSV.
    pub rent_csv: PathBuf,
    /// `DuckDB` store to write into.
    pub database: PathBuf,
    /// Fields feeding the rent-record content hash.
    pub hash_composition: HashComposition,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            districts_csv: paths::default_districts_csv(),
            rent_csv: paths::default_rent_csv(),
            database: paths::default_db_path(),
            hash_composition: HashComposition::default(),
        }
    }
}

/// Which tables an import run touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportTargets {
    /// Import districts.
    pub districts: bool,
    /// Import rent records.
    pub rent: bool,
}

impl ImportTargets {
    /// Builds targets from the `--districts` / `--rent` flags. Passing
    /// neither selects both.
    #[must_use]
    pub const fn from_flags(districts: bool, rent: bool) -> Self {
        if !districts && !rent {
            return Self {
                districts: true,
                rent: true,
            };
        }
        Self { districts, rent }
    }
}

/// Per-table outcome of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows written.
    pub imported: u64,
    /// Rows already present.
    pub skipped: u64,
    /// Rows that failed validation.
    pub rejected: u64,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} imported, {} skipped, {} rejected",
            self.imported, self.skipped, self.rejected
        )
    }
}

fn open_csv(path: &Path) -> Result<File, IngestError> {
    File::open(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Streams rows one record at a time. Each record is deserialized on its
/// own so a bad row only rejects itself. A read failure ends the import.
fn stream_rows<T: DeserializeOwned, R: Read>(
    reader: R,
) -> Result<impl Iterator<Item = Result<Result<T, RowError>, IngestError>>, IngestError> {
    let mut csv = csv::ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = csv.headers()?.clone();

    Ok(csv.into_records().map(move |record| match record {
        Err(e) if e.is_io_error() => Err(IngestError::Csv(e)),
        record => Ok(record
            .and_then(|record| record.deserialize(Some(&headers)))
            .map_err(RowError::from)),
    }))
}

/// Imports districts from a CSV stream.
///
/// # Errors
///
/// Returns [`IngestError`] if the CSV cannot be read or the store fails.
pub fn import_districts<R: Read>(
    conn: &Connection,
    reader: R,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ImportSummary, IngestError> {
    let rows = stream_rows::<DistrictCsvRow, _>(reader)?;

    let mut summary = ImportSummary::default();

    for (line, row) in rows.enumerate() {
        progress.inc(1);
        let row = row?;

        let district = match row.and_then(DistrictCsvRow::into_district) {
            Ok(district) => district,
            Err(e) => {
                log::warn!("District row {}: {e}", line + 2);
                summary.rejected += 1;
                continue;
            }
        };

        if districts::insert_if_absent(conn, &district)? {
            summary.imported += 1;
        } else {
            summary.skipped += 1;
        }
    }

    progress.finish(format!("Districts: {summary}"));
    Ok(summary)
}

/// Imports rent records from a CSV stream.
///
/// Records whose district is not stored are rejected.
///
/// # Errors
///
/// Returns [`IngestError`] if the CSV cannot be read or the store fails.
pub fn import_units<R: Read>(
    conn: &Connection,
    reader: R,
    composition: HashComposition,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ImportSummary, IngestError> {
    let rows = stream_rows::<RentCsvRow, _>(reader)?;

    let mut known_districts: BTreeMap<i32, bool> = BTreeMap::new();
    let mut summary = ImportSummary::default();

    for (line, row) in rows.enumerate() {
        progress.inc(1);
        let row = row?;

        let unit = match row.and_then(RentCsvRow::into_unit) {
            Ok(unit) => unit,
            Err(e) => {
                log::warn!("Rent row {}: {e}", line + 2);
                summary.rejected += 1;
                continue;
            }
        };

        let district_known = match known_districts.get(&unit.district_number) {
            Some(&known) => known,
            None => {
                let known = districts::exists(conn, unit.district_number)?;
                known_districts.insert(unit.district_number, known);
                known
            }
        };

        if !district_known {
            log::warn!(
                "Rent row {}: district {} is not imported",
                line + 2,
                unit.district_number
            );
            summary.rejected += 1;
            continue;
        }

        if units::insert_if_absent(conn, &unit, composition)? {
            summary.imported += 1;
        } else {
            summary.skipped += 1;
        }
    }

    progress.finish(format!("Units: {summary}"));
    Ok(summary)
}

/// Imports districts from the configured file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be opened or the import fails.
pub fn import_districts_file(
    conn: &Connection,
    config: &ImportConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ImportSummary, IngestError> {
    log::info!("Importing districts from {}", config.districts_csv.display());
    import_districts(conn, open_csv(&config.districts_csv)?, progress)
}

/// Imports rent records from the configured file.
///
/// # Errors
///
/// Returns [`IngestError`] if the file cannot be opened or the import fails.
pub fn import_units_file(
    conn: &Connection,
    config: &ImportConfig,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ImportSummary, IngestError> {
    log::info!(
        "Importing rent records from {} (hash: {})",
        config.rent_csv.display(),
        config.hash_composition
    );
    import_units(
        conn,
        open_csv(&config.rent_csv)?,
        config.hash_composition,
        progress,
    )
}

/// Deletes the selected tables' contents. Rent records always go first
/// because they reference districts; truncating districts therefore also
/// truncates rent records.
///
/// # Errors
///
/// Returns [`IngestError`] if a delete fails.
pub fn truncate(conn: &Connection, targets: ImportTargets) -> Result<(), IngestError> {
    if targets.rent || targets.districts {
        let removed = units::truncate(conn)?;
        log::warn!("Truncated units ({removed} rows)");
    }

    if targets.districts {
        let removed = districts::truncate(conn)?;
        log::warn!("Truncated districts ({removed} rows)");
    }

    Ok(())
}
