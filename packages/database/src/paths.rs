#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for the data directory.
//!
//! All defaults are relative to the project root's `data/` directory.

use std::path::{Path, PathBuf};

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// current directory if the manifest directory is unexpectedly shallow.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default `DuckDB` store path.
#[must_use]
pub fn default_db_path() -> PathBuf {
    data_dir().join("rent_insights.duckdb")
}

/// Returns the `data/dataset/` directory holding the published CSV files.
#[must_use]
pub fn dataset_dir() -> PathBuf {
    data_dir().join("dataset")
}

/// Default location of the district CSV (`quartier_paris.csv`).
#[must_use]
pub fn default_districts_csv() -> PathBuf {
    dataset_dir().join("quartier_paris.csv")
}

/// Default location of the rent-control CSV.
#[must_use]
pub fn default_rent_csv() -> PathBuf {
    dataset_dir().join("logement-encadrement-des-loyers.csv")
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
