#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! `DuckDB` store for districts and rent records.
//!
//! Geometry is stored as `GeoJSON` TEXT (no spatial extension) next to the
//! polygon's envelope, so proximity searches pre-filter candidates in SQL
//! and leave the exact distance test to `rent_insights_spatial`. Money is
//! stored as scaled BIGINT subunits. Every mapping between a stored scalar
//! and a value object goes through [`codec`].

pub mod codec;
pub mod districts;
pub mod paths;
pub mod units;

use std::path::Path;

use duckdb::Connection;
use rent_insights_geography_models::GeometryError;

/// Errors that can occur during database operations.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` error.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// I/O error (creating the data directory).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored geometry could not be decoded.
    #[error("Stored geometry is invalid: {0}")]
    Geometry(#[from] GeometryError),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Opens (or creates) the store at `path` and ensures the schema exists.
///
/// # Errors
///
/// Returns [`DbError`] if the data directory, the connection or the schema
/// creation fails.
pub fn open(path: &Path) -> Result<Connection, DbError> {
    if let Some(parent) = path.parent() {
        paths::ensure_dir(parent)?;
    }

    log::debug!("Opening rent insights store at {}", path.display());
    let conn = Connection::open(path)?;

    conn.execute_batch("SET threads = 4; SET memory_limit = '512MB';")?;

    create_schema(&conn)?;

    Ok(conn)
}

/// Opens a throwaway in-memory store with the schema in place.
///
/// # Errors
///
/// Returns [`DbError`] if the connection or schema creation fails.
pub fn open_in_memory() -> Result<Connection, DbError> {
    let conn = Connection::open_in_memory()?;
    create_schema(&conn)?;
    Ok(conn)
}

fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE SEQUENCE IF NOT EXISTS districts_id_seq START 1;

        CREATE TABLE IF NOT EXISTS districts (
            id BIGINT PRIMARY KEY DEFAULT nextval('districts_id_seq'),
            district_number INTEGER NOT NULL UNIQUE,
            section_number TEXT NOT NULL UNIQUE,
            insee_code TEXT NOT NULL,
            name TEXT NOT NULL,
            borough_code TEXT NOT NULL,
            borough_section_number TEXT NOT NULL,
            perimeter TEXT,
            surface_area DOUBLE,
            postal_code VARCHAR(5) NOT NULL,
            longitude DOUBLE NOT NULL,
            latitude DOUBLE NOT NULL
        );

        CREATE INDEX IF NOT EXISTS districts_postal_code_idx ON districts (postal_code);
        CREATE INDEX IF NOT EXISTS districts_coordinate_idx ON districts (longitude, latitude);

        CREATE SEQUENCE IF NOT EXISTS units_id_seq START 1;

        CREATE TABLE IF NOT EXISTS units (
            id BIGINT PRIMARY KEY DEFAULT nextval('units_id_seq'),
            unit_hash TEXT NOT NULL UNIQUE,
            district_number INTEGER NOT NULL REFERENCES districts (district_number),
            district_name TEXT NOT NULL,
            geographic_sector TEXT,
            number_of_rooms SMALLINT NOT NULL,
            construction_period SMALLINT NOT NULL,
            furnished BOOLEAN NOT NULL,
            reference_rent BIGINT,
            maximum_rent BIGINT,
            minimum_rent BIGINT,
            year INTEGER NOT NULL,
            city TEXT NOT NULL DEFAULT 'PARIS',
            geometry_shape TEXT NOT NULL,
            min_lon DOUBLE NOT NULL,
            min_lat DOUBLE NOT NULL,
            max_lon DOUBLE NOT NULL,
            max_lat DOUBLE NOT NULL,
            longitude DOUBLE NOT NULL,
            latitude DOUBLE NOT NULL
        );

        CREATE INDEX IF NOT EXISTS units_search_idx
            ON units (district_number, number_of_rooms, construction_period, furnished);
        CREATE INDEX IF NOT EXISTS units_envelope_idx
            ON units (min_lon, max_lon, min_lat, max_lat);",
    )?;

    Ok(())
}

/// Cheap liveness check used by the health endpoint.
///
/// # Errors
///
/// Returns [`DbError`] if the store cannot answer a trivial query.
pub fn ping(conn: &Connection) -> Result<(), DbError> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i32>(0))?;
    Ok(())
}
