#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Database row types and query parameter definitions.
//!
//! These types represent the shapes of data as written to and read from the
//! `DuckDB` store. Value objects ([`Money`], [`GeometryPoint`],
//! [`GeometryShape`]) appear here already decoded; the store crate owns the
//! encode/decode functions that map them to scalar columns.

use rent_insights_geography_models::{GeometryPoint, GeometryShape};
use rent_insights_rent_models::{ConstructionPeriod, Money};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A district to insert at import time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDistrict {
    /// Business key joined on by every rent record.
    pub district_number: i32,
    /// District section number (`N_SQ_QU`), unique.
    pub section_number: String,
    /// INSEE district code.
    pub insee_code: String,
    /// District name.
    pub name: String,
    /// Borough (arrondissement) code.
    pub borough_code: String,
    /// Borough section number.
    pub borough_section_number: String,
    /// Perimeter in meters, as published.
    pub perimeter: Option<String>,
    /// Surface area in square meters.
    pub surface_area: Option<f64>,
    /// Five-digit postal code.
    pub postal_code: String,
    /// Representative point of the district.
    pub location: GeometryPoint,
}

/// A district row as retrieved from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictRow {
    /// Primary key.
    pub id: i64,
    /// Business key.
    pub district_number: i32,
    /// District name.
    pub name: String,
    /// Five-digit postal code.
    pub postal_code: String,
    /// Representative point of the district.
    pub location: GeometryPoint,
}

/// A rent record to insert at import time.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUnit {
    /// District the record belongs to.
    pub district_number: i32,
    /// District name as published in the rent dataset.
    pub district_name: String,
    /// Geographic sector label, when published.
    pub geographic_sector: Option<String>,
    /// Number of main rooms.
    pub number_of_rooms: i16,
    /// Building era bucket.
    pub construction_period: ConstructionPeriod,
    /// Furnished (`true`) or unfurnished rental.
    pub furnished: bool,
    /// Reference rent per square meter; `None` when the cell was empty.
    pub reference_rent: Option<Money>,
    /// Upper bound ("majoré") rent per square meter.
    pub maximum_rent: Option<Money>,
    /// Lower bound ("minoré") rent per square meter.
    pub minimum_rent: Option<Money>,
    /// Reference year.
    pub year: i32,
    /// City name.
    pub city: String,
    /// Sector polygon this record applies to.
    pub shape: GeometryShape,
    /// Representative point of the sector.
    pub point: GeometryPoint,
}

/// Attribute filters shared by every rent aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitFilter {
    /// Building era bucket.
    pub construction_period: ConstructionPeriod,
    /// Number of main rooms.
    pub number_of_rooms: i16,
    /// Furnished flag.
    pub furnished: bool,
}

/// Which rent records an aggregation runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitScope {
    /// Every record of one district.
    District(i32),
    /// An explicit set of record ids, e.g. the result of a proximity search.
    Units(Vec<i64>),
}

/// A proximity-search candidate: a record whose envelope overlaps the
/// search box, with its polygon still encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProximityCandidate {
    /// Record id.
    pub id: i64,
    /// Stored `GeoJSON` polygon.
    pub geometry: String,
}

/// Raw rent aggregates in subunits. Every field is `None` when no row
/// matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RentAggregate {
    /// `MAX(maximum_rent)`.
    pub max_rent: Option<i64>,
    /// `MIN(minimum_rent)`.
    pub min_rent: Option<i64>,
    /// `AVG(reference_rent)` truncated toward zero.
    pub average_rent: Option<i64>,
    /// Number of records aggregated.
    pub matched: u64,
}

/// Which fields feed the rent-record content hash.
///
/// Published versions of the dataset disagree on what identifies a record,
/// so the composition is chosen at import time.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum HashComposition {
    /// District, rooms, construction period, furnished flag and year.
    #[default]
    Core,
    /// [`HashComposition::Core`] plus city, geographic sector, latitude and
    /// longitude.
    Extended,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_composition_parses_case_insensitively() {
        assert_eq!(
            "core".parse::<HashComposition>().unwrap(),
            HashComposition::Core
        );
        assert_eq!(
            "Extended".parse::<HashComposition>().unwrap(),
            HashComposition::Extended
        );
        assert!("full".parse::<HashComposition>().is_err());
    }

    #[test]
    fn hash_composition_defaults_to_core() {
        assert_eq!(HashComposition::default(), HashComposition::Core);
        assert_eq!(HashComposition::Extended.to_string(), "extended");
    }
}
