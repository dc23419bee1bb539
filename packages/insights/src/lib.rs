#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rent-band lookup for a location and a set of filters.
//!
//! [`RentInsightsQuery`] resolves the location through
//! [`DistrictResolver`], narrows rent records by construction period, room
//! count and furnished flag, and aggregates the stored subunits into a
//! [`RentBand`]. When no record matches, the band is all zeros rather than
//! an error.

mod config;
mod resolver;

pub use config::{
    CoordinateStrategy, DEFAULT_DISTRICT_TOLERANCE, DEFAULT_RADIUS_METERS, InsightsConfig,
};
pub use resolver::{DistrictResolver, Location, RequestScope, Resolution};

use duckdb::Connection;
use rent_insights_database::{DbError, codec, units};
use rent_insights_database_models::{RentAggregate, UnitFilter, UnitScope};
use rent_insights_rent_models::{ConstructionPeriod, Money};
use rent_insights_spatial::ProximityMatcher;
use serde::Serialize;

/// Errors surfaced by a rent insights query.
#[derive(Debug, thiserror::Error)]
pub enum InsightsError {
    /// The postal code matches no district.
    #[error("No district found for postal code '{postal_code}'")]
    NotFound {
        /// The postal code that was looked up.
        postal_code: String,
    },

    /// The store could not be reached or queried. Not retried.
    #[error("Rent store unavailable: {0}")]
    ServiceUnavailable(#[source] DbError),

    /// The store answered but a stored value could not be decoded.
    #[error("Stored rent data is invalid: {0}")]
    Corrupt(#[source] DbError),
}

impl From<DbError> for InsightsError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::DuckDb(_) | DbError::Io(_) => Self::ServiceUnavailable(e),
            DbError::Geometry(_) | DbError::Conversion { .. } => Self::Corrupt(e),
        }
    }
}

/// A validated rent insights request.
#[derive(Debug, Clone, PartialEq)]
pub struct RentInsightsRequest {
    /// Postal code or coordinate.
    pub location: Location,
    /// Building era bucket.
    pub construction_period: ConstructionPeriod,
    /// Number of main rooms (1-5).
    pub number_of_rooms: i16,
    /// Furnished flag.
    pub furnished: bool,
}

impl RentInsightsRequest {
    /// Attribute filters for the aggregation.
    #[must_use]
    pub const fn filter(&self) -> UnitFilter {
        UnitFilter {
            construction_period: self.construction_period,
            number_of_rooms: self.number_of_rooms,
            furnished: self.furnished,
        }
    }
}

/// The `{max, min, average}` rent band for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RentBand {
    /// Highest upper-bound rent among matching records.
    pub max_rent: Money,
    /// Lowest lower-bound rent among matching records.
    pub min_rent: Money,
    /// Average reference rent, truncated toward zero.
    pub average_rent: Money,
}

impl From<RentAggregate> for RentBand {
    fn from(aggregate: RentAggregate) -> Self {
        Self {
            max_rent: codec::decode_money(aggregate.max_rent),
            min_rent: codec::decode_money(aggregate.min_rent),
            average_rent: codec::decode_money(aggregate.average_rent),
        }
    }
}

/// Read-only rent band query over one store connection.
pub struct RentInsightsQuery<'a> {
    conn: &'a Connection,
    config: &'a InsightsConfig,
}

impl<'a> RentInsightsQuery<'a> {
    /// Creates a query reading from `conn`.
    #[must_use]
    pub const fn new(conn: &'a Connection, config: &'a InsightsConfig) -> Self {
        Self { conn, config }
    }

    /// Runs the query with a fresh [`RequestScope`].
    ///
    /// # Errors
    ///
    /// See [`RentInsightsQuery::execute_in`].
    pub fn execute(&self, request: &RentInsightsRequest) -> Result<RentBand, InsightsError> {
        self.execute_in(request, &RequestScope::new())
    }

    /// Runs the query, memoizing the location resolution in `scope`.
    ///
    /// # Errors
    ///
    /// * [`InsightsError::NotFound`] if a postal code matches no district
    /// * [`InsightsError::ServiceUnavailable`] if the store cannot be read
    /// * [`InsightsError::Corrupt`] if a stored value or sector shape no longer decodes
    pub fn execute_in(
        &self,
        request: &RentInsightsRequest,
        scope: &RequestScope,
    ) -> Result<RentBand, InsightsError> {
        let filter = request.filter();
        let resolution =
            DistrictResolver::new(self.conn, self.config).resolve(&request.location, scope)?;

        let unit_scope = match resolution {
            Resolution::District(district_number) => UnitScope::District(district_number),
            Resolution::Proximity(point) => {
                let mut matcher = ProximityMatcher::new(point, self.config.radius_meters);
                let candidates =
                    units::proximity_candidates(self.conn, &matcher.envelope(), &filter)?;
                let total = candidates.len();

                let mut ids = Vec::new();
                for candidate in candidates {
                    if matcher.matches(&candidate.geometry, codec::decode_shape)? {
                        ids.push(candidate.id);
                    }
                }

                log::debug!(
                    "{} of {total} candidates within {}m ({} distinct sectors)",
                    ids.len(),
                    self.config.radius_meters,
                    matcher.distinct_shapes()
                );

                UnitScope::Units(ids)
            }
        };

        let aggregate = units::aggregate_rents(self.conn, &unit_scope, &filter)?;
        if aggregate.matched == 0 {
            log::debug!("No rent records matched {filter:?} in {unit_scope:?}");
        }

        Ok(aggregate.into())
    }
}

#[cfg(test)]
mod tests {
    use rent_insights_database::districts;
    use rent_insights_database_models::{HashComposition, NewDistrict, NewUnit};
    use rent_insights_geography_models::{GeometryPoint, GeometryShape};

    use super::*;

    /// A sector around Gaillon, roughly 2.331-2.338 E by 48.867-48.871 N.
    const GAILLON_SECTOR: &str = r#"{"type":"Polygon","coordinates":[[[2.331,48.867],[2.338,48.867],[2.338,48.871],[2.331,48.871],[2.331,48.867]]]}"#;

    fn point(lon: f64, lat: f64) -> GeometryPoint {
        GeometryPoint::from_components(lon, lat).unwrap()
    }

    fn store() -> Connection {
        let conn = rent_insights_database::open_in_memory().unwrap();
        districts::insert_if_absent(
            &conn,
            &NewDistrict {
                district_number: 5,
                section_number: "7511005".to_string(),
                insee_code: "7510205".to_string(),
                name: "Gaillon".to_string(),
                borough_code: "2".to_string(),
                borough_section_number: "750000002".to_string(),
                perimeter: None,
                surface_area: None,
                postal_code: "75002".to_string(),
                location: point(2.3343, 48.8693),
            },
        )
        .unwrap();
        conn
    }

    fn insert(conn: &Connection, year: i32, max: &str, min: &str, reference: &str) {
        insert_sector(conn, GAILLON_SECTOR, year, max, min, reference);
    }

    fn insert_sector(
        conn: &Connection,
        sector: &str,
        year: i32,
        max: &str,
        min: &str,
        reference: &str,
    ) {
        let unit = NewUnit {
            district_number: 5,
            district_name: "Gaillon".to_string(),
            geographic_sector: Some("1".to_string()),
            number_of_rooms: 2,
            construction_period: ConstructionPeriod::Between1946And1970,
            furnished: true,
            reference_rent: Some(reference.parse().unwrap()),
            maximum_rent: Some(max.parse().unwrap()),
            minimum_rent: Some(min.parse().unwrap()),
            year,
            city: "PARIS".to_string(),
            shape: GeometryShape::from_geojson(sector).unwrap(),
            point: point(2.3345, 48.869),
        };
        assert!(units::insert_if_absent(conn, &unit, HashComposition::Core).unwrap());
    }

    fn request(location: Location) -> RentInsightsRequest {
        RentInsightsRequest {
            location,
            construction_period: ConstructionPeriod::Between1946And1970,
            number_of_rooms: 2,
            furnished: true,
        }
    }

    fn euros(money: Money) -> f64 {
        money.euro()
    }

    #[test]
    fn postal_code_band_takes_max_of_max_and_min_of_min() {
        let conn = store();
        insert(&conn, 2023, "1000.0000", "500.0000", "700");
        insert(&conn, 2024, "999.0000", "10.0000", "600");

        let config = InsightsConfig::default();
        let band = RentInsightsQuery::new(&conn, &config)
            .execute(&request(Location::PostalCode("75002".to_string())))
            .unwrap();

        assert!((euros(band.max_rent) - 1000.0).abs() < f64::EPSILON);
        assert!((euros(band.min_rent) - 10.0).abs() < f64::EPSILON);
        assert!((euros(band.average_rent) - 650.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_matching_records_yields_zero_band() {
        let conn = store();
        insert(&conn, 2024, "30", "20", "25");

        let config = InsightsConfig::default();
        let mut unfurnished = request(Location::PostalCode("75002".to_string()));
        unfurnished.furnished = false;

        let band = RentInsightsQuery::new(&conn, &config)
            .execute(&unfurnished)
            .unwrap();
        assert_eq!(band, RentBand::default());
        assert!(band.max_rent.is_zero() && band.min_rent.is_zero() && band.average_rent.is_zero());
    }

    #[test]
    fn unknown_postal_code_is_an_error_not_a_zero_band() {
        let conn = store();
        let config = InsightsConfig::default();

        let result = RentInsightsQuery::new(&conn, &config)
            .execute(&request(Location::PostalCode("13001".to_string())));
        assert!(matches!(result, Err(InsightsError::NotFound { .. })));
    }

    #[test]
    fn coordinate_away_from_districts_uses_sector_proximity() {
        let conn = store();
        insert(&conn, 2024, "32.5", "18.2", "26");

        // 0.0122 degrees east of the sector (roughly 890 m) and outside the
        // district tolerance box.
        let config = InsightsConfig::default();
        let query = RentInsightsQuery::new(&conn, &config);
        let near = request(Location::Coordinate(point(2.3502, 48.869)));

        let scope = RequestScope::new();
        let band = query.execute_in(&near, &scope).unwrap();
        assert!(matches!(scope.resolution(), Some(Resolution::Proximity(_))));
        assert!((euros(band.max_rent) - 32.5).abs() < 1e-9);

        let tight = InsightsConfig::default().with_radius_meters(500.0);
        let band = RentInsightsQuery::new(&conn, &tight).execute(&near).unwrap();
        assert_eq!(band, RentBand::default());
    }

    #[test]
    fn coordinate_far_from_everything_yields_zero_band() {
        let conn = store();
        insert(&conn, 2024, "32.5", "18.2", "26");

        let config = InsightsConfig::default();
        let band = RentInsightsQuery::new(&conn, &config)
            .execute(&request(Location::Coordinate(point(2.45, 48.80))))
            .unwrap();
        assert_eq!(band, RentBand::default());
    }

    #[test]
    fn coordinate_inside_sector_with_proximity_only_matches() {
        let conn = store();
        insert(&conn, 2024, "32.5", "18.2", "26");

        let config =
            InsightsConfig::default().with_coordinate_strategy(CoordinateStrategy::ProximityOnly);
        let band = RentInsightsQuery::new(&conn, &config)
            .execute(&request(Location::Coordinate(point(2.3343, 48.8693))))
            .unwrap();
        assert!((euros(band.min_rent) - 18.2).abs() < 1e-9);
    }

    #[test]
    fn sector_at_the_radius_boundary_is_matched_exactly() {
        let conn = store();
        // South edge about 999.6 m north of the query point.
        insert_sector(
            &conn,
            r#"{"type":"Polygon","coordinates":[[[2.331,48.80899],[2.339,48.80899],[2.339,48.812],[2.331,48.812],[2.331,48.80899]]]}"#,
            2024,
            "31",
            "17",
            "24",
        );

        let near = request(Location::Coordinate(point(2.335, 48.8)));
        let config =
            InsightsConfig::default().with_coordinate_strategy(CoordinateStrategy::ProximityOnly);

        let band = RentInsightsQuery::new(&conn, &config).execute(&near).unwrap();
        assert!((euros(band.max_rent) - 31.0).abs() < 1e-9);

        let just_short = config.with_radius_meters(999.0);
        let band = RentInsightsQuery::new(&conn, &just_short)
            .execute(&near)
            .unwrap();
        assert_eq!(band, RentBand::default());
    }

    #[test]
    fn undecodable_sector_geometry_is_corrupt() {
        let conn = store();
        insert(&conn, 2024, "32.5", "18.2", "26");
        conn.execute_batch(r#"UPDATE units SET geometry_shape = '{"type":"Point"}';"#)
            .unwrap();

        let config =
            InsightsConfig::default().with_coordinate_strategy(CoordinateStrategy::ProximityOnly);
        let result = RentInsightsQuery::new(&conn, &config)
            .execute(&request(Location::Coordinate(point(2.3343, 48.8693))));
        assert!(matches!(result, Err(InsightsError::Corrupt(_))));
    }

    #[test]
    fn store_failures_map_to_service_unavailable() {
        let conn = store();
        conn.execute_batch("DROP TABLE units;").unwrap();

        let config = InsightsConfig::default();
        let result = RentInsightsQuery::new(&conn, &config)
            .execute(&request(Location::PostalCode("75002".to_string())));
        assert!(matches!(result, Err(InsightsError::ServiceUnavailable(_))));
    }

    #[test]
    fn band_serializes_money_views() {
        let band = RentBand::from(RentAggregate {
            max_rent: Some(276_000),
            min_rent: None,
            average_rent: Some(1),
            matched: 1,
        });
        let json = serde_json::to_value(band).unwrap();
        assert_eq!(json["max_rent"]["euro"], serde_json::json!(27.6));
        assert_eq!(json["min_rent"]["subunits"], serde_json::json!(0));
    }
}
