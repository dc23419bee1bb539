//! Turns a user-supplied location into the set of rent records to
//! aggregate over.

use std::cell::OnceCell;

use duckdb::Connection;
use rent_insights_database::districts;
use rent_insights_geography_models::GeometryPoint;

use crate::{CoordinateStrategy, InsightsConfig, InsightsError};

/// Where the caller is asking about. Exactly one form is ever present.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// A five-digit French postal code.
    PostalCode(String),
    /// A WGS84 coordinate.
    Coordinate(GeometryPoint),
}

/// Outcome of resolving a [`Location`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Aggregate over every record of this district.
    District(i32),
    /// No district qualified; aggregate over records whose polygon lies
    /// within the configured radius of this point.
    Proximity(GeometryPoint),
}

/// Per-request memo for the resolution result.
///
/// Built once per incoming request and passed by reference to everything
/// that needs the resolution, so the lookup runs at most once.
#[derive(Debug, Default)]
pub struct RequestScope {
    resolution: OnceCell<Resolution>,
}

impl RequestScope {
    /// Creates an empty scope.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolution: OnceCell::new(),
        }
    }

    /// The memoized resolution, if one has been computed.
    #[must_use]
    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution.get().copied()
    }

    fn resolve_once(
        &self,
        resolve: impl FnOnce() -> Result<Resolution, InsightsError>,
    ) -> Result<Resolution, InsightsError> {
        if let Some(resolution) = self.resolution.get() {
            return Ok(*resolution);
        }

        let resolution = resolve()?;
        Ok(*self.resolution.get_or_init(|| resolution))
    }
}

/// Maps a [`Location`] to a [`Resolution`].
pub struct DistrictResolver<'a> {
    conn: &'a Connection,
    config: &'a InsightsConfig,
}

impl<'a> DistrictResolver<'a> {
    /// Creates a resolver reading from `conn`.
    #[must_use]
    pub const fn new(conn: &'a Connection, config: &'a InsightsConfig) -> Self {
        Self { conn, config }
    }

    /// Resolves `location`, reusing the result memoized in `scope` if there
    /// is one.
    ///
    /// # Errors
    ///
    /// * [`InsightsError::NotFound`] if a postal code matches no district
    /// * [`InsightsError::ServiceUnavailable`] if the store cannot be read
    pub fn resolve(
        &self,
        location: &Location,
        scope: &RequestScope,
    ) -> Result<Resolution, InsightsError> {
        scope.resolve_once(|| match location {
            Location::PostalCode(postal_code) => self.resolve_postal_code(postal_code),
            Location::Coordinate(point) => self.resolve_coordinate(point),
        })
    }

    fn resolve_postal_code(&self, postal_code: &str) -> Result<Resolution, InsightsError> {
        let district = districts::find_by_postal_code(self.conn, postal_code)?.ok_or_else(|| {
            InsightsError::NotFound {
                postal_code: postal_code.to_string(),
            }
        })?;

        log::debug!(
            "Postal code {postal_code} resolved to district {} ({})",
            district.district_number,
            district.name
        );

        Ok(Resolution::District(district.district_number))
    }

    fn resolve_coordinate(&self, point: &GeometryPoint) -> Result<Resolution, InsightsError> {
        if self.config.coordinate_strategy == CoordinateStrategy::DistrictFirst
            && let Some(district) =
                districts::find_nearest_within_box(self.conn, point, self.config.district_tolerance)?
        {
            log::debug!(
                "Coordinate {point} resolved to district {} ({})",
                district.district_number,
                district.name
            );
            return Ok(Resolution::District(district.district_number));
        }

        log::debug!(
            "Coordinate {point} falls back to a {}m proximity search",
            self.config.radius_meters
        );

        Ok(Resolution::Proximity(*point))
    }
}
