#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial predicates for rent sectors.
//!
//! The store keeps sector polygons as `GeoJSON` text without a spatial
//! extension, so the distance-aware predicates (`ST_DWithin`-style) run
//! here on `geo` types. Candidates are narrowed first with
//! [`search_envelope`], a degree box that covers the search radius, and
//! then tested exactly with [`is_within_distance`]. Both use the same
//! spherical Earth radius.

use std::collections::BTreeMap;

use geo::{Closest, ClosestPoint, Contains, Distance, Haversine, LineString, Point, Polygon};
use rent_insights_geography_models::{BoundingBox, Coordinate, GeometryPoint, GeometryShape};

/// Mean Earth radius in meters, the sphere [`Haversine`] measures on.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Relative padding of the search envelope, absorbing float rounding at the
/// radius boundary.
const ENVELOPE_MARGIN: f64 = 1.001;

/// Converts a validated shape into a `geo` polygon.
#[must_use]
pub fn to_polygon(shape: &GeometryShape) -> Polygon<f64> {
    Polygon::new(
        ring_to_line_string(shape.exterior()),
        shape
            .interiors()
            .iter()
            .map(|ring| ring_to_line_string(ring))
            .collect(),
    )
}

fn ring_to_line_string(ring: &[Coordinate]) -> LineString<f64> {
    ring.iter()
        .map(|c| (c.longitude_f64(), c.latitude_f64()))
        .collect::<Vec<_>>()
        .into()
}

/// Distance in meters from `point` to `polygon`; zero when the point is
/// inside or on the boundary.
///
/// The nearest boundary point is found in degree space and the gap is then
/// measured with the haversine formula, which is accurate to well under a
/// meter at city scale.
#[must_use]
pub fn distance_meters(polygon: &Polygon<f64>, point: &GeometryPoint) -> f64 {
    let query = Point::new(point.longitude(), point.latitude());

    if polygon.contains(&query) {
        return 0.0;
    }

    match polygon.closest_point(&query) {
        Closest::Intersection(_) => 0.0,
        Closest::SinglePoint(nearest) => Haversine.distance(query, nearest),
        Closest::Indeterminate => {
            log::warn!("Indeterminate closest point for {point}, treating as out of range");
            f64::INFINITY
        }
    }
}

/// Whether `shape` lies within `radius_meters` of `point`.
#[must_use]
pub fn is_within_distance(shape: &GeometryShape, point: &GeometryPoint, radius_meters: f64) -> bool {
    distance_meters(&to_polygon(shape), point) <= radius_meters
}

/// Degree box around `point` covering every location whose haversine
/// distance is at most `radius_meters`.
///
/// The bounds are those of a spherical cap on the same sphere as
/// [`distance_meters`]: the latitude reach is the angular radius and the
/// longitude reach is `asin(sin(d) / cos(lat))`, which is wider than the
/// due-east offset away from the equator.
#[must_use]
pub fn search_envelope(point: &GeometryPoint, radius_meters: f64) -> BoundingBox {
    let angular = radius_meters * ENVELOPE_MARGIN / EARTH_RADIUS_METERS;
    let lat_delta = angular.to_degrees();

    let cos_lat = point.latitude().to_radians().cos();
    let sin_angular = angular.min(std::f64::consts::FRAC_PI_2).sin();
    let lon_delta = if sin_angular < cos_lat {
        (sin_angular / cos_lat).asin().to_degrees()
    } else {
        180.0
    };

    BoundingBox::new(
        point.longitude() - lon_delta,
        point.latitude() - lat_delta,
        point.longitude() + lon_delta,
        point.latitude() + lat_delta,
    )
}

/// Memoizes proximity checks for shapes that appear many times.
///
/// Rent records repeat the same sector polygon for every room count,
/// construction period and rental type, so the matcher keys results on the
/// stored `GeoJSON` text and only decodes and tests each distinct polygon
/// once.
pub struct ProximityMatcher {
    point: GeometryPoint,
    radius_meters: f64,
    verdicts: BTreeMap<String, bool>,
}

impl ProximityMatcher {
    /// Creates a matcher for one query point and radius.
    #[must_use]
    pub const fn new(point: GeometryPoint, radius_meters: f64) -> Self {
        Self {
            point,
            radius_meters,
            verdicts: BTreeMap::new(),
        }
    }

    /// The degree box candidates should be pre-filtered with.
    #[must_use]
    pub fn envelope(&self) -> BoundingBox {
        search_envelope(&self.point, self.radius_meters)
    }

    /// Tests one stored polygon. `decode` is only called the first time a
    /// given `GeoJSON` text is seen.
    ///
    /// # Errors
    ///
    /// Returns the decode error unchanged. Failures are not memoized.
    pub fn matches<E>(
        &mut self,
        geojson: &str,
        decode: impl FnOnce(&str) -> Result<GeometryShape, E>,
    ) -> Result<bool, E> {
        if let Some(&verdict) = self.verdicts.get(geojson) {
            return Ok(verdict);
        }

        let shape = decode(geojson)?;
        let verdict = is_within_distance(&shape, &self.point, self.radius_meters);

        self.verdicts.insert(geojson.to_string(), verdict);
        Ok(verdict)
    }

    /// Number of distinct polygons tested so far.
    #[must_use]
    pub fn distinct_shapes(&self) -> usize {
        self.verdicts.len()
    }
}
