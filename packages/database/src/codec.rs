//! Explicit conversions between stored scalars and value objects.
//!
//! Nothing is converted implicitly: the query modules call these functions
//! on every column that carries a [`Money`], [`GeometryShape`] or
//! [`GeometryPoint`].

use rent_insights_geography_models::{GeometryPoint, GeometryShape};
use rent_insights_rent_models::Money;

use crate::DbError;

/// Money column value. `None` stays `NULL`.
#[must_use]
pub fn encode_money(money: Option<Money>) -> Option<i64> {
    money.map(Money::amount)
}

/// Reads a money column. `NULL` reads back as zero.
#[must_use]
pub const fn decode_money(subunits: Option<i64>) -> Money {
    match subunits {
        Some(subunits) => Money::from_subunits(subunits),
        None => Money::zero(),
    }
}

/// Serializes a shape to the stored `GeoJSON` text, keeping the exact
/// coordinate literals.
#[must_use]
pub fn encode_shape(shape: &GeometryShape) -> String {
    shape.to_geojson()
}

/// Parses stored `GeoJSON` text back into a validated shape.
///
/// # Errors
///
/// Returns [`DbError::Geometry`] if the stored text no longer satisfies
/// the shape invariants.
pub fn decode_shape(geojson: &str) -> Result<GeometryShape, DbError> {
    Ok(GeometryShape::from_geojson(geojson)?)
}

/// Rebuilds a point from its stored components.
///
/// # Errors
///
/// Returns [`DbError::Geometry`] if the components are out of range.
pub fn decode_point(longitude: f64, latitude: f64) -> Result<GeometryPoint, DbError> {
    Ok(GeometryPoint::from_components(longitude, latitude)?)
}
