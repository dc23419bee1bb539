#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Validated geographic value objects.
//!
//! [`GeometryPoint`] and [`GeometryShape`] validate at construction, so a
//! value of either type is always within WGS84 bounds and, for shapes,
//! closed, large enough and located over mainland France. Consumers never
//! re-check these invariants.

mod point;
mod shape;

pub use point::GeometryPoint;
pub use shape::{Coordinate, GeometryShape};

use serde::{Deserialize, Serialize};

/// Rough bounding box of mainland France, derived from the rent dataset.
pub const FRANCE_MAINLAND: BoundingBox = BoundingBox::new(-5.5, 41.0, 9.8, 51.5);

/// Errors raised while building geographic value objects.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// A coordinate, point or ring is malformed or out of bounds.
    #[error("invalid geometry: {message}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
    },

    /// The external payload is not a `Polygon` document.
    #[error("invalid geometry format: {message}")]
    InvalidFormat {
        /// What was wrong with the payload.
        message: String,
    },

    /// The polygon is geometrically valid but its centroid falls outside
    /// [`FRANCE_MAINLAND`].
    #[error("polygon centroid ({latitude}, {longitude}) is outside mainland France")]
    OutOfRegion {
        /// Centroid latitude.
        latitude: f64,
        /// Centroid longitude.
        longitude: f64,
    },
}

impl GeometryError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}

/// A geographic bounding box in WGS84 coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Square box of `delta` degrees on each side of `center`.
    #[must_use]
    pub fn around(center: &GeometryPoint, delta: f64) -> Self {
        Self::new(
            center.longitude() - delta,
            center.latitude() - delta,
            center.longitude() + delta,
            center.latitude() + delta,
        )
    }

    /// Inclusive containment test.
    #[must_use]
    pub fn contains(&self, point: &GeometryPoint) -> bool {
        (self.south..=self.north).contains(&point.latitude())
            && (self.west..=self.east).contains(&point.longitude())
    }
}
