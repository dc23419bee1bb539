//! Closed polygon value object.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive as _;
use serde::Deserialize;
use serde_json::value::RawValue;

use crate::{BoundingBox, FRANCE_MAINLAND, GeometryError, GeometryPoint};

/// Minimum number of ring points, closing point included.
const MIN_RING_POINTS: usize = 4;

/// A single ring vertex, kept as exact decimals so the source literals
/// survive a parse/store/read round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Coordinate {
    longitude: Decimal,
    latitude: Decimal,
}

impl Coordinate {
    /// Builds a vertex, enforcing WGS84 bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidInput`] if either component is out of
    /// range.
    pub fn new(longitude: Decimal, latitude: Decimal) -> Result<Self, GeometryError> {
        if longitude < Decimal::from(-180) || longitude > Decimal::from(180) {
            return Err(GeometryError::invalid_input(format!(
                "invalid coordinate: [{longitude}, {latitude}]"
            )));
        }
        if latitude < Decimal::from(-90) || latitude > Decimal::from(90) {
            return Err(GeometryError::invalid_input(format!(
                "invalid coordinate: [{longitude}, {latitude}]"
            )));
        }

        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Exact longitude.
    #[must_use]
    pub const fn longitude(&self) -> Decimal {
        self.longitude
    }

    /// Exact latitude.
    #[must_use]
    pub const fn latitude(&self) -> Decimal {
        self.latitude
    }

    /// Longitude as `f64`, for geometric computations.
    #[must_use]
    pub fn longitude_f64(&self) -> f64 {
        self.longitude.to_f64().unwrap_or_default()
    }

    /// Latitude as `f64`, for geometric computations.
    #[must_use]
    pub fn latitude_f64(&self) -> f64 {
        self.latitude.to_f64().unwrap_or_default()
    }
}

/// A validated `Polygon`: one closed outer ring plus optional holes.
///
/// Construction enforces, in order: every vertex within WGS84 bounds, at
/// least four points per ring, closed rings, and a centroid inside
/// [`FRANCE_MAINLAND`]. The last check is a data-quality guard, reported as
/// [`GeometryError::OutOfRegion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryShape {
    exterior: Vec<Coordinate>,
    interiors: Vec<Vec<Coordinate>>,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: Option<String>,
    coordinates: Option<Box<RawValue>>,
}

impl GeometryShape {
    /// The only geometry type this value object models.
    pub const TYPE: &'static str = "Polygon";

    /// Builds a shape from already-parsed rings.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidInput`] for short or open rings and
    /// [`GeometryError::OutOfRegion`] when the centroid is outside mainland
    /// France.
    pub fn new(
        exterior: Vec<Coordinate>,
        interiors: Vec<Vec<Coordinate>>,
    ) -> Result<Self, GeometryError> {
        validate_ring(&exterior, "outer ring")?;
        for (i, hole) in interiors.iter().enumerate() {
            validate_ring(hole, &format!("interior ring {i}"))?;
        }

        let shape = Self {
            exterior,
            interiors,
        };

        if !shape.is_within_region(&FRANCE_MAINLAND) {
            let centroid = shape.centroid();
            return Err(GeometryError::OutOfRegion {
                latitude: centroid.latitude(),
                longitude: centroid.longitude(),
            });
        }

        Ok(shape)
    }

    /// Parses a `GeoJSON` `Polygon` geometry.
    ///
    /// Numeric literals are taken as raw text and parsed as decimals; they
    /// never pass through binary floating point. Literals quoted as strings
    /// are accepted too.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidFormat`] if the payload is not a JSON
    /// object, `type` is not `"Polygon"` or `coordinates` is missing or not
    /// an array of rings. Point-level problems are reported as in
    /// [`GeometryShape::new`].
    pub fn from_geojson(text: &str) -> Result<Self, GeometryError> {
        let raw: RawGeometry = serde_json::from_str(text)
            .map_err(|e| GeometryError::invalid_format(format!("invalid GeoJSON: {e}")))?;

        if raw.kind.as_deref() != Some(Self::TYPE) {
            return Err(GeometryError::invalid_format(format!(
                "expected type 'Polygon', got {:?}",
                raw.kind.unwrap_or_default()
            )));
        }

        let coordinates = raw
            .coordinates
            .ok_or_else(|| GeometryError::invalid_format("missing coordinates"))?;

        let rings: Vec<Vec<Vec<Box<RawValue>>>> = serde_json::from_str(coordinates.get())
            .map_err(|e| {
                GeometryError::invalid_format(format!("coordinates must be an array of rings: {e}"))
            })?;

        let mut rings = rings
            .iter()
            .map(|ring| ring.iter().map(|point| parse_point(point)).collect())
            .collect::<Result<Vec<Vec<Coordinate>>, _>>()?
            .into_iter();

        let exterior = rings
            .next()
            .ok_or_else(|| GeometryError::invalid_input("coordinates array is empty"))?;

        Self::new(exterior, rings.collect())
    }

    /// Renders the shape back to a `GeoJSON` `Polygon` using the exact
    /// decimal literals.
    #[must_use]
    pub fn to_geojson(&self) -> String {
        let rings = std::iter::once(&self.exterior)
            .chain(&self.interiors)
            .map(|ring| {
                let points = ring
                    .iter()
                    .map(|c| format!("[{},{}]", c.longitude, c.latitude))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("[{points}]")
            })
            .collect::<Vec<_>>()
            .join(",");

        format!(r#"{{"type":"{}","coordinates":[{rings}]}}"#, Self::TYPE)
    }

    /// Outer ring, closing point included.
    #[must_use]
    pub fn exterior(&self) -> &[Coordinate] {
        &self.exterior
    }

    /// Interior rings (holes).
    #[must_use]
    pub fn interiors(&self) -> &[Vec<Coordinate>] {
        &self.interiors
    }

    /// Arithmetic mean of the outer ring's points, closing point included.
    ///
    /// This is not the area-weighted polygon centroid; it is only used as a
    /// cheap region-membership approximation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> GeometryPoint {
        let count = self.exterior.len() as f64;
        let (lon_sum, lat_sum) = self
            .exterior
            .iter()
            .fold((0.0, 0.0), |(lon, lat), c| {
                (lon + c.longitude_f64(), lat + c.latitude_f64())
            });

        // The mean of in-bounds coordinates is itself in bounds.
        GeometryPoint::new_unchecked(lon_sum / count, lat_sum / count)
    }

    /// Whether the centroid lies inside `region`.
    #[must_use]
    pub fn is_within_region(&self, region: &BoundingBox) -> bool {
        region.contains(&self.centroid())
    }

    /// Smallest box containing the outer ring.
    #[must_use]
    pub fn envelope(&self) -> BoundingBox {
        self.exterior.iter().fold(
            BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN),
            |bbox, c| {
                let (lon, lat) = (c.longitude_f64(), c.latitude_f64());
                BoundingBox::new(
                    bbox.west.min(lon),
                    bbox.south.min(lat),
                    bbox.east.max(lon),
                    bbox.north.max(lat),
                )
            },
        )
    }
}

impl FromStr for GeometryShape {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_geojson(s)
    }
}

fn validate_ring(ring: &[Coordinate], label: &str) -> Result<(), GeometryError> {
    if ring.len() < MIN_RING_POINTS {
        return Err(GeometryError::invalid_input(format!(
            "{label} must contain at least {MIN_RING_POINTS} points, got {}",
            ring.len()
        )));
    }
    if ring.first() != ring.last() {
        return Err(GeometryError::invalid_input(format!(
            "{label} is not closed"
        )));
    }
    Ok(())
}

fn parse_point(point: &[Box<RawValue>]) -> Result<Coordinate, GeometryError> {
    let [lon, lat] = point else {
        return Err(GeometryError::invalid_input(format!(
            "each point must have [lon, lat], got {} values",
            point.len()
        )));
    };

    Coordinate::new(parse_literal(lon)?, parse_literal(lat)?)
}

fn parse_literal(raw: &RawValue) -> Result<Decimal, GeometryError> {
    let text = raw.get().trim();
    let text = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);

    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| GeometryError::invalid_input(format!("invalid coordinate literal {text}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHAMPS_ELYSEES: &str = r#"{"type": "Polygon", "coordinates": [[
        [2.30054, 48.87006], [2.31263, 48.87393], [2.31569, 48.86398],
        [2.30157, 48.86363], [2.30054, 48.87006]
    ]]}"#;

    fn square(center_lon: f64, center_lat: f64) -> String {
        let (w, e) = (center_lon - 0.01, center_lon + 0.01);
        let (s, n) = (center_lat - 0.01, center_lat + 0.01);
        format!(
            r#"{{"type":"Polygon","coordinates":[[[{w},{s}],[{e},{s}],[{e},{n}],[{w},{n}],[{w},{s}]]]}}"#
        )
    }

    #[test]
    fn parses_polygon_in_paris() {
        let shape = GeometryShape::from_geojson(CHAMPS_ELYSEES).unwrap();
        assert_eq!(shape.exterior().len(), 5);
        assert!(shape.interiors().is_empty());

        let centroid = shape.centroid();
        assert!((48.0..49.0).contains(&centroid.latitude()));
        assert!((2.0..3.0).contains(&centroid.longitude()));
    }

    #[test]
    fn centroid_is_mean_of_ring_points() {
        let shape = GeometryShape::from_geojson(
            r#"{"type":"Polygon","coordinates":[[[2,48],[4,48],[4,50],[2,48]]]}"#,
        )
        .unwrap();
        let centroid = shape.centroid();
        assert!((centroid.longitude() - 3.0).abs() < 1e-12);
        assert!((centroid.latitude() - 48.5).abs() < 1e-12);
    }

    #[test]
    fn keeps_literals_exactly() {
        let shape = GeometryShape::from_geojson(
            r#"{"type":"Polygon","coordinates":[[
                [2.300540000000000123, 48.8700600],
                [2.31263, 48.87393],
                [2.31569, 48.86398],
                [2.300540000000000123, 48.8700600]
            ]]}"#,
        )
        .unwrap();

        let first = shape.exterior()[0];
        assert_eq!(first.longitude().to_string(), "2.300540000000000123");
        assert_eq!(first.latitude().to_string(), "48.8700600");
        assert!(
            shape
                .to_geojson()
                .starts_with(r#"{"type":"Polygon","coordinates":[[[2.300540000000000123,48.8700600],"#)
        );
    }

    #[test]
    fn geojson_roundtrip_preserves_shape() {
        let shape = GeometryShape::from_geojson(CHAMPS_ELYSEES).unwrap();
        let reparsed = GeometryShape::from_geojson(&shape.to_geojson()).unwrap();
        assert_eq!(reparsed, shape);
    }

    #[test]
    fn accepts_quoted_literals() {
        let shape = GeometryShape::from_geojson(
            r#"{"type":"Polygon","coordinates":[[["2.3","48.8"],["2.4","48.8"],["2.4","48.9"],["2.3","48.8"]]]}"#,
        )
        .unwrap();
        assert_eq!(shape.exterior()[1].longitude().to_string(), "2.4");
    }

    #[test]
    fn three_point_ring_is_rejected() {
        let err = GeometryShape::from_geojson(
            r#"{"type":"Polygon","coordinates":[[[2.3,48.8],[2.4,48.8],[2.3,48.8]]]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidInput { .. }));
    }

    #[test]
    fn open_ring_is_rejected() {
        let err = GeometryShape::from_geojson(
            r#"{"type":"Polygon","coordinates":[[[2.3,48.8],[2.4,48.8],[2.4,48.9],[2.3,48.9]]]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidInput { .. }));
    }

    #[test]
    fn polygon_off_africa_is_out_of_region() {
        let err = GeometryShape::from_geojson(&square(0.0, 0.0)).unwrap_err();
        assert!(matches!(err, GeometryError::OutOfRegion { .. }));
    }

    #[test]
    fn square_in_france_is_within_region() {
        let shape = GeometryShape::from_geojson(&square(2.35, 48.85)).unwrap();
        assert!(shape.is_within_region(&FRANCE_MAINLAND));
        assert!(!shape.is_within_region(&BoundingBox::new(10.0, 10.0, 11.0, 11.0)));
    }

    #[test]
    fn out_of_bounds_vertex_is_invalid_input() {
        let err = GeometryShape::from_geojson(
            r#"{"type":"Polygon","coordinates":[[[2.3,48.8],[2.4,95.0],[2.4,48.9],[2.3,48.8]]]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidInput { .. }));
    }

    #[test]
    fn malformed_points_are_invalid_input() {
        for payload in [
            r#"{"type":"Polygon","coordinates":[[[2.3],[2.4,48.8],[2.4,48.9],[2.3]]]}"#,
            r#"{"type":"Polygon","coordinates":[[[2.3,48.8,1],[2.4,48.8],[2.4,48.9],[2.3,48.8,1]]]}"#,
            r#"{"type":"Polygon","coordinates":[[[null,48.8],[2.4,48.8],[2.4,48.9],[null,48.8]]]}"#,
            r#"{"type":"Polygon","coordinates":[]}"#,
        ] {
            assert!(
                matches!(
                    GeometryShape::from_geojson(payload),
                    Err(GeometryError::InvalidInput { .. })
                ),
                "{payload}"
            );
        }
    }

    #[test]
    fn wrong_type_or_missing_coordinates_is_invalid_format() {
        for payload in [
            r#"{"type":"Point","coordinates":[2.3,48.8]}"#,
            r#"{"type":"MultiPolygon","coordinates":[]}"#,
            r#"{"type":"Polygon"}"#,
            r#"{"coordinates":[[[2.3,48.8],[2.4,48.8],[2.4,48.9],[2.3,48.8]]]}"#,
            r#"{"type":"Polygon","coordinates":"nope"}"#,
            "not json",
        ] {
            assert!(
                matches!(
                    GeometryShape::from_geojson(payload),
                    Err(GeometryError::InvalidFormat { .. })
                ),
                "{payload}"
            );
        }
    }

    #[test]
    fn envelope_covers_outer_ring() {
        let shape = GeometryShape::from_geojson(CHAMPS_ELYSEES).unwrap();
        let envelope = shape.envelope();
        assert!((envelope.west - 2.30054).abs() < 1e-12);
        assert!((envelope.east - 2.31569).abs() < 1e-12);
        assert!((envelope.south - 48.86363).abs() < 1e-12);
        assert!((envelope.north - 48.87393).abs() < 1e-12);
    }
}
