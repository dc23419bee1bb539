//! WGS84 point value object.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// A validated `(longitude, latitude)` pair.
///
/// Every constructor funnels into [`GeometryPoint::from_components`], which
/// rejects non-finite values and anything outside `[-180, 180]` /
/// `[-90, 90]`. The [`fmt::Display`] form (`"lon,lat"`) parses back into an
/// equal point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint")]
pub struct GeometryPoint {
    longitude: f64,
    latitude: f64,
}

#[derive(Deserialize)]
struct RawPoint {
    longitude: f64,
    latitude: f64,
}

impl TryFrom<RawPoint> for GeometryPoint {
    type Error = GeometryError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Self::from_components(raw.longitude, raw.latitude)
    }
}

impl GeometryPoint {
    /// Builds a point from its two components.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidInput`] if either component is out of
    /// range or not finite.
    pub fn from_components(longitude: f64, latitude: f64) -> Result<Self, GeometryError> {
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(GeometryError::invalid_input(format!(
                "invalid longitude {longitude}"
            )));
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(GeometryError::invalid_input(format!(
                "invalid latitude {latitude}"
            )));
        }

        Ok(Self {
            longitude,
            latitude,
        })
    }

    pub(crate) const fn new_unchecked(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Builds a point from a `[longitude, latitude]` pair.
    ///
    /// # Errors
    ///
    /// See [`GeometryPoint::from_components`].
    pub fn from_pair([longitude, latitude]: [f64; 2]) -> Result<Self, GeometryError> {
        Self::from_components(longitude, latitude)
    }

    /// Builds a point from a slice that must hold exactly two values.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::InvalidInput`] for any other length, or if
    /// the values are out of range.
    pub fn from_slice(values: &[f64]) -> Result<Self, GeometryError> {
        match values {
            [longitude, latitude] => Self::from_components(*longitude, *latitude),
            _ => Err(GeometryError::invalid_input(format!(
                "expected [longitude, latitude], got {} values",
                values.len()
            ))),
        }
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }
}

impl FromStr for GeometryPoint {
    type Err = GeometryError;

    /// Parses `"lon,lat"`. Whitespace around either component is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lon, lat) = s
            .split_once(',')
            .ok_or_else(|| GeometryError::invalid_input(format!("expected 'lon,lat', got '{s}'")))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|_| GeometryError::invalid_input(format!("invalid coordinate '{part}'")))
        };

        Self::from_components(parse(lon)?, parse(lat)?)
    }
}

impl fmt::Display for GeometryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.longitude, self.latitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exact_bounds() {
        assert!(GeometryPoint::from_components(180.0, 90.0).is_ok());
        assert!(GeometryPoint::from_components(-180.0, -90.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_components() {
        assert!(matches!(
            GeometryPoint::from_components(181.0, 0.0),
            Err(GeometryError::InvalidInput { .. })
        ));
        assert!(matches!(
            GeometryPoint::from_components(0.0, 91.0),
            Err(GeometryError::InvalidInput { .. })
        ));
        assert!(GeometryPoint::from_components(f64::NAN, 0.0).is_err());
        assert!(GeometryPoint::from_components(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn all_input_shapes_normalize_identically() {
        let from_components = GeometryPoint::from_components(2.3522, 48.8566).unwrap();
        let from_pair = GeometryPoint::from_pair([2.3522, 48.8566]).unwrap();
        let from_slice = GeometryPoint::from_slice(&[2.3522, 48.8566]).unwrap();
        let from_str: GeometryPoint = "2.3522, 48.8566".parse().unwrap();

        assert_eq!(from_components, from_pair);
        assert_eq!(from_components, from_slice);
        assert_eq!(from_components, from_str);
    }

    #[test]
    fn string_form_roundtrips() {
        for (lon, lat) in [
            (2.3522, 48.8566),
            (-0.000_001, 89.999_999),
            (180.0, -90.0),
            (0.1 + 0.2, 1.0 / 3.0),
        ] {
            let point = GeometryPoint::from_components(lon, lat).unwrap();
            let reparsed: GeometryPoint = point.to_string().parse().unwrap();
            assert_eq!(reparsed, point);
        }
    }

    #[test]
    fn rejects_malformed_strings_and_slices() {
        assert!("2.35".parse::<GeometryPoint>().is_err());
        assert!("abc,48.8".parse::<GeometryPoint>().is_err());
        assert!("2.35,48.8,1".parse::<GeometryPoint>().is_err());
        assert!(GeometryPoint::from_slice(&[2.35]).is_err());
        assert!(GeometryPoint::from_slice(&[2.35, 48.8, 0.0]).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<GeometryPoint, _> =
            serde_json::from_str(r#"{"longitude": 2.35, "latitude": 48.85}"#);
        assert!(ok.is_ok());

        let bad: Result<GeometryPoint, _> =
            serde_json::from_str(r#"{"longitude": 200.0, "latitude": 48.85}"#);
        assert!(bad.is_err());
    }
}
