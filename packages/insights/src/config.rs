//! Tunables for district resolution.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Default search radius for the proximity fallback, in meters.
pub const DEFAULT_RADIUS_METERS: f64 = 1000.0;

/// Default half-width of the box around a district's stored point, in
/// degrees (about 1 km at Paris latitudes).
pub const DEFAULT_DISTRICT_TOLERANCE: f64 = 0.01;

/// How a coordinate is turned into a set of rent records.
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
pub enum CoordinateStrategy {
    /// Look for a district near the point first and fall back to the
    /// proximity search only when none qualifies.
    #[default]
    DistrictFirst,
    /// Always use the proximity search on the rent records' own polygons.
    ProximityOnly,
}

/// Process-wide resolution settings. Immutable once the server starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Radius of the proximity fallback, in meters.
    pub radius_meters: f64,
    /// Half-width of the district pre-filter box, in degrees.
    pub district_tolerance: f64,
    /// Which resolution path coordinates take.
    pub coordinate_strategy: CoordinateStrategy,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            radius_meters: DEFAULT_RADIUS_METERS,
            district_tolerance: DEFAULT_DISTRICT_TOLERANCE,
            coordinate_strategy: CoordinateStrategy::default(),
        }
    }
}

impl InsightsConfig {
    /// Returns a copy with a different proximity radius.
    #[must_use]
    pub const fn with_radius_meters(mut self, radius_meters: f64) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    /// Returns a copy with a different coordinate strategy.
    #[must_use]
    pub const fn with_coordinate_strategy(mut self, strategy: CoordinateStrategy) -> Self {
        self.coordinate_strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_published_behavior() {
        let config = InsightsConfig::default();
        assert!((config.radius_meters - 1000.0).abs() < f64::EPSILON);
        assert!((config.district_tolerance - 0.01).abs() < f64::EPSILON);
        assert_eq!(config.coordinate_strategy, CoordinateStrategy::DistrictFirst);
    }

    #[test]
    fn strategy_parses_from_env_style_strings() {
        assert_eq!(
            "proximity_only".parse::<CoordinateStrategy>().unwrap(),
            CoordinateStrategy::ProximityOnly
        );
        assert_eq!(
            "DISTRICT_FIRST".parse::<CoordinateStrategy>().unwrap(),
            CoordinateStrategy::DistrictFirst
        );
        assert!("nearest".parse::<CoordinateStrategy>().is_err());
    }
}
