//! Server start-up configuration.

use std::path::PathBuf;

use rent_insights_database::paths;
use rent_insights_query::{CoordinateStrategy, InsightsConfig};

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Everything the server reads from its environment, resolved once.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Listen address (`BIND_ADDR`).
    pub bind_addr: String,
    /// Listen port (`PORT`).
    pub port: u16,
    /// `DuckDB` file (`RENT_INSIGHTS_DB`).
    pub database: PathBuf,
    /// District resolution settings (`RENT_INSIGHTS_RADIUS_METERS`,
    /// `RENT_INSIGHTS_COORDINATE_STRATEGY`).
    pub insights: InsightsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            database: paths::default_db_path(),
            insights: InsightsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Unparseable
    /// values are logged and replaced by their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let bind_addr = lookup("BIND_ADDR").unwrap_or(defaults.bind_addr);
        let port = parsed(&lookup, "PORT").unwrap_or(defaults.port);
        let database = lookup("RENT_INSIGHTS_DB").map_or(defaults.database, PathBuf::from);

        let mut insights = defaults.insights;
        if let Some(radius) = parsed::<f64>(&lookup, "RENT_INSIGHTS_RADIUS_METERS") {
            if radius.is_finite() && radius >= 0.0 {
                insights = insights.with_radius_meters(radius);
            } else {
                log::warn!("Ignoring invalid RENT_INSIGHTS_RADIUS_METERS={radius}");
            }
        }
        if let Some(strategy) =
            parsed::<CoordinateStrategy>(&lookup, "RENT_INSIGHTS_COORDINATE_STRATEGY")
        {
            insights = insights.with_coordinate_strategy(strategy);
        }

        Self {
            bind_addr,
            port,
            database,
            insights,
        }
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    raw.trim().parse().map_or_else(
        |_| {
            log::warn!("Ignoring unparseable {key}={raw}");
            None
        },
        Some,
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config(&[]), ServerConfig::default());
    }

    #[test]
    fn environment_overrides_every_setting() {
        let config = config(&[
            ("BIND_ADDR", "0.0.0.0"),
            ("PORT", "9000"),
            ("RENT_INSIGHTS_DB", "/tmp/rent.duckdb"),
            ("RENT_INSIGHTS_RADIUS_METERS", "250"),
            ("RENT_INSIGHTS_COORDINATE_STRATEGY", "proximity_only"),
        ]);

        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.database, PathBuf::from("/tmp/rent.duckdb"));
        assert!((config.insights.radius_meters - 250.0).abs() < f64::EPSILON);
        assert_eq!(
            config.insights.coordinate_strategy,
            CoordinateStrategy::ProximityOnly
        );
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config(&[
            ("PORT", "eighty"),
            ("RENT_INSIGHTS_RADIUS_METERS", "-5"),
            ("RENT_INSIGHTS_COORDINATE_STRATEGY", "nearest"),
        ]);

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.insights, InsightsConfig::default());
    }
}
