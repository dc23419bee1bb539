#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the rent insights server.
//!
//! Query parameters arrive as raw strings and are validated here into a
//! [`RentInsightsRequest`]. Every failing field is reported at once in a
//! [`ValidationErrors`] body.

use std::collections::BTreeMap;

use rent_insights_geography_models::GeometryPoint;
use rent_insights_query::{Location, RentBand, RentInsightsRequest};
use rent_insights_rent_models::ConstructionPeriod;
use serde::{Deserialize, Serialize};

/// Smallest accepted `number_of_rooms`.
pub const MIN_ROOMS: i16 = 1;
/// Largest accepted `number_of_rooms`.
pub const MAX_ROOMS: i16 = 5;

/// Raw query parameters of `GET /rent-insights`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RentInsightsParams {
    /// Longitude, sent as `coordinate[longitude]`.
    #[serde(rename = "coordinate[longitude]")]
    pub longitude: Option<String>,
    /// Latitude, sent as `coordinate[latitude]`.
    #[serde(rename = "coordinate[latitude]")]
    pub latitude: Option<String>,
    /// Five-digit postal code.
    pub postal_code: Option<String>,
    /// One of the four construction period labels.
    pub construction_period: Option<String>,
    /// Main rooms, 1 to 5.
    pub number_of_rooms: Option<String>,
    /// `true`, `false`, `1` or `0`.
    pub furnished: Option<String>,
}

/// `422` response body listing every invalid field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    /// Summary of the first failure.
    pub message: String,
    /// Messages per parameter name.
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    fn add(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        if self.message.is_empty() {
            self.message.clone_from(&message);
        }
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message);
    }

    /// Whether no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationErrors {}

fn present(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

impl RentInsightsParams {
    /// Validates the parameters into a query request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationErrors`] naming each invalid parameter.
    pub fn validate(&self) -> Result<RentInsightsRequest, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let location = self.location(&mut errors);

        let construction_period = match present(self.construction_period.as_ref()) {
            None => {
                errors.add("construction_period", "The construction period is required.");
                None
            }
            Some(label) => ConstructionPeriod::from_label(label)
                .map_err(|_| {
                    errors.add(
                        "construction_period",
                        format!(
                            "The construction period must be one of: {}.",
                            ConstructionPeriod::labels().join(", ")
                        ),
                    );
                })
                .ok(),
        };

        let number_of_rooms = match present(self.number_of_rooms.as_ref()) {
            None => {
                errors.add("number_of_rooms", "The number of rooms is required.");
                None
            }
            Some(value) => match value.parse::<i16>() {
                Ok(rooms) if (MIN_ROOMS..=MAX_ROOMS).contains(&rooms) => Some(rooms),
                _ => {
                    errors.add(
                        "number_of_rooms",
                        format!(
                            "The number of rooms must be an integer between {MIN_ROOMS} and {MAX_ROOMS}."
                        ),
                    );
                    None
                }
            },
        };

        let furnished = match present(self.furnished.as_ref()) {
            None => {
                errors.add("furnished", "The furnished field is required.");
                None
            }
            Some(value) => parse_bool(value).or_else(|| {
                errors.add("furnished", "The furnished field must be true or false.");
                None
            }),
        };

        match (location, construction_period, number_of_rooms, furnished) {
            (Some(location), Some(construction_period), Some(number_of_rooms), Some(furnished))
                if errors.is_empty() =>
            {
                Ok(RentInsightsRequest {
                    location,
                    construction_period,
                    number_of_rooms,
                    furnished,
                })
            }
            _ => Err(errors),
        }
    }

    fn location(&self, errors: &mut ValidationErrors) -> Option<Location> {
        let longitude = present(self.longitude.as_ref());
        let latitude = present(self.latitude.as_ref());
        let postal_code = present(self.postal_code.as_ref());

        if longitude.is_none() && latitude.is_none() {
            return match postal_code {
                None => {
                    errors.add(
                        "postal_code",
                        "The postal code is required when no coordinate is given.",
                    );
                    None
                }
                Some(code) if code.len() == 5 && code.bytes().all(|b| b.is_ascii_digit()) => {
                    Some(Location::PostalCode(code.to_string()))
                }
                Some(_) => {
                    errors.add("postal_code", "The postal code must be five digits.");
                    None
                }
            };
        }

        if postal_code.is_some() {
            errors.add(
                "postal_code",
                "The postal code must be absent when a coordinate is given.",
            );
        }

        let longitude = coordinate_component(errors, "coordinate.longitude", longitude);
        let latitude = coordinate_component(errors, "coordinate.latitude", latitude);

        let (longitude, latitude) = (longitude?, latitude?);
        match GeometryPoint::from_components(longitude, latitude) {
            Ok(point) if postal_code.is_none() => Some(Location::Coordinate(point)),
            Ok(_) => None,
            Err(e) => {
                errors.add("coordinate", e.to_string());
                None
            }
        }
    }
}

fn coordinate_component(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<&str>,
) -> Option<f64> {
    let Some(value) = value else {
        errors.add(field, "Both coordinate components are required.");
        return None;
    };

    match value.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(parsed),
        _ => {
            errors.add(field, "The coordinate component must be numeric.");
            None
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Envelope of every successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiData<T> {
    /// Response payload.
    pub data: T,
}

/// Rent band in euros per square meter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApiRentInsights {
    /// Highest capped rent.
    pub max_rent: f64,
    /// Lowest floor rent.
    pub min_rent: f64,
    /// Average reference rent.
    pub average_rent: f64,
}

impl From<RentBand> for ApiRentInsights {
    fn from(band: RentBand) -> Self {
        Self {
            max_rent: band.max_rent.euro(),
            min_rent: band.min_rent.euro(),
            average_rent: band.average_rent.euro(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the rent store answered.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}
