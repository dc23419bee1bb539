#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Money and rent-control taxonomy types.
//!
//! The Paris "encadrement des loyers" dataset keys every price band on a
//! building-era bucket ([`ConstructionPeriod`]) and expresses prices in euros
//! per square meter with up to four fractional digits. Prices are carried as
//! [`Money`], a scaled-integer value that never goes through floating point
//! on its way to or from storage.

mod money;

pub use money::{Money, MoneyError, SUBUNITS_PER_EURO};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Currency tag carried by [`Money`].
///
/// The dataset is published in euros only and no conversion is performed.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Currency {
    /// Euro.
    #[default]
    Eur,
}

/// Building-era bucket used as a rent-determining factor.
///
/// The string forms are the labels used by the published dataset and by the
/// API (`"Avant 1946"`, `"1946-1970"`, `"1971-1990"`, `"Apres 1990"`). The
/// ordinal is what gets stored.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ConstructionPeriod {
    /// Built before 1946.
    #[serde(rename = "Avant 1946")]
    #[strum(to_string = "Avant 1946")]
    Before1946 = 1,
    /// Built between 1946 and 1970.
    #[serde(rename = "1946-1970")]
    #[strum(to_string = "1946-1970")]
    Between1946And1970 = 2,
    /// Built between 1971 and 1990.
    #[serde(rename = "1971-1990")]
    #[strum(to_string = "1971-1990")]
    Between1971And1990 = 3,
    /// Built after 1990. The published CSV spells it with an accent.
    #[serde(rename = "Apres 1990", alias = "Après 1990")]
    #[strum(to_string = "Apres 1990", serialize = "Après 1990")]
    After1990 = 4,
}

impl ConstructionPeriod {
    /// Canonical labels accepted by the API.
    #[must_use]
    pub const fn labels() -> &'static [&'static str] {
        &["Avant 1946", "1946-1970", "1971-1990", "Apres 1990"]
    }

    /// Returns the stored ordinal (1-4).
    #[must_use]
    pub const fn ordinal(self) -> i16 {
        self as i16
    }

    /// Creates a period from its stored ordinal.
    ///
    /// # Errors
    ///
    /// Returns an error if the ordinal is not in the range 1-4.
    pub const fn from_ordinal(ordinal: i16) -> Result<Self, InvalidConstructionPeriodError> {
        match ordinal {
            1 => Ok(Self::Before1946),
            2 => Ok(Self::Between1946And1970),
            3 => Ok(Self::Between1971And1990),
            4 => Ok(Self::After1990),
            _ => Err(InvalidConstructionPeriodError::Ordinal(ordinal)),
        }
    }

    /// Parses a dataset/API label. There is no fallback bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the label is not one of the known forms.
    pub fn from_label(label: &str) -> Result<Self, InvalidConstructionPeriodError> {
        label
            .trim()
            .parse()
            .map_err(|_| InvalidConstructionPeriodError::Label(label.to_string()))
    }
}

/// Error returned when a [`ConstructionPeriod`] cannot be built from its
/// stored ordinal or its label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidConstructionPeriodError {
    /// Stored ordinal outside 1-4.
    #[error("invalid construction period ordinal {0}: expected 1-4")]
    Ordinal(i16),
    /// Unknown label.
    #[error("unknown construction period '{0}'")]
    Label(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_period_labels_roundtrip() {
        for label in ConstructionPeriod::labels() {
            let period = ConstructionPeriod::from_label(label).unwrap();
            assert_eq!(period.to_string(), *label);
        }
    }

    #[test]
    fn construction_period_accepts_accented_label() {
        assert_eq!(
            ConstructionPeriod::from_label("Après 1990").unwrap(),
            ConstructionPeriod::After1990
        );
        assert_eq!(ConstructionPeriod::After1990.to_string(), "Apres 1990");
    }

    #[test]
    fn construction_period_rejects_unknown_label() {
        assert_eq!(
            ConstructionPeriod::from_label("Avant 1900"),
            Err(InvalidConstructionPeriodError::Label("Avant 1900".to_string()))
        );
    }

    #[test]
    fn construction_period_ordinal_roundtrip() {
        for ordinal in 1..=4 {
            assert_eq!(
                ConstructionPeriod::from_ordinal(ordinal).unwrap().ordinal(),
                ordinal
            );
        }
        assert!(ConstructionPeriod::from_ordinal(0).is_err());
        assert!(ConstructionPeriod::from_ordinal(5).is_err());
    }

    #[test]
    fn construction_period_serde_uses_labels() {
        let json = serde_json::to_string(&ConstructionPeriod::Before1946).unwrap();
        assert_eq!(json, "\"Avant 1946\"");
        let parsed: ConstructionPeriod = serde_json::from_str("\"Après 1990\"").unwrap();
        assert_eq!(parsed, ConstructionPeriod::After1990);
    }
}
