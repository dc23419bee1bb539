//! Fixed-point monetary value.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive as _;
use serde::{Serialize, Serializer};

use crate::Currency;

/// Number of stored subunits per euro (four fractional digits).
pub const SUBUNITS_PER_EURO: i64 = 10_000;

/// Error returned when an amount cannot be turned into [`Money`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// The amount is not a finite number or does not fit once scaled.
    #[error("invalid money amount '{value}'")]
    InvalidInput {
        /// The rejected input, as text.
        value: String,
    },
}

impl MoneyError {
    fn invalid(value: impl fmt::Display) -> Self {
        Self::InvalidInput {
            value: value.to_string(),
        }
    }
}

/// An amount of money stored as an integer number of subunits
/// ([`SUBUNITS_PER_EURO`] per euro).
///
/// Aggregations (`MAX`, `MIN`, `AVG`) run over the integer representation so
/// no rounding drift builds up across rows. There are two ways in:
/// [`Money::from_subunits`] for values that are already scaled, and the
/// decimal constructors ([`Money::from_euros`], [`Money::from_decimal`],
/// [`FromStr`]) which scale by 10,000 and truncate toward zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money {
    subunits: i64,
    currency: Currency,
}

impl Money {
    /// Zero euros.
    #[must_use]
    pub const fn zero() -> Self {
        Self::from_subunits(0)
    }

    /// Wraps an already-scaled amount as-is.
    #[must_use]
    pub const fn from_subunits(subunits: i64) -> Self {
        Self {
            subunits,
            currency: Currency::Eur,
        }
    }

    /// Scales a decimal euro amount by 10,000 and truncates toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidInput`] if the scaled amount does not fit
    /// in an `i64`.
    pub fn from_decimal(euros: Decimal) -> Result<Self, MoneyError> {
        euros
            .checked_mul(Decimal::from(SUBUNITS_PER_EURO))
            .and_then(|scaled| scaled.trunc().to_i64())
            .map(Self::from_subunits)
            .ok_or_else(|| MoneyError::invalid(euros))
    }

    /// Scales a floating-point euro amount by 10,000 and truncates toward
    /// zero.
    ///
    /// The float is read through its shortest decimal rendering, so `27.6`
    /// becomes `276000` subunits rather than `275999`.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::InvalidInput`] for NaN, infinities and amounts
    /// too large to scale.
    pub fn from_euros(euros: f64) -> Result<Self, MoneyError> {
        if !euros.is_finite() {
            return Err(MoneyError::invalid(euros));
        }

        let decimal =
            Decimal::from_str(&euros.to_string()).map_err(|_| MoneyError::invalid(euros))?;

        Self::from_decimal(decimal)
    }

    /// Raw stored subunits.
    #[must_use]
    pub const fn amount(self) -> i64 {
        self.subunits
    }

    /// Value in euros (`subunits / 10,000`).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn euro(self) -> f64 {
        self.subunits as f64 / SUBUNITS_PER_EURO as f64
    }

    /// Exact value in euros.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.subunits, 4)
    }

    /// Currency tag.
    #[must_use]
    pub const fn currency(self) -> Currency {
        self.currency
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.subunits == 0
    }
}

impl FromStr for Money {
    type Err = MoneyError;

    /// Parses a decimal euro amount such as `"27.6"`. A decimal comma
    /// (`"27,6"`) is accepted as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(MoneyError::invalid(s));
        }

        let normalized = trimmed.replace(',', ".");
        let decimal = Decimal::from_str(&normalized)
            .or_else(|_| Decimal::from_scientific(&normalized))
            .map_err(|_| MoneyError::invalid(s))?;

        Self::from_decimal(decimal)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal(), self.currency)
    }
}

#[derive(Serialize)]
struct MoneyView {
    subunits: i64,
    euro: f64,
    currency: Currency,
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        MoneyView {
            subunits: self.subunits,
            euro: self.euro(),
            currency: self.currency,
        }
        .serialize(serializer)
    }
}
