//! Type-safe price representation using decimal arithmetic.
//!
//! Prices arrive from forms as text and leave for the backend as JSON
//! numbers. [`Price::parse`] is the only way to get from one to the other,
//! so a malformed amount can never reach the wire as `NaN` or `null`.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`] from form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input is empty.
    #[error("Price is required")]
    Empty,
    /// The input is not a decimal number.
    #[error("Price must be a number")]
    NotANumber,
    /// The amount is below zero.
    #[error("Price cannot be negative")]
    Negative,
    /// The amount has more than two fraction digits.
    #[error("Price can have at most {max} decimal places")]
    TooPrecise {
        /// Maximum number of fraction digits.
        max: u32,
    },
}

/// A non-negative amount in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Price {
    /// Maximum number of fraction digits accepted from input.
    pub const MAX_SCALE: u32 = 2;

    /// Parse a price from form input such as `"12.5"` or `" 3 "`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, not a plain decimal number,
    /// negative, or has more than two fraction digits.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim().trim_start_matches('$');
        if s.is_empty() {
            return Err(PriceError::Empty);
        }

        let amount = Decimal::from_str(s).map_err(|_| PriceError::NotANumber)?;

        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }

        if amount.normalize().scale() > Self::MAX_SCALE {
            return Err(PriceError::TooPrecise {
                max: Self::MAX_SCALE,
            });
        }

        Ok(Self(amount.abs()))
    }

    /// Create a price from a whole number of cents.
    #[must_use]
    pub fn from_cents(cents: u32) -> Self {
        Self(Decimal::new(i64::from(cents), 2))
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Format for form input (e.g., `"12.50"`), the inverse of [`Price::parse`].
    #[must_use]
    pub fn to_input(&self) -> String {
        format!("{:.2}", self.0)
    }
}

/// Formats for display (e.g., `$12.50`).
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(Price::parse("12.5").unwrap(), Price::from_cents(1250));
        assert_eq!(Price::parse(" 3 ").unwrap(), Price::from_cents(300));
        assert_eq!(Price::parse("$0.99").unwrap(), Price::from_cents(99));
        assert_eq!(Price::parse("0").unwrap(), Price::from_cents(0));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert_eq!(Price::parse("abc"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("12,50"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("NaN"), Err(PriceError::NotANumber));
        assert_eq!(Price::parse("1e3"), Err(PriceError::NotANumber));
    }

    #[test]
    fn test_parse_rejects_empty_and_negative() {
        assert_eq!(Price::parse("  "), Err(PriceError::Empty));
        assert_eq!(Price::parse("-1"), Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_rejects_sub_cent_amounts() {
        assert_eq!(
            Price::parse("1.999"),
            Err(PriceError::TooPrecise { max: 2 })
        );
        // Trailing zeros do not count as precision.
        assert!(Price::parse("1.500").is_ok());
    }

    #[test]
    fn test_display_and_input_format() {
        let price = Price::parse("7.5").unwrap();
        assert_eq!(price.to_string(), "$7.50");
        assert_eq!(price.to_input(), "7.50");
    }

    #[test]
    fn test_serializes_as_json_number() {
        let price = Price::parse("19.99").unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "19.99");
    }

    #[test]
    fn test_deserializes_backend_number() {
        let price: Price = serde_json::from_str("25").unwrap();
        assert_eq!(price, Price::from_cents(2500));
    }
}
