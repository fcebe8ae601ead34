//! Stock quantity.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Stock`] from form input.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    /// The input is empty.
    #[error("Stock is required")]
    Empty,
    /// The input is not a whole number.
    #[error("Stock must be a whole number")]
    NotANumber,
    /// The quantity is below zero.
    #[error("Stock cannot be negative")]
    Negative,
}

/// Units on hand for a product. Always a whole, non-negative number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stock(u32);

impl Stock {
    /// Create a stock quantity.
    #[must_use]
    pub const fn new(units: u32) -> Self {
        Self(units)
    }

    /// Returns the number of units.
    #[must_use]
    pub const fn units(&self) -> u32 {
        self.0
    }

    /// Parse a stock quantity from form input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, negative, or not a whole number.
    pub fn parse(s: &str) -> Result<Self, StockError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StockError::Empty);
        }
        if let Some(digits) = s.strip_prefix('-')
            && !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(StockError::Negative);
        }
        s.parse::<u32>().map(Self).map_err(|_| StockError::NotANumber)
    }
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Stock {
    type Err = StockError;

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
        assert_eq!(Stock::parse("0").unwrap(), Stock::new(0));
        assert_eq!(Stock::parse(" 12 ").unwrap(), Stock::new(12));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Stock::parse(""), Err(StockError::Empty));
        assert_eq!(Stock::parse("-3"), Err(StockError::Negative));
        assert_eq!(Stock::parse("ten"), Err(StockError::NotANumber));
        assert_eq!(Stock::parse("1.5"), Err(StockError::NotANumber));
    }

    #[test]
    fn test_serializes_as_json_number() {
        assert_eq!(serde_json::to_string(&Stock::new(4)).unwrap(), "4");
    }
}
