//! Type-safe price representation using decimal arithmetic.
//!
//! The document database stores money as doubles, so `Price` serializes as a
//! JSON number and is converted to a `Decimal` at the boundary. All
//! arithmetic inside the dashboard happens on the decimal value and is
//! checked: amounts typed into a form must stay below [`Price::LIMIT`], and
//! sums or products that leave that range come back as `None`.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A monetary amount in the store's currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

/// Errors parsing a price.
#[derive(Debug, Error)]
pub enum PriceError {
    /// The text is not a decimal number.
    #[error("not a number: {0}")]
    Invalid(#[from] rust_decimal::Error),

    /// The amount does not fit below [`Price::LIMIT`].
    #[error("{0} is out of range")]
    OutOfRange(Decimal),
}

impl Price {
    /// A zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Exclusive bound on the magnitude of a checked amount (10^15).
    ///
    /// Doubles represent every cent below this exactly, so anything the
    /// dashboard writes reads back unchanged.
    pub const LIMIT: Self = Self(Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0));

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// `Some(price)` if `amount` is below [`Price::LIMIT`] in magnitude.
    #[must_use]
    pub fn checked(amount: Decimal) -> Option<Self> {
        (amount.abs() < Self::LIMIT.0).then_some(Self(amount))
    }

    /// Multiply a unit price by a quantity, or `None` if the total is out of range.
    #[must_use]
    pub fn checked_times(self, quantity: i64) -> Option<Self> {
        self.0
            .checked_mul(Decimal::from(quantity))
            .and_then(Self::checked)
    }

    /// Add two amounts, or `None` if the sum is out of range.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).and_then(Self::checked)
    }

    /// Sum amounts, or `None` as soon as a partial sum leaves the range.
    #[must_use]
    pub fn checked_sum<I: IntoIterator<Item = Self>>(prices: I) -> Option<Self> {
        prices
            .into_iter()
            .try_fold(Self::ZERO, Self::checked_add)
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        format!("${:.2}", self.0.round_dp(2))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('$');
        let amount = Decimal::from_str(trimmed)?;
        Self::checked(amount).ok_or(PriceError::OutOfRange(amount))
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_units(10).display(), "$10.00");
        assert_eq!("19.99".parse::<Price>().unwrap().to_string(), "$19.99");
        assert_eq!("$5".parse::<Price>().unwrap(), Price::from_units(5));
    }

    #[test]
    fn test_price_serializes_as_number() {
        let json = serde_json::to_value(Price::from_units(12)).unwrap();
        assert!(json.is_number());

        let back: Price = serde_json::from_value(serde_json::json!(12)).unwrap();
        assert_eq!(back, Price::from_units(12));

        let fractional: Price = serde_json::from_value(serde_json::json!(2.5)).unwrap();
        assert_eq!(fractional, "2.5".parse().unwrap());
    }

    #[test]
    fn test_price_arithmetic() {
        let unit = Price::from_units(3);
        assert_eq!(unit.checked_times(4), Some(Price::from_units(12)));

        let total = Price::checked_sum([Price::from_units(1), Price::from_units(2)]);
        assert_eq!(total, Some(Price::from_units(3)));
        assert_eq!(Price::checked_sum(std::iter::empty()), Some(Price::ZERO));
    }

    #[test]
    fn test_price_arithmetic_out_of_range() {
        let unit: Price = "100000000000".parse().unwrap();
        assert_eq!(unit.checked_times(i64::MAX), None);
        assert_eq!(unit.checked_times(10_000), None);
        assert!(unit.checked_times(9_999).is_some());

        let huge = Price::new("50000000000000000000000000000".parse().unwrap());
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(Price::checked_sum([huge, huge]), None);
    }

    #[test]
    fn test_price_parse_rejects_out_of_range() {
        assert!(matches!(
            "79228162514264337593543950335".parse::<Price>(),
            Err(PriceError::OutOfRange(_))
        ));
        assert!(matches!(
            "1000000000000000".parse::<Price>(),
            Err(PriceError::OutOfRange(_))
        ));
        assert!(matches!(
            "-1000000000000000".parse::<Price>(),
            Err(PriceError::OutOfRange(_))
        ));
        assert!(matches!("abc".parse::<Price>(), Err(PriceError::Invalid(_))));
        assert_eq!(
            "999999999999999.99".parse::<Price>().unwrap().to_string(),
            "$999999999999999.99"
        );
    }
}
