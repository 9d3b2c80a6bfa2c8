//! Unit prices using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC(12, 2)` and never touch floating point.
//! The store sells in a single currency, so a price is just an amount.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::quantity::Quantity;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price cannot be negative (got {0})")]
    Negative(Decimal),
}

/// A non-negative unit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount))
    }

    /// The amount in the store currency.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(&self, quantity: Quantity) -> Decimal {
        self.0 * Decimal::from(quantity.get())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_negative() {
        assert!(matches!(
            Price::new(Decimal::new(-1, 2)),
            Err(PriceError::Negative(_))
        ));
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_times_quantity() {
        let price = Price::new(Decimal::new(3000, 2)).unwrap();
        let qty = Quantity::new(3).unwrap();
        assert_eq!(price.times(qty), Decimal::new(9000, 2));
    }

    #[test]
    fn test_display_two_decimals() {
        let price = Price::new(Decimal::new(305, 1)).unwrap();
        assert_eq!(price.to_string(), "30.50");
    }

    #[test]
    fn test_serializes_as_string() {
        let price = Price::new(Decimal::new(1999, 2)).unwrap();
        assert_eq!(serde_json::to_string(&price).unwrap(), "\"19.99\"");
    }
}
