//! Cart and order line quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// The value is zero or negative.
    #[error("quantity must be at least 1 (got {0})")]
    BelowOne(i64),
    /// The value does not fit the database column.
    #[error("quantity is too large (got {0})")]
    TooLarge(i64),
}

/// A line quantity, always at least 1.
///
/// Stored as `INT` with `CHECK (quantity >= 1)`, so the upper bound is
/// `i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// One unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::BelowOne` for values under 1 and
    /// `QuantityError::TooLarge` for values above `i32::MAX`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::BelowOne(value));
        }
        i32::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::TooLarge(value))
    }

    /// The quantity as an `i32`.
    #[must_use]
    pub const fn get(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(i64::from(raw))?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
