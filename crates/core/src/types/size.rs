//! Size (variant) label of a cart line.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Size`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeError {
    /// The label is blank.
    #[error("size is required")]
    Empty,
    /// The label is longer than the column allows.
    #[error("size must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// The variant label a customer picked for a product (shoe size in practice).
///
/// A cart holds at most one line per (customer, product, size).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Size(String);

impl Size {
    /// Maximum label length.
    pub const MAX_LENGTH: usize = 16;

    /// Label used when a product is added without choosing a size.
    pub const DEFAULT: &'static str = "38";

    /// Parse a size label, trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns a [`SizeError`] for blank or oversized labels.
    pub fn parse(s: &str) -> Result<Self, SizeError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(SizeError::Empty);
        }
        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(SizeError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the label as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Size {
    fn default() -> Self {
        Self(Self::DEFAULT.to_owned())
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Size {
    type Error = SizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Size> for String {
    fn from(size: Size) -> Self {
        size.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Size {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Size {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Size {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_38() {
        assert_eq!(Size::default().as_str(), "38");
    }

    #[test]
    fn test_parse_trims() {
        assert_eq!(Size::parse(" 42 ").map(|s| s.0), Ok("42".to_owned()));
    }

    #[test]
    fn test_parse_rejects_blank() {
        assert_eq!(Size::parse("  "), Err(SizeError::Empty));
    }

    #[test]
    fn test_parse_rejects_long_labels() {
        assert!(matches!(
            Size::parse(&"X".repeat(17)),
            Err(SizeError::TooLong { max: 16 })
        ));
    }
}
