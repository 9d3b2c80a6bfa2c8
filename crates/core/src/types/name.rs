//! Customer display name.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`CustomerName`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The input is empty after trimming.
    #[error("name cannot be empty")]
    Empty,
    /// The input is not exactly a first name and a last name.
    #[error("name must be a first and last name separated by one space")]
    WordCount,
    /// A word is not capitalized or contains non-letters.
    #[error("'{0}' must start with an uppercase letter followed by lowercase letters")]
    BadWord(String),
}

/// A customer's full name in "First Last" form.
///
/// Each word is one uppercase letter followed by at least one lowercase
/// letter. Accented letters are accepted (`Ángela Núñez`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerName(String);

impl CustomerName {
    /// Parse a `CustomerName`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns a [`NameError`] if the input is not two capitalized words.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(NameError::Empty);
        }

        let words: Vec<&str> = trimmed.split(' ').collect();
        if words.len() != 2 {
            return Err(NameError::WordCount);
        }

        for word in &words {
            if !is_capitalized_word(word) {
                return Err(NameError::BadWord((*word).to_owned()));
            }
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the first word of the name.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.0.split(' ').next().unwrap_or_default()
    }
}

fn is_capitalized_word(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let rest: Vec<char> = chars.collect();
    first.is_uppercase() && !rest.is_empty() && rest.iter().all(|c| c.is_lowercase())
}

impl fmt::Display for CustomerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CustomerName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CustomerName> for String {
    fn from(name: CustomerName) -> Self {
        name.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for CustomerName {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for CustomerName {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for CustomerName {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_names() {
        assert_eq!(CustomerName::parse("Ana Lopez").unwrap().as_str(), "Ana Lopez");
        assert_eq!(
            CustomerName::parse("  Ángela Núñez ").unwrap().as_str(),
            "Ángela Núñez"
        );
    }

    #[test]
    fn test_parse_rejects_single_word() {
        assert_eq!(CustomerName::parse("Ana"), Err(NameError::WordCount));
    }

    #[test]
    fn test_parse_rejects_three_words() {
        assert_eq!(
            CustomerName::parse("Ana Maria Lopez"),
            Err(NameError::WordCount)
        );
    }

    #[test]
    fn test_parse_rejects_double_space() {
        assert_eq!(CustomerName::parse("Ana  Lopez"), Err(NameError::WordCount));
    }

    #[test]
    fn test_parse_rejects_lowercase_start() {
        assert_eq!(
            CustomerName::parse("ana Lopez"),
            Err(NameError::BadWord("ana".to_owned()))
        );
    }

    #[test]
    fn test_parse_rejects_shouting_and_digits() {
        assert!(CustomerName::parse("ANA Lopez").is_err());
        assert!(CustomerName::parse("Ana L0pez").is_err());
        assert!(CustomerName::parse("A Lopez").is_err());
    }

    #[test]
    fn test_first_name() {
        let name = CustomerName::parse("Ana Lopez").unwrap();
        assert_eq!(name.first_name(), "Ana");
    }
}
