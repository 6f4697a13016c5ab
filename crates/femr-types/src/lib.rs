//! Validated primitive types shared across the fEMR crates.

use std::num::NonZeroU32;
use std::str::FromStr;

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
}

/// Trimmed text with at least one character, used for tab-field category and chief complaint
/// names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input`, rejecting it if nothing is left.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Errors returned when parsing an [`EncounterId`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// The value was zero or negative.
    #[error("encounter id must be a positive integer, got {0}")]
    NotPositive(i64),
    /// The value does not fit the id range.
    #[error("encounter id {0} is out of range")]
    OutOfRange(i64),
    /// The text was not an integer at all.
    #[error("encounter id is not an integer: {0:?}")]
    NotAnInteger(String),
}

/// Identifier of a single patient encounter.
///
/// Encounter ids are positive integers; zero and negative values are rejected at the boundary so
/// the rest of the code never has to re-check them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EncounterId(NonZeroU32);

impl EncounterId {
    /// Creates an `EncounterId` from a signed integer.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::NotPositive`] for zero or negative values and
    /// [`IdError::OutOfRange`] for values above `u32::MAX`.
    pub fn new(value: i64) -> Result<Self, IdError> {
        if value <= 0 {
            return Err(IdError::NotPositive(value));
        }
        let value = u32::try_from(value).map_err(|_| IdError::OutOfRange(value))?;
        NonZeroU32::new(value)
            .map(Self)
            .ok_or(IdError::NotPositive(0))
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl std::fmt::Display for EncounterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EncounterId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value = trimmed
            .parse::<i64>()
            .map_err(|_| IdError::NotAnInteger(trimmed.to_owned()))?;
        Self::new(value)
    }
}

impl serde::Serialize for EncounterId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u32(self.get())
    }
}

impl<'de> serde::Deserialize<'de> for EncounterId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = i64::deserialize(deserializer)?;
        EncounterId::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  cough  ").expect("non-empty");
        assert_eq!(text.as_str(), "cough");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert!(matches!(NonEmptyText::new(" \t\n"), Err(TextError::Empty)));
    }

    #[test]
    fn encounter_id_accepts_positive_values() {
        let id = EncounterId::new(42).expect("valid id");
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn encounter_id_rejects_zero_and_negative() {
        assert_eq!(EncounterId::new(0), Err(IdError::NotPositive(0)));
        assert_eq!(EncounterId::new(-7), Err(IdError::NotPositive(-7)));
    }

    #[test]
    fn encounter_id_rejects_out_of_range() {
        let too_big = i64::from(u32::MAX) + 1;
        assert_eq!(EncounterId::new(too_big), Err(IdError::OutOfRange(too_big)));
    }

    #[test]
    fn encounter_id_parses_from_str() {
        assert_eq!("17".parse::<EncounterId>().map(EncounterId::get), Ok(17));
        assert!(matches!(
            "abc".parse::<EncounterId>(),
            Err(IdError::NotAnInteger(s)) if s == "abc"
        ));
    }

    #[test]
    fn encounter_id_deserialises_with_validation() {
        let id: EncounterId = serde_json::from_str("5").expect("valid id");
        assert_eq!(id.get(), 5);
        assert!(serde_json::from_str::<EncounterId>("0").is_err());
    }
}
