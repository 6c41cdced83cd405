//! Note names: the public lookup key for a stored envelope.
//!
//! A name is `[a-z0-9-]+`, at most 100 characters. Input is trimmed and
//! lowercased before validation. Names carry no cryptographic meaning.

use std::fmt;
use std::str::FromStr;

/// Maximum note name length.
pub const MAX_NAME_LEN: usize = 100;

/// A validated, normalized note name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteName(String);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum NameError {
    #[error("note name cannot be empty")]
    Empty,
    #[error("note name too long (max {MAX_NAME_LEN} characters)")]
    TooLong,
    #[error("note name may only contain letters, numbers, and hyphens")]
    InvalidCharacters,
}

impl NoteName {
    /// Normalize and validate raw user input.
    ///
    /// # Errors
    ///
    /// Returns a [`NameError`] describing the first rule the input breaks.
    pub fn parse(input: &str) -> Result<Self, NameError> {
        let normalized = input.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(NameError::Empty);
        }
        if normalized.len() > MAX_NAME_LEN {
            return Err(NameError::TooLong);
        }
        if !normalized
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(NameError::InvalidCharacters);
        }
        Ok(Self(normalized))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for NoteName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NoteName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NoteName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for NoteName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
