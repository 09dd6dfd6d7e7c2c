//! Flat string-keyed configuration entries.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key holding the events service API key.
pub const MEETUP_API_KEY: &str = "MEETUP_API_KEY";
/// Key holding the events service group URL name.
pub const MEETUP_GROUP_NAME: &str = "MEETUP_GROUP_NAME";

/// Validated metadata key.
///
/// ## Invariants
/// - Non-empty, no whitespace, at most [`MetadataKey::MAX_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MetadataKey(String);

/// Validation errors for [`MetadataKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataKeyValidationError {
    #[error("metadata key must not be empty")]
    Empty,
    #[error("metadata key must not contain whitespace")]
    ContainsWhitespace,
    #[error("metadata key must be at most {max} bytes")]
    TooLong { max: usize },
}

impl MetadataKey {
    /// Longest accepted key.
    pub const MAX_LEN: usize = 128;

    /// Validate and wrap a key.
    pub fn new(value: impl Into<String>) -> Result<Self, MetadataKeyValidationError> {
        let raw = value.into();
        if raw.is_empty() {
            return Err(MetadataKeyValidationError::Empty);
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(MetadataKeyValidationError::ContainsWhitespace);
        }
        if raw.len() > Self::MAX_LEN {
            return Err(MetadataKeyValidationError::TooLong { max: Self::MAX_LEN });
        }
        Ok(Self(raw))
    }

    /// Key for the events service API key.
    #[must_use]
    pub fn api_key() -> Self {
        Self(MEETUP_API_KEY.to_owned())
    }

    /// Key for the events service group name.
    #[must_use]
    pub fn group_name() -> Self {
        Self(MEETUP_GROUP_NAME.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for MetadataKey {
    type Error = MetadataKeyValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MetadataKey> for String {
    fn from(value: MetadataKey) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", MetadataKeyValidationError::Empty)]
    #[case("API KEY", MetadataKeyValidationError::ContainsWhitespace)]
    fn rejects_malformed_keys(#[case] raw: &str, #[case] expected: MetadataKeyValidationError) {
        assert_eq!(MetadataKey::new(raw), Err(expected));
    }

    #[rstest]
    fn rejects_oversized_keys() {
        let raw = "k".repeat(MetadataKey::MAX_LEN + 1);
        assert!(matches!(
            MetadataKey::new(raw),
            Err(MetadataKeyValidationError::TooLong { .. })
        ));
    }

    #[rstest]
    fn well_known_keys_are_valid() {
        assert_eq!(MetadataKey::new(MEETUP_API_KEY), Ok(MetadataKey::api_key()));
        assert_eq!(
            MetadataKey::new(MEETUP_GROUP_NAME),
            Ok(MetadataKey::group_name())
        );
    }
}
