//! Shared validation helpers for inbound HTTP adapters.

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::domain::{EntityId, Error, MetadataKey};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidId,
    InvalidTimestamp,
    InvalidKey,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidId => "invalid_id",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidKey => "invalid_key",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn require_field<T>(value: Option<T>, field: FieldName) -> Result<T, Error> {
    value.ok_or_else(|| missing_field_error(field))
}

pub(crate) fn parse_entity_id(value: &str, field: FieldName) -> Result<EntityId, Error> {
    value.parse().map_err(|_| {
        let name = field.as_str();
        ValidationError::new(name, format!("{name} must be an integer identifier"))
            .with_value(ErrorCode::InvalidId, value)
    })
}

pub(crate) fn invalid_timestamp_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be an RFC 3339 timestamp"))
        .with_value(ErrorCode::InvalidTimestamp, value)
}

pub(crate) fn parse_rfc3339_timestamp(
    value: String,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(&value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| invalid_timestamp_error(field, &value))
}

pub(crate) fn parse_metadata_key(value: String) -> Result<MetadataKey, Error> {
    MetadataKey::new(value.as_str()).map_err(|error| {
        ValidationError::new("key", error.to_string()).with_value(ErrorCode::InvalidKey, value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode as DomainErrorCode;
    use rstest::rstest;

    const TITLE: FieldName = FieldName::new("title");
    const DATE: FieldName = FieldName::new("date");
    const ID: FieldName = FieldName::new("id");

    #[rstest]
    fn missing_fields_name_the_field() {
        let err = require_field::<String>(None, TITLE).expect_err("missing");
        assert_eq!(err.code(), DomainErrorCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details["field"], "title");
        assert_eq!(details["code"], "missing_field");
    }

    #[rstest]
    #[case("2030-01-02T18:30:00Z")]
    #[case("2030-01-02T19:30:00+01:00")]
    fn timestamps_normalise_to_utc(#[case] raw: &str) {
        let parsed = parse_rfc3339_timestamp(raw.to_owned(), DATE).expect("valid");
        assert_eq!(parsed.to_rfc3339(), "2030-01-02T18:30:00+00:00");
    }

    #[rstest]
    fn malformed_timestamps_are_rejected() {
        let err = parse_rfc3339_timestamp("next tuesday".to_owned(), DATE).expect_err("bad");
        assert_eq!(err.details().expect("details")["code"], "invalid_timestamp");
    }

    #[rstest]
    #[case("12", Some(12))]
    #[case("twelve", None)]
    fn ids_must_be_integers(#[case] raw: &str, #[case] expected: Option<i64>) {
        let parsed = parse_entity_id(raw, ID).ok().map(EntityId::get);
        assert_eq!(parsed, expected);
    }

    #[rstest]
    fn metadata_keys_reject_whitespace() {
        let err = parse_metadata_key("MEETUP API KEY".to_owned()).expect_err("whitespace");
        assert_eq!(err.details().expect("details")["code"], "invalid_key");
    }
}
