//! Conversions for TEXT columns holding UUIDs and RFC3339 timestamps.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult, ValidationError};

pub fn parse_uuid(value: &str, field_name: &str) -> DomainResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        DomainError::Validation(ValidationError::format(
            field_name,
            &format!("Invalid UUID format: {}", value),
        ))
    })
}

pub fn parse_optional_uuid(value: &Option<String>, field_name: &str) -> DomainResult<Option<Uuid>> {
    value.as_deref().map(|s| parse_uuid(s, field_name)).transpose()
}

pub fn parse_datetime(value: &str, field_name: &str) -> DomainResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            DomainError::Validation(ValidationError::format(
                field_name,
                &format!("Invalid RFC3339 format: {}", value),
            ))
        })
}
