use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{DomainResult, ValidationError};

/// Trait for validating entities and request values.
pub trait Validate {
    /// Validates the value and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

/// Longest identifier accepted for field and entity type names.
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

lazy_static! {
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap();
}

/// Field names and entity types end up inside SQL and JSON paths, so they are
/// restricted to plain identifiers.
pub fn validate_identifier(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::max_length(field, MAX_IDENTIFIER_LENGTH));
    }
    if !IDENTIFIER_REGEX.is_match(value) {
        return Err(ValidationError::format(field, &format!("'{}' is not a valid identifier", value)));
    }
    Ok(())
}
