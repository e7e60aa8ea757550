use std::fmt;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;
use crate::domains::core::file_storage_service::FileStorageError;

/// Database errors
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Connection pool error: {0}")]
    ConnectionPool(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Record not found: {0} with ID {1}")]
    NotFound(String, String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Database error: {0}")]
    Other(String),
}

impl serde::Serialize for DbError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("DbError", 2)?;
        match self {
            DbError::Sqlx(err) => {
                state.serialize_field("type", "Sqlx")?;
                state.serialize_field("message", &err.to_string())?;
            }
            DbError::ConnectionPool(s) => {
                state.serialize_field("type", "ConnectionPool")?;
                state.serialize_field("message", s)?;
            }
            DbError::Query(s) => {
                state.serialize_field("type", "Query")?;
                state.serialize_field("message", s)?;
            }
            DbError::NotFound(s1, s2) => {
                state.serialize_field("type", "NotFound")?;
                state.serialize_field("message", &format!("Record not found: {} with ID {}", s1, s2))?;
            }
            DbError::Migration(s) => {
                state.serialize_field("type", "Migration")?;
                state.serialize_field("message", s)?;
            }
            DbError::Other(s) => {
                state.serialize_field("type", "Other")?;
                state.serialize_field("message", s)?;
            }
        }
        state.end()
    }
}

/// `sqlx::Error` is not `Clone`, so the SQLx variant degrades to its message.
impl Clone for DbError {
    fn clone(&self) -> Self {
        match self {
            DbError::Sqlx(err) => DbError::Other(format!("SQLx error: {}", err)),
            DbError::ConnectionPool(s) => DbError::ConnectionPool(s.clone()),
            DbError::Query(s) => DbError::Query(s.clone()),
            DbError::NotFound(s1, s2) => DbError::NotFound(s1.clone(), s2.clone()),
            DbError::Migration(s) => DbError::Migration(s.clone()),
            DbError::Other(s) => DbError::Other(s.clone()),
        }
    }
}

/// Domain-level errors
#[derive(Debug, Error, Clone, Serialize)]
pub enum DomainError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    #[error("Entity not found: {0} with ID {1}")]
    EntityNotFound(String, Uuid),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Export error: {0}")]
    Export(String),

    #[error("File error: {0}")]
    File(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FileStorageError> for DomainError {
    fn from(error: FileStorageError) -> Self {
        DomainError::File(error.to_string())
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(error: sqlx::Error) -> Self {
        DomainError::Database(DbError::Sqlx(error))
    }
}

/// Service-level errors.
///
/// The `*Silent` variants carry an internal diagnostic that is logged but never
/// shown to the end user; their `Display` output stays generic.
#[derive(Debug, Error, Clone, Serialize)]
pub enum ServiceError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Not found")]
    NotFoundSilent(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Forbidden")]
    ForbiddenSilent(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ServiceError {
    /// Whether details of this error must be withheld from the caller.
    pub fn is_silent(&self) -> bool {
        matches!(self, ServiceError::NotFoundSilent(_) | ServiceError::ForbiddenSilent(_))
    }

    /// Internal message, including details hidden by silent variants.
    pub fn diagnostic(&self) -> String {
        match self {
            ServiceError::NotFoundSilent(msg) | ServiceError::ForbiddenSilent(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Message safe to hand to an end user.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::NotFoundSilent(_) => "Not found".to_string(),
            ServiceError::Forbidden(_) | ServiceError::ForbiddenSilent(_) => "Forbidden".to_string(),
            other => other.to_string(),
        }
    }
}

/// Validation errors
#[derive(Debug, Error, Clone, Serialize)]
pub enum ValidationError {
    #[error("Field '{field}' is required")]
    Required {
        field: String,
    },

    #[error("Field '{field}' cannot exceed {max} characters")]
    MaxLength {
        field: String,
        max: usize,
    },

    #[error("Field '{field}' must be between {min} and {max}")]
    Range {
        field: String,
        min: String,
        max: String,
    },

    #[error("Field '{field}' contains invalid format: {reason}")]
    Format {
        field: String,
        reason: String,
    },

    #[error("Field '{field}' contains an invalid value: {reason}")]
    InvalidValue {
        field: String,
        reason: String,
    },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        Self::Required {
            field: field.to_string(),
        }
    }

    pub fn max_length(field: &str, max: usize) -> Self {
        Self::MaxLength {
            field: field.to_string(),
            max,
        }
    }

    pub fn range<T: fmt::Display>(field: &str, min: T, max: T) -> Self {
        Self::Range {
            field: field.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    pub fn format(field: &str, reason: &str) -> Self {
        Self::Format {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_errors_hide_diagnostics() {
        let err = ServiceError::ForbiddenSilent("User has no 'export' permission.".to_string());
        assert!(err.is_silent());
        assert_eq!(err.to_string(), "Forbidden");
        assert_eq!(err.public_message(), "Forbidden");
        assert_eq!(err.diagnostic(), "User has no 'export' permission.");

        let not_found = ServiceError::NotFoundSilent("Import 42 missing".to_string());
        assert!(not_found.is_silent());
        assert_eq!(not_found.public_message(), "Not found");
    }

    #[test]
    fn forbidden_is_not_silent_but_public_message_is_generic() {
        let err = ServiceError::Forbidden("no read access to Contact".to_string());
        assert!(!err.is_silent());
        assert_eq!(err.public_message(), "Forbidden");
        assert!(err.diagnostic().contains("Contact"));
    }

    #[test]
    fn db_error_clone_degrades_sqlx_variant() {
        let err = DbError::Sqlx(sqlx::Error::RowNotFound);
        match err.clone() {
            DbError::Other(msg) => assert!(msg.starts_with("SQLx error")),
            other => panic!("unexpected clone: {:?}", other),
        }
    }
}
