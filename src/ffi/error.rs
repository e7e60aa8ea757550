use std::fmt;
use serde::{Deserialize, Serialize};

use crate::errors::{DbError, DomainError, ServiceError, ValidationError};

/// Error codes for FFI boundary
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Success (no error)
    Success = 0,

    // General errors (1-99)
    Unknown = 1,
    InvalidArgument = 2,
    NullPointer = 3,
    InvalidUtf8 = 4,
    InvalidUuid = 5,
    InternalError = 6,

    // Database errors (100-199)
    DatabaseGeneral = 100,
    DatabaseNotFound = 101,
    DatabaseConnection = 104,
    DatabaseMigration = 106,

    // Domain errors (200-299)
    DomainGeneral = 200,
    EntityNotFound = 201,
    AuthorizationFailed = 202,
    ValidationFailed = 204,
    FileError = 207,
    ExportFailed = 209,

    // Service errors (300-399)
    ServiceGeneral = 300,
    PermissionDenied = 305,
    ConfigurationError = 310,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({})", self, *self as i32)
    }
}

/// Error type for FFI boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FFIError {
    /// Error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (JSON string)
    pub details: Option<String>,
}

pub type FFIResult<T> = Result<T, FFIError>;

impl fmt::Display for FFIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(details) = &self.details {
            write!(f, "{}: {} ({})", self.code, self.message, details)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for FFIError {}

impl FFIError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: &str, details: &str) -> Self {
        Self {
            code,
            message: message.to_string(),
            details: Some(details.to_string()),
        }
    }

    pub fn invalid_argument(message: &str) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn internal(message: String) -> Self {
        Self::new(ErrorCode::InternalError, &message)
    }
}

impl From<DbError> for FFIError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Sqlx(sqlx_err) => Self::new(ErrorCode::DatabaseGeneral, &sqlx_err.to_string()),
            DbError::NotFound(entity, id) => Self::with_details(
                ErrorCode::DatabaseNotFound,
                &format!("Record not found: {} with ID {}", entity, id),
                &serde_json::json!({ "entity": entity, "id": id }).to_string(),
            ),
            DbError::ConnectionPool(msg) => Self::new(ErrorCode::DatabaseConnection, &msg),
            DbError::Migration(msg) => Self::new(ErrorCode::DatabaseMigration, &msg),
            DbError::Query(msg) | DbError::Other(msg) => Self::new(ErrorCode::DatabaseGeneral, &msg),
        }
    }
}

impl From<ValidationError> for FFIError {
    fn from(err: ValidationError) -> Self {
        let details = serde_json::to_string(&err).ok();
        Self {
            code: ErrorCode::ValidationFailed,
            message: err.to_string(),
            details,
        }
    }
}

impl From<DomainError> for FFIError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Database(db_err) => db_err.into(),
            DomainError::EntityNotFound(entity, id) => Self::with_details(
                ErrorCode::EntityNotFound,
                &format!("Entity not found: {} with ID {}", entity, id),
                &serde_json::json!({ "entity": entity, "id": id.to_string() }).to_string(),
            ),
            DomainError::AuthorizationFailed(msg) => Self::new(ErrorCode::AuthorizationFailed, &msg),
            DomainError::Validation(validation) => validation.into(),
            DomainError::Export(msg) => Self::new(ErrorCode::ExportFailed, &msg),
            DomainError::File(msg) => Self::new(ErrorCode::FileError, &msg),
            DomainError::Internal(msg) => Self::new(ErrorCode::InternalError, &msg),
        }
    }
}

/// Silent errors and plain `Forbidden` cross the boundary with generic
/// messages only; the diagnostic stays in the log.
impl From<ServiceError> for FFIError {
    fn from(err: ServiceError) -> Self {
        if err.is_silent() {
            log::warn!("{}", err.diagnostic());
        }
        match err {
            ServiceError::Domain(domain) => domain.into(),
            ServiceError::NotFoundSilent(_) => Self::new(ErrorCode::EntityNotFound, &err.public_message()),
            ServiceError::Forbidden(_) | ServiceError::ForbiddenSilent(_) => {
                Self::new(ErrorCode::PermissionDenied, &err.public_message())
            }
            ServiceError::Configuration(msg) => Self::new(ErrorCode::ConfigurationError, &msg),
        }
    }
}

impl From<std::ffi::NulError> for FFIError {
    fn from(_: std::ffi::NulError) -> Self {
        Self::new(ErrorCode::InvalidArgument, "String contains interior NUL byte")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn silent_errors_have_generic_messages() {
        let not_found: FFIError = ServiceError::NotFoundSilent("Import 42 not found".to_string()).into();
        assert_eq!(not_found.code, ErrorCode::EntityNotFound);
        assert_eq!(not_found.message, "Not found");
        assert!(not_found.details.is_none());

        let forbidden: FFIError =
            ServiceError::ForbiddenSilent("User has no 'export' permission.".to_string()).into();
        assert_eq!(forbidden.code, ErrorCode::PermissionDenied);
        assert_eq!(forbidden.message, "Forbidden");
    }

    #[test]
    fn forbidden_hides_which_check_failed() {
        let err: FFIError = ServiceError::Forbidden("No read access to Import x".to_string()).into();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert!(!err.message.contains("Import"));
    }

    #[test]
    fn domain_errors_keep_details() {
        let id = Uuid::new_v4();
        let err: FFIError = ServiceError::Domain(DomainError::EntityNotFound("Record".to_string(), id)).into();
        assert_eq!(err.code, ErrorCode::EntityNotFound);
        assert!(err.details.unwrap().contains(&id.to_string()));

        let validation: FFIError = DomainError::Validation(ValidationError::required("link")).into();
        assert_eq!(validation.code, ErrorCode::ValidationFailed);
    }
}
