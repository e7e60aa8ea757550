use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::domains::record::types::RecordCollection;
use crate::errors::{DomainError, ServiceResult, ValidationError};
use crate::types::SearchParams;

/// Generic lookup for links of an import that are not import result relations
/// (`createdBy`, `assignedUser` and the like).
#[async_trait]
pub trait LinkedRecordFinder: Send + Sync {
    async fn find_linked(
        &self,
        id: Uuid,
        link: &str,
        params: &SearchParams,
        auth: &AuthContext,
    ) -> ServiceResult<RecordCollection>;
}

/// Finder for deployments that expose no other links on imports.
#[derive(Debug, Clone, Default)]
pub struct UnsupportedLinkFinder;

impl UnsupportedLinkFinder {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LinkedRecordFinder for UnsupportedLinkFinder {
    async fn find_linked(
        &self,
        _id: Uuid,
        link: &str,
        _params: &SearchParams,
        _auth: &AuthContext,
    ) -> ServiceResult<RecordCollection> {
        Err(DomainError::Validation(ValidationError::invalid_value(
            "link",
            &format!("Link '{}' is not supported for Import", link),
        ))
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::permission::{AclTable, UserRole};
    use crate::errors::ServiceError;

    #[tokio::test]
    async fn unknown_link_is_a_validation_error() {
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Regular, AclTable::new());
        let result = UnsupportedLinkFinder::new()
            .find_linked(Uuid::new_v4(), "createdBy", &SearchParams::create(), &auth)
            .await;

        match result {
            Err(ServiceError::Domain(DomainError::Validation(err))) => {
                assert!(err.to_string().contains("createdBy"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
