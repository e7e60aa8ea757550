use crate::errors::DomainResult;
use uuid::Uuid;
use async_trait::async_trait;

/// Trait for finding entities by ID
#[async_trait]
pub trait FindById<T> {
    /// Find an entity by ID; a missing row is `DomainError::EntityNotFound`.
    async fn find_by_id(&self, id: Uuid) -> DomainResult<T>;
}
