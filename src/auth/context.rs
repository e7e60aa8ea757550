use std::sync::Arc;
use uuid::Uuid;
use crate::domains::permission::{AclTable, UserRole};

/// Represents the actor on whose behalf an operation runs.
///
/// Passed explicitly to every service call; nothing reads it from global state.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// The ID of the authenticated user
    pub user_id: Uuid,

    /// The role of the authenticated user
    pub role: UserRole,

    /// Resolved ACL of the user
    pub acl: Arc<AclTable>,
}

impl AuthContext {
    /// Create a new authentication context
    pub fn new(user_id: Uuid, role: UserRole, acl: AclTable) -> Self {
        Self {
            user_id,
            role,
            acl: Arc::new(acl),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }
}
