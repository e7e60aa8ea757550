use uuid::Uuid;

use crate::auth::AuthContext;
use super::has_permission::{AclAction, AclLevel, Permission};

/// Anything whose read access can depend on who created it.
pub trait OwnedEntity {
    /// ACL scope of the entity, e.g. "Import" or "Contact".
    fn scope(&self) -> &str;

    fn owner_id(&self) -> Option<Uuid>;
}

/// Authorization questions asked by services.
pub trait AccessGate: Send + Sync {
    /// Level of `action` on `scope` for the actor.
    fn level(&self, auth: &AuthContext, scope: &str, action: AclAction) -> AclLevel;

    /// Level of a global permission, e.g. export.
    fn permission_level(&self, auth: &AuthContext, permission: Permission) -> AclLevel;

    /// Whether the actor may perform `action` on the scope at all.
    fn check_scope(&self, auth: &AuthContext, scope: &str, action: AclAction) -> bool {
        self.level(auth, scope, action).is_granted()
    }

    /// Whether the actor may perform `action` on this particular entity.
    fn check_entity(&self, auth: &AuthContext, entity: &dyn OwnedEntity, action: AclAction) -> bool {
        match self.level(auth, entity.scope(), action) {
            AclLevel::Yes | AclLevel::All => true,
            AclLevel::Own => entity.owner_id() == Some(auth.user_id),
            AclLevel::No => false,
        }
    }
}

/// Gate backed by the ACL table carried in the auth context.
#[derive(Debug, Clone, Default)]
pub struct TableAccessGate;

impl TableAccessGate {
    pub fn new() -> Self {
        Self
    }
}

impl AccessGate for TableAccessGate {
    fn level(&self, auth: &AuthContext, scope: &str, action: AclAction) -> AclLevel {
        if auth.is_admin() {
            return AclLevel::All;
        }
        auth.acl.scope_level(scope, action)
    }

    fn permission_level(&self, auth: &AuthContext, permission: Permission) -> AclLevel {
        if auth.is_admin() {
            return AclLevel::Yes;
        }
        auth.acl.permission_level(permission)
    }
}
