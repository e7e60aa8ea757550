use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// --- User Role Definition ---

/// UserRole enum for authorization in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Regular,
    Portal,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Regular => "regular",
            UserRole::Portal => "portal",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "regular" => Some(UserRole::Regular),
            "portal" => Some(UserRole::Portal),
            _ => None,
        }
    }
}

// --- Actions and Levels ---

/// Action checked against a scope or an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AclAction {
    Create,
    Read,
    Edit,
    Delete,
}

/// Access level granted by an ACL table.
///
/// Scope actions use `All`/`Own`/`No`; boolean permissions use `Yes`/`No`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AclLevel {
    Yes,
    All,
    Own,
    #[default]
    No,
}

impl AclLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AclLevel::Yes => "yes",
            AclLevel::All => "all",
            AclLevel::Own => "own",
            AclLevel::No => "no",
        }
    }

    pub fn is_granted(&self) -> bool {
        !matches!(self, AclLevel::No)
    }
}

// --- Permission Enum Definition ---

/// Global (non-scope) permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Permission {
    #[serde(rename = "exportPermission")]
    Export,
}

// --- ACL Table ---

/// Levels for every action on one scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScopeAcl {
    pub create: AclLevel,
    pub read: AclLevel,
    pub edit: AclLevel,
    pub delete: AclLevel,
}

impl ScopeAcl {
    pub fn read_only(level: AclLevel) -> Self {
        Self {
            read: level,
            ..Self::default()
        }
    }

    pub fn full() -> Self {
        Self {
            create: AclLevel::Yes,
            read: AclLevel::All,
            edit: AclLevel::All,
            delete: AclLevel::All,
        }
    }

    pub fn level(&self, action: AclAction) -> AclLevel {
        match action {
            AclAction::Create => self.create,
            AclAction::Read => self.read,
            AclAction::Edit => self.edit,
            AclAction::Delete => self.delete,
        }
    }
}

/// Resolved ACL of one actor: per-scope action levels plus global permissions.
///
/// Scopes and permissions that are absent resolve to `AclLevel::No`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AclTable {
    pub scopes: HashMap<String, ScopeAcl>,
    pub permissions: HashMap<Permission, AclLevel>,
}

impl AclTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope: &str, acl: ScopeAcl) -> Self {
        self.scopes.insert(scope.to_string(), acl);
        self
    }

    pub fn with_permission(mut self, permission: Permission, level: AclLevel) -> Self {
        self.permissions.insert(permission, level);
        self
    }

    pub fn scope_level(&self, scope: &str, action: AclAction) -> AclLevel {
        self.scopes
            .get(scope)
            .map(|acl| acl.level(action))
            .unwrap_or(AclLevel::No)
    }

    pub fn permission_level(&self, permission: Permission) -> AclLevel {
        self.permissions
            .get(&permission)
            .copied()
            .unwrap_or(AclLevel::No)
    }
}
