pub mod access_gate;
pub mod has_permission;

pub use access_gate::{AccessGate, OwnedEntity, TableAccessGate};
pub use has_permission::{AclAction, AclLevel, AclTable, Permission, ScopeAcl, UserRole};
