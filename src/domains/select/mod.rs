pub mod types;
pub mod builder;

pub use types::{EntityTypeRegistry, FieldRef, SelectQuery, WhereCondition};
pub use builder::{AclSelectBuilder, SelectBuilder};
