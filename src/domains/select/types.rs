use serde_json::Value;
use std::collections::HashSet;
use uuid::Uuid;

use crate::types::Order;

/// Reference to a sortable / filterable field of the `records` table.
///
/// Attribute names are validated identifiers before they get here, so the
/// rendered SQL never contains caller-supplied quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRef {
    Column(&'static str),
    Attribute(String),
}

impl FieldRef {
    /// Maps an API field name onto a column or a JSON attribute.
    pub fn from_field(field: &str) -> Self {
        match field {
            "id" => FieldRef::Column("id"),
            "name" => FieldRef::Column("name"),
            "createdAt" => FieldRef::Column("created_at"),
            "createdById" => FieldRef::Column("created_by_user_id"),
            other => FieldRef::Attribute(other.to_string()),
        }
    }

    /// SQL expression for the field, qualified with `alias`.
    pub fn to_sql(&self, alias: &str) -> String {
        match self {
            FieldRef::Column(column) => format!("{}.{}", alias, column),
            FieldRef::Attribute(name) => format!("json_extract({}.attributes, '$.{}')", alias, name),
        }
    }
}

/// Equality filter produced from a search-parameter `where` item.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereCondition {
    pub field: FieldRef,
    pub value: Value,
}

/// Executable, access-filtered query against one entity type.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub entity_type: String,
    pub order_by: FieldRef,
    pub order: Order,
    pub offset: Option<u32>,
    pub limit: Option<u32>,
    /// Set when the actor may only see records they created.
    pub owner_user_id: Option<Uuid>,
    pub text_filter: Option<String>,
    pub conditions: Vec<WhereCondition>,
}

impl SelectQuery {
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            order_by: FieldRef::Column("created_at"),
            order: Order::Asc,
            offset: None,
            limit: None,
            owner_user_id: None,
            text_filter: None,
            conditions: Vec::new(),
        }
    }
}

/// Entity types records can currently be selected from.
///
/// Imports keep the target type they were created with; a type removed from
/// the deployment since then is no longer in the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTypeRegistry {
    types: HashSet<String>,
}

impl EntityTypeRegistry {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.types.contains(entity_type)
    }
}
