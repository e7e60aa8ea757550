use std::sync::Arc;

use crate::auth::AuthContext;
use crate::domains::permission::{AccessGate, AclAction, AclLevel};
use crate::domains::select::types::{EntityTypeRegistry, FieldRef, SelectQuery, WhereCondition};
use crate::errors::{DomainError, DomainResult};
use crate::types::SearchParams;
use crate::validation::{validate_identifier, Validate};

/// Turns search parameters into an executable query for one entity type.
pub trait SelectBuilder: Send + Sync {
    fn build(&self, entity_type: &str, params: &SearchParams, auth: &AuthContext) -> DomainResult<SelectQuery>;
}

/// Builder with strict access control: the query is restricted to what the
/// actor may read, and building fails when the actor may read nothing.
///
/// Unregistered entity types fail with `AuthorizationFailed` for every role,
/// admins included.
pub struct AclSelectBuilder {
    access_gate: Arc<dyn AccessGate>,
    entity_types: EntityTypeRegistry,
}

impl AclSelectBuilder {
    pub fn new(access_gate: Arc<dyn AccessGate>, entity_types: EntityTypeRegistry) -> Self {
        Self {
            access_gate,
            entity_types,
        }
    }
}

impl SelectBuilder for AclSelectBuilder {
    fn build(&self, entity_type: &str, params: &SearchParams, auth: &AuthContext) -> DomainResult<SelectQuery> {
        validate_identifier("entityType", entity_type)?;
        params.validate()?;

        if !self.entity_types.contains(entity_type) {
            return Err(DomainError::AuthorizationFailed(format!(
                "Entity type {} is not registered",
                entity_type
            )));
        }

        let mut query = SelectQuery::new(entity_type);

        match self.access_gate.level(auth, entity_type, AclAction::Read) {
            AclLevel::Yes | AclLevel::All => {}
            AclLevel::Own => query.owner_user_id = Some(auth.user_id),
            AclLevel::No => {
                return Err(DomainError::AuthorizationFailed(format!(
                    "No read access to {}",
                    entity_type
                )))
            }
        }

        query.order_by = FieldRef::from_field(params.effective_order_by());
        query.order = params.effective_order();
        query.offset = params.offset;
        query.limit = params.max_size;
        query.text_filter = params
            .text_filter
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        query.conditions = params
            .where_items
            .iter()
            .map(|item| WhereCondition {
                field: FieldRef::from_field(&item.field),
                value: item.value.clone(),
            })
            .collect();

        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::permission::{AclTable, ScopeAcl, TableAccessGate, UserRole};
    use crate::types::Order;
    use serde_json::json;
    use uuid::Uuid;

    fn builder() -> AclSelectBuilder {
        AclSelectBuilder::new(
            Arc::new(TableAccessGate::new()),
            EntityTypeRegistry::new(["Contact"]),
        )
    }

    fn auth_with(level: AclLevel) -> AuthContext {
        AuthContext::new(
            Uuid::new_v4(),
            UserRole::Regular,
            AclTable::new().with_scope("Contact", ScopeAcl::read_only(level)),
        )
    }

    #[test]
    fn applies_ordering_paging_and_filters() {
        let params = SearchParams::create()
            .with_order_by("lastName")
            .with_order(Order::Desc)
            .with_offset(10)
            .with_max_size(5)
            .with_text_filter("  ann ")
            .with_where("city", json!("Lviv"));

        let query = builder().build("Contact", &params, &auth_with(AclLevel::All)).unwrap();

        assert_eq!(query.order_by, FieldRef::Attribute("lastName".to_string()));
        assert_eq!(query.order, Order::Desc);
        assert_eq!(query.offset, Some(10));
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.text_filter.as_deref(), Some("ann"));
        assert_eq!(query.conditions.len(), 1);
        assert_eq!(query.owner_user_id, None);
    }

    #[test]
    fn defaults_to_created_at_ascending() {
        let query = builder()
            .build("Contact", &SearchParams::create(), &auth_with(AclLevel::All))
            .unwrap();
        assert_eq!(query.order_by, FieldRef::Column("created_at"));
        assert_eq!(query.order, Order::Asc);
        assert_eq!(query.limit, None);
    }

    #[test]
    fn own_level_restricts_to_owner() {
        let auth = auth_with(AclLevel::Own);
        let query = builder().build("Contact", &SearchParams::create(), &auth).unwrap();
        assert_eq!(query.owner_user_id, Some(auth.user_id));
    }

    #[test]
    fn no_access_fails() {
        let result = builder().build("Contact", &SearchParams::create(), &auth_with(AclLevel::No));
        assert!(matches!(result, Err(DomainError::AuthorizationFailed(_))));
    }

    #[test]
    fn invalid_order_field_fails() {
        let params = SearchParams::create().with_order_by("name') --");
        let result = builder().build("Contact", &params, &auth_with(AclLevel::All));
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn unregistered_type_fails_even_for_admins() {
        let admin = AuthContext::new(Uuid::new_v4(), UserRole::Admin, AclTable::new());
        assert!(builder().build("Contact", &SearchParams::create(), &admin).is_ok());

        let result = builder().build("RemovedType", &SearchParams::create(), &admin);
        assert!(matches!(result, Err(DomainError::AuthorizationFailed(_))));
    }
}
