use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{DomainResult, ValidationError};
use crate::validation::{validate_identifier, Validate};

/// Upper bound for a single page requested through `SearchParams`.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Field used when the caller does not ask for an ordering.
pub const DEFAULT_ORDER_BY: &str = "createdAt";

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// Equality condition on a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereItem {
    pub field: String,
    pub value: Value,
}

/// Ordering, paging and filter criteria supplied by a caller.
///
/// Immutable: every `with_*` call returns a new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    pub order_by: Option<String>,
    pub order: Option<Order>,
    pub offset: Option<u32>,
    pub max_size: Option<u32>,
    pub text_filter: Option<String>,
    #[serde(rename = "where")]
    pub where_items: Vec<WhereItem>,
}

impl SearchParams {
    pub fn create() -> Self {
        Self::default()
    }

    pub fn with_order_by(mut self, field: &str) -> Self {
        self.order_by = Some(field.to_string());
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_text_filter(mut self, text: &str) -> Self {
        self.text_filter = Some(text.to_string());
        self
    }

    pub fn with_where(mut self, field: &str, value: Value) -> Self {
        self.where_items.push(WhereItem {
            field: field.to_string(),
            value,
        });
        self
    }

    /// Ordering field, falling back to creation time.
    pub fn effective_order_by(&self) -> &str {
        self.order_by.as_deref().unwrap_or(DEFAULT_ORDER_BY)
    }

    /// Sort direction, falling back to ascending.
    pub fn effective_order(&self) -> Order {
        self.order.unwrap_or_default()
    }
}

impl Validate for SearchParams {
    fn validate(&self) -> DomainResult<()> {
        if let Some(order_by) = &self.order_by {
            validate_identifier("orderBy", order_by)?;
        }
        if let Some(max_size) = self.max_size {
            if max_size == 0 || max_size > MAX_PAGE_SIZE {
                return Err(ValidationError::range("maxSize", 1, MAX_PAGE_SIZE).into());
            }
        }
        for item in &self.where_items {
            validate_identifier("where.field", &item.field)?;
            if matches!(item.value, Value::Array(_) | Value::Object(_)) {
                return Err(ValidationError::invalid_value(
                    "where.value",
                    "only scalar values can be compared",
                )
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_to_ascending_creation_order() {
        let params = SearchParams::create();
        assert_eq!(params.effective_order_by(), "createdAt");
        assert_eq!(params.effective_order(), Order::Asc);
    }

    #[test]
    fn builder_does_not_mutate_original() {
        let base = SearchParams::create().with_max_size(10);
        let derived = base.clone().with_offset(20);
        assert_eq!(base.offset, None);
        assert_eq!(derived.offset, Some(20));
        assert_eq!(derived.max_size, Some(10));
    }

    #[test]
    fn validation_rejects_bad_paging_and_fields() {
        assert!(SearchParams::create().with_max_size(0).validate().is_err());
        assert!(SearchParams::create().with_max_size(MAX_PAGE_SIZE + 1).validate().is_err());
        assert!(SearchParams::create().with_order_by("name; DROP TABLE").validate().is_err());
        assert!(SearchParams::create()
            .with_where("emailAddress", json!(["a", "b"]))
            .validate()
            .is_err());
        assert!(SearchParams::create()
            .with_order_by("lastName")
            .with_order(Order::Desc)
            .with_max_size(50)
            .with_where("accountId", json!("acc-1"))
            .validate()
            .is_ok());
    }

    #[test]
    fn deserializes_camel_case_payload() {
        let params: SearchParams = serde_json::from_value(json!({
            "orderBy": "name",
            "order": "desc",
            "maxSize": 5,
            "where": [{"field": "city", "value": "Kyiv"}]
        }))
        .unwrap();
        assert_eq!(params.order_by.as_deref(), Some("name"));
        assert_eq!(params.order, Some(Order::Desc));
        assert_eq!(params.max_size, Some(5));
        assert_eq!(params.where_items.len(), 1);
    }
}
