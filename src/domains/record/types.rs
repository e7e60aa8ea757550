use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domains::core::row_parsing::{parse_datetime, parse_optional_uuid, parse_uuid};
use crate::domains::permission::OwnedEntity;
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{validate_identifier, Validate};

/// A CRM entity of any type (Contact, Account, Lead, ...).
///
/// Type-specific fields live in `attributes`, keyed by their camelCase names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: Uuid,
    pub entity_type: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
    pub attributes: Map<String, Value>,
}

impl Record {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn get_str(&self, attribute: &str) -> Option<&str> {
        self.attributes.get(attribute).and_then(Value::as_str)
    }

    pub fn set(&mut self, attribute: &str, value: Value) {
        self.attributes.insert(attribute.to_string(), value);
    }

    pub fn remove(&mut self, attribute: &str) -> Option<Value> {
        self.attributes.remove(attribute)
    }

    pub fn has(&self, attribute: &str) -> bool {
        self.attributes.contains_key(attribute)
    }
}

impl OwnedEntity for Record {
    fn scope(&self) -> &str {
        &self.entity_type
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.created_by_user_id
    }
}

/// Input for storing a new record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub entity_type: String,
    pub name: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Explicit creation time; defaults to now.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Validate for NewRecord {
    fn validate(&self) -> DomainResult<()> {
        validate_identifier("entityType", &self.entity_type)?;
        if let Some(name) = &self.name {
            if name.len() > 255 {
                return Err(ValidationError::max_length("name", 255).into());
            }
        }
        Ok(())
    }
}

/// Row of the `records` table
#[derive(Debug, Clone, FromRow)]
pub struct RecordRow {
    pub id: String,
    pub entity_type: String,
    pub name: Option<String>,
    pub attributes: String,
    pub created_at: String,
    pub created_by_user_id: Option<String>,
}

impl RecordRow {
    pub fn into_entity(self) -> DomainResult<Record> {
        let attributes = match serde_json::from_str::<Value>(&self.attributes) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(_) | Err(_) => {
                return Err(DomainError::Validation(ValidationError::format(
                    "attributes",
                    &format!("Record {} does not hold a JSON object", self.id),
                )))
            }
        };

        Ok(Record {
            id: parse_uuid(&self.id, "id")?,
            entity_type: self.entity_type,
            name: self.name,
            created_at: parse_datetime(&self.created_at, "created_at")?,
            created_by_user_id: parse_optional_uuid(&self.created_by_user_id, "created_by_user_id")?,
            attributes,
        })
    }
}

/// A window of records plus the total number of records matching the same query.
///
/// `entity_type` is only set for homogeneous collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCollection {
    #[serde(rename = "list")]
    pub records: Vec<Record>,
    pub total: u64,
    pub entity_type: Option<String>,
}

impl RecordCollection {
    /// Collection of a known entity type.
    pub fn typed(entity_type: &str, records: Vec<Record>, total: u64) -> Self {
        Self {
            records,
            total,
            entity_type: Some(entity_type.to_string()),
        }
    }

    /// Collection whose type is inferred: set only when every record shares one type.
    pub fn from_records(records: Vec<Record>, total: u64) -> Self {
        let entity_type = match records.first() {
            Some(first) if records.iter().all(|r| r.entity_type == first.entity_type) => {
                Some(first.entity_type.clone())
            }
            _ => None,
        };
        Self {
            records,
            total,
            entity_type,
        }
    }

    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref().filter(|t| !t.is_empty())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(entity_type: &str) -> Record {
        Record {
            id: Uuid::new_v4(),
            entity_type: entity_type.to_string(),
            name: None,
            created_at: Utc::now(),
            created_by_user_id: None,
            attributes: Map::new(),
        }
    }

    #[test]
    fn infers_type_of_homogeneous_collection() {
        let collection = RecordCollection::from_records(vec![record("Contact"), record("Contact")], 2);
        assert_eq!(collection.entity_type(), Some("Contact"));
    }

    #[test]
    fn mixed_or_empty_collection_has_no_type() {
        let mixed = RecordCollection::from_records(vec![record("Contact"), record("Lead")], 2);
        assert_eq!(mixed.entity_type(), None);

        let empty = RecordCollection::from_records(vec![], 0);
        assert_eq!(empty.entity_type(), None);

        let blank = RecordCollection::typed("", vec![], 0);
        assert_eq!(blank.entity_type(), None);
    }

    #[test]
    fn row_into_entity_parses_columns() {
        let id = Uuid::new_v4();
        let row = RecordRow {
            id: id.to_string(),
            entity_type: "Contact".to_string(),
            name: Some("Ann Lee".to_string()),
            attributes: json!({"firstName": "Ann"}).to_string(),
            created_at: "2024-01-02T03:04:05Z".to_string(),
            created_by_user_id: None,
        };
        let record = row.into_entity().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.get_str("firstName"), Some("Ann"));
    }

    #[test]
    fn row_with_non_object_attributes_is_rejected() {
        let row = RecordRow {
            id: Uuid::new_v4().to_string(),
            entity_type: "Contact".to_string(),
            name: None,
            attributes: "[1,2]".to_string(),
            created_at: "2024-01-02T03:04:05Z".to_string(),
            created_by_user_id: None,
        };
        assert!(row.into_entity().is_err());
    }

    #[test]
    fn serializes_records_as_list() {
        let collection = RecordCollection::typed("Contact", vec![record("Contact")], 7);
        let value = serde_json::to_value(&collection).unwrap();
        assert_eq!(value["total"], 7);
        assert_eq!(value["entityType"], "Contact");
        assert_eq!(value["list"].as_array().unwrap().len(), 1);
    }
}
