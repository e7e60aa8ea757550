use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domains::core::row_parsing::{parse_datetime, parse_optional_uuid, parse_uuid};
use crate::domains::permission::OwnedEntity;
use crate::errors::{DomainError, DomainResult, ValidationError};
use crate::validation::{validate_identifier, Validate};

/// ACL scope of import records
pub const IMPORT_SCOPE: &str = "Import";

/// Named subset of target records produced by an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportRelation {
    Imported,
    Duplicates,
    Updated,
}

impl ImportRelation {
    pub const ALL: [ImportRelation; 3] = [
        ImportRelation::Imported,
        ImportRelation::Duplicates,
        ImportRelation::Updated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportRelation::Imported => "imported",
            ImportRelation::Duplicates => "duplicates",
            ImportRelation::Updated => "updated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "imported" => Some(ImportRelation::Imported),
            "duplicates" => Some(ImportRelation::Duplicates),
            "updated" => Some(ImportRelation::Updated),
            _ => None,
        }
    }

    /// Flag column of `import_entities` marking membership in this relation.
    pub fn flag_column(&self) -> &'static str {
        match self {
            ImportRelation::Imported => "is_imported",
            ImportRelation::Duplicates => "is_duplicate",
            ImportRelation::Updated => "is_updated",
        }
    }
}

/// Link name requested by a caller: one of the import relations or anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkName {
    Relation(ImportRelation),
    Other(String),
}

impl LinkName {
    pub fn parse(link: &str) -> Self {
        match ImportRelation::from_str(link) {
            Some(relation) => LinkName::Relation(relation),
            None => LinkName::Other(link.to_string()),
        }
    }
}

/// Import run lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Standby,
    Pending,
    InProcess,
    Complete,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Standby => "standby",
            ImportStatus::Pending => "pending",
            ImportStatus::InProcess => "in_process",
            ImportStatus::Complete => "complete",
            ImportStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "standby" => Some(ImportStatus::Standby),
            "pending" => Some(ImportStatus::Pending),
            "in_process" => Some(ImportStatus::InProcess),
            "complete" => Some(ImportStatus::Complete),
            "failed" => Some(ImportStatus::Failed),
            _ => None,
        }
    }
}

/// One bulk-import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    pub id: Uuid,
    /// Target entity type of the imported rows
    pub entity_type: String,
    pub status: ImportStatus,
    pub file_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
}

impl OwnedEntity for Import {
    fn scope(&self) -> &str {
        IMPORT_SCOPE
    }

    fn owner_id(&self) -> Option<Uuid> {
        self.created_by_user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImport {
    pub entity_type: String,
    pub file_name: Option<String>,
}

impl Validate for NewImport {
    fn validate(&self) -> DomainResult<()> {
        validate_identifier("entityType", &self.entity_type)?;
        Ok(())
    }
}

/// Row of the `imports` table
#[derive(Debug, Clone, FromRow)]
pub struct ImportRow {
    pub id: String,
    pub entity_type: String,
    pub status: String,
    pub file_name: Option<String>,
    pub created_at: String,
    pub created_by_user_id: Option<String>,
}

impl ImportRow {
    pub fn into_entity(self) -> DomainResult<Import> {
        let status = ImportStatus::from_str(&self.status).ok_or_else(|| {
            DomainError::Validation(ValidationError::invalid_value(
                "status",
                &format!("Unknown import status: {}", self.status),
            ))
        })?;

        Ok(Import {
            id: parse_uuid(&self.id, "id")?,
            entity_type: self.entity_type,
            status,
            file_name: self.file_name,
            created_at: parse_datetime(&self.created_at, "created_at")?,
            created_by_user_id: parse_optional_uuid(&self.created_by_user_id, "created_by_user_id")?,
        })
    }
}

/// Response of the relationship export: the attachment, if anything was exported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRelationshipResult {
    pub attachment_id: Option<Uuid>,
    pub download_url: Option<String>,
}

impl ExportRelationshipResult {
    pub fn empty() -> Self {
        Self {
            attachment_id: None,
            download_url: None,
        }
    }

    pub fn for_attachment(base_path: &str, attachment_id: Uuid) -> Self {
        Self {
            attachment_id: Some(attachment_id),
            download_url: Some(format!("{}?entryPoint=download&id={}", base_path, attachment_id)),
        }
    }
}
