use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domains::core::row_parsing::{parse_datetime, parse_optional_uuid, parse_uuid};
use crate::errors::DomainResult;

/// Stored file produced by an export (or uploaded by a user).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Uuid,
    /// File name offered on download
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Path relative to the storage root
    pub storage_path: String,
    pub related_type: Option<String>,
    /// Hex SHA-256 of the contents
    pub checksum: String,
    pub created_at: DateTime<Utc>,
    pub created_by_user_id: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    pub storage_path: String,
    pub related_type: Option<String>,
    pub checksum: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct AttachmentRow {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: i64,
    pub storage_path: String,
    pub related_type: Option<String>,
    pub checksum: String,
    pub created_at: String,
    pub created_by_user_id: Option<String>,
}

impl AttachmentRow {
    pub fn into_entity(self) -> DomainResult<Attachment> {
        Ok(Attachment {
            id: parse_uuid(&self.id, "id")?,
            name: self.name,
            mime_type: self.mime_type,
            size: self.size.max(0) as u64,
            storage_path: self.storage_path,
            related_type: self.related_type,
            checksum: self.checksum,
            created_at: parse_datetime(&self.created_at, "created_at")?,
            created_by_user_id: parse_optional_uuid(&self.created_by_user_id, "created_by_user_id")?,
        })
    }
}
