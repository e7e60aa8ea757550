use async_trait::async_trait;
use chrono::Utc;
use sqlx::{query, query_as, SqlitePool};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::domains::attachment::types::{Attachment, AttachmentRow, NewAttachment};
use crate::domains::core::repository::FindById;
use crate::errors::{DbError, DomainError, DomainResult};

#[async_trait]
pub trait AttachmentRepository: FindById<Attachment> + Send + Sync {
    async fn create(&self, new_attachment: &NewAttachment, auth: &AuthContext) -> DomainResult<Attachment>;
}

pub struct SqliteAttachmentRepository {
    pool: SqlitePool,
}

impl SqliteAttachmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FindById<Attachment> for SqliteAttachmentRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Attachment> {
        let row = query_as::<_, AttachmentRow>(
            "SELECT id, name, mime_type, size, storage_path, related_type, checksum, created_at, created_by_user_id \
             FROM attachments WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("Attachment".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl AttachmentRepository for SqliteAttachmentRepository {
    async fn create(&self, new_attachment: &NewAttachment, auth: &AuthContext) -> DomainResult<Attachment> {
        let attachment = Attachment {
            id: Uuid::new_v4(),
            name: new_attachment.name.clone(),
            mime_type: new_attachment.mime_type.clone(),
            size: new_attachment.size,
            storage_path: new_attachment.storage_path.clone(),
            related_type: new_attachment.related_type.clone(),
            checksum: new_attachment.checksum.clone(),
            created_at: Utc::now(),
            created_by_user_id: Some(auth.user_id),
        };

        query(
            "INSERT INTO attachments (id, name, mime_type, size, storage_path, related_type, checksum, created_at, created_by_user_id) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(attachment.id.to_string())
        .bind(&attachment.name)
        .bind(&attachment.mime_type)
        .bind(attachment.size as i64)
        .bind(&attachment.storage_path)
        .bind(&attachment.related_type)
        .bind(&attachment.checksum)
        .bind(attachment.created_at.to_rfc3339())
        .bind(auth.user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(attachment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_migration::run_migrations;
    use crate::domains::permission::{AclTable, UserRole};
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn create_then_find() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        let repo = SqliteAttachmentRepository::new(pool);
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Regular, AclTable::new());

        let created = repo
            .create(
                &NewAttachment {
                    name: "Export_Contact.csv".to_string(),
                    mime_type: "text/csv".to_string(),
                    size: 42,
                    storage_path: "attachments/Contact/abc.csv".to_string(),
                    related_type: Some("Contact".to_string()),
                    checksum: "00".repeat(32),
                },
                &auth,
            )
            .await
            .unwrap();

        let found = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(found, created);
        assert_eq!(found.created_by_user_id, Some(auth.user_id));
        assert!(repo.find_by_id(Uuid::new_v4()).await.is_err());
    }
}
