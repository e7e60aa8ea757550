use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{query, query_as, SqlitePool};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::domains::core::repository::FindById;
use crate::domains::record::types::{NewRecord, Record, RecordRow};
use crate::errors::{DbError, DomainError, DomainResult};
use crate::validation::Validate;

/// Storage for CRM records of every entity type
#[async_trait]
pub trait RecordRepository: FindById<Record> + Send + Sync {
    async fn create(&self, new_record: &NewRecord, auth: &AuthContext) -> DomainResult<Record>;

    /// Soft delete; deleted records disappear from listings and counts.
    async fn soft_delete(&self, id: Uuid, auth: &AuthContext) -> DomainResult<()>;
}

pub struct SqliteRecordRepository {
    pool: SqlitePool,
}

impl SqliteRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FindById<Record> for SqliteRecordRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Record> {
        let row = query_as::<_, RecordRow>(
            "SELECT id, entity_type, name, attributes, created_at, created_by_user_id \
             FROM records WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("Record".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl RecordRepository for SqliteRecordRepository {
    async fn create(&self, new_record: &NewRecord, auth: &AuthContext) -> DomainResult<Record> {
        new_record.validate()?;

        let record = Record {
            id: Uuid::new_v4(),
            entity_type: new_record.entity_type.clone(),
            name: new_record.name.clone(),
            created_at: new_record.created_at.unwrap_or_else(Utc::now),
            created_by_user_id: Some(auth.user_id),
            attributes: new_record.attributes.clone(),
        };

        query(
            "INSERT INTO records (id, entity_type, name, attributes, created_at, created_by_user_id) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(record.id.to_string())
        .bind(&record.entity_type)
        .bind(&record.name)
        .bind(Value::Object(record.attributes.clone()).to_string())
        .bind(record.created_at.to_rfc3339())
        .bind(auth.user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        log::debug!("Created {} record {}", record.entity_type, record.id);
        Ok(record)
    }

    async fn soft_delete(&self, id: Uuid, auth: &AuthContext) -> DomainResult<()> {
        let result = query("UPDATE records SET deleted_at = ?, deleted_by_user_id = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(Utc::now().to_rfc3339())
            .bind(auth.user_id.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Record".to_string(), id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_migration::run_migrations;
    use crate::domains::permission::{AclTable, UserRole};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn auth() -> AuthContext {
        AuthContext::new(Uuid::new_v4(), UserRole::Regular, AclTable::new())
    }

    #[tokio::test]
    async fn create_then_find() {
        let repo = SqliteRecordRepository::new(pool().await);
        let auth = auth();
        let mut attributes = serde_json::Map::new();
        attributes.insert("firstName".to_string(), json!("Ann"));

        let created = repo
            .create(
                &NewRecord {
                    entity_type: "Contact".to_string(),
                    name: Some("Ann Lee".to_string()),
                    attributes,
                    created_at: None,
                },
                &auth,
            )
            .await
            .unwrap();

        let found = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(found.entity_type, "Contact");
        assert_eq!(found.created_by_user_id, Some(auth.user_id));
        assert_eq!(found.get_str("firstName"), Some("Ann"));
    }

    #[tokio::test]
    async fn soft_deleted_record_is_not_found() {
        let repo = SqliteRecordRepository::new(pool().await);
        let auth = auth();
        let created = repo
            .create(
                &NewRecord {
                    entity_type: "Lead".to_string(),
                    name: None,
                    attributes: serde_json::Map::new(),
                    created_at: None,
                },
                &auth,
            )
            .await
            .unwrap();

        repo.soft_delete(created.id, &auth).await.unwrap();
        assert!(matches!(
            repo.find_by_id(created.id).await,
            Err(DomainError::EntityNotFound(_, _))
        ));
        assert!(repo.soft_delete(created.id, &auth).await.is_err());
    }

    #[tokio::test]
    async fn invalid_entity_type_is_rejected() {
        let repo = SqliteRecordRepository::new(pool().await);
        let result = repo
            .create(
                &NewRecord {
                    entity_type: "Contact; DROP".to_string(),
                    name: None,
                    attributes: serde_json::Map::new(),
                    created_at: None,
                },
                &auth(),
            )
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
