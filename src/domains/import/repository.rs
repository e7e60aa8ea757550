use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{query, query_as, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::domains::core::repository::FindById;
use crate::domains::import::types::{Import, ImportRelation, ImportRow, ImportStatus, NewImport};
use crate::domains::record::types::{Record, RecordRow};
use crate::domains::select::types::SelectQuery;
use crate::errors::{DbError, DomainError, DomainResult, ValidationError};
use crate::validation::Validate;

/// Imports and the records linked to them by each relation
#[async_trait]
pub trait ImportRepository: FindById<Import> + Send + Sync {
    async fn create(&self, new_import: &NewImport, auth: &AuthContext) -> DomainResult<Import>;

    async fn update_status(&self, id: Uuid, status: ImportStatus) -> DomainResult<()>;

    /// Marks a record as belonging to `relation` of the import. A record may be
    /// in several relations at once.
    async fn link_result_record(
        &self,
        import_id: Uuid,
        record: &Record,
        relation: ImportRelation,
    ) -> DomainResult<()>;

    /// Page of records in `relation`, restricted and ordered by `query`.
    async fn find_result_records(
        &self,
        import: &Import,
        relation: ImportRelation,
        query: &SelectQuery,
    ) -> DomainResult<Vec<Record>>;

    /// Number of records in `relation` matching `query`, ignoring its paging window.
    async fn count_result_records(
        &self,
        import: &Import,
        relation: ImportRelation,
        query: &SelectQuery,
    ) -> DomainResult<u64>;
}

pub struct SqliteImportRepository {
    pool: SqlitePool,
}

impl SqliteImportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// FROM/WHERE part shared by page and count queries, so the total always
    /// describes the same set the page is cut from.
    fn push_result_scope(
        builder: &mut QueryBuilder<'_, Sqlite>,
        import: &Import,
        relation: ImportRelation,
        query: &SelectQuery,
    ) -> DomainResult<()> {
        builder.push(
            " FROM records r \
             JOIN import_entities ie ON ie.entity_id = r.id AND ie.entity_type = r.entity_type \
             WHERE ie.import_id = ",
        );
        builder.push_bind(import.id.to_string());
        builder.push(format!(" AND ie.{} = 1", relation.flag_column()));
        builder.push(" AND r.entity_type = ");
        builder.push_bind(query.entity_type.clone());
        builder.push(" AND r.deleted_at IS NULL");

        if let Some(owner) = query.owner_user_id {
            builder.push(" AND r.created_by_user_id = ");
            builder.push_bind(owner.to_string());
        }

        if let Some(text) = &query.text_filter {
            builder.push(" AND r.name LIKE ");
            builder.push_bind(format!("%{}%", escape_like(text)));
            builder.push(" ESCAPE '\\'");
        }

        for condition in &query.conditions {
            let expr = condition.field.to_sql("r");
            match &condition.value {
                Value::Null => {
                    builder.push(format!(" AND {} IS NULL", expr));
                }
                Value::Bool(flag) => {
                    builder.push(format!(" AND {} = ", expr));
                    builder.push_bind(i64::from(*flag));
                }
                Value::Number(number) => {
                    builder.push(format!(" AND {} = ", expr));
                    match number.as_i64() {
                        Some(int) => builder.push_bind(int),
                        None => builder.push_bind(number.as_f64().unwrap_or_default()),
                    };
                }
                Value::String(text) => {
                    builder.push(format!(" AND {} = ", expr));
                    builder.push_bind(text.clone());
                }
                Value::Array(_) | Value::Object(_) => {
                    return Err(DomainError::Validation(ValidationError::invalid_value(
                        "where.value",
                        "only scalar values can be compared",
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Escapes LIKE wildcards so user text only matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[async_trait]
impl FindById<Import> for SqliteImportRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Import> {
        let row = query_as::<_, ImportRow>(
            "SELECT id, entity_type, status, file_name, created_at, created_by_user_id \
             FROM imports WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| DomainError::EntityNotFound("Import".to_string(), id))?;

        row.into_entity()
    }
}

#[async_trait]
impl ImportRepository for SqliteImportRepository {
    async fn create(&self, new_import: &NewImport, auth: &AuthContext) -> DomainResult<Import> {
        new_import.validate()?;

        let import = Import {
            id: Uuid::new_v4(),
            entity_type: new_import.entity_type.clone(),
            status: ImportStatus::Standby,
            file_name: new_import.file_name.clone(),
            created_at: Utc::now(),
            created_by_user_id: Some(auth.user_id),
        };

        query(
            "INSERT INTO imports (id, entity_type, status, file_name, created_at, created_by_user_id) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(import.id.to_string())
        .bind(&import.entity_type)
        .bind(import.status.as_str())
        .bind(&import.file_name)
        .bind(import.created_at.to_rfc3339())
        .bind(auth.user_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        log::info!("Created import {} for {}", import.id, import.entity_type);
        Ok(import)
    }

    async fn update_status(&self, id: Uuid, status: ImportStatus) -> DomainResult<()> {
        let result = query("UPDATE imports SET status = ? WHERE id = ? AND deleted_at IS NULL")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::EntityNotFound("Import".to_string(), id));
        }
        Ok(())
    }

    async fn link_result_record(
        &self,
        import_id: Uuid,
        record: &Record,
        relation: ImportRelation,
    ) -> DomainResult<()> {
        let flag = relation.flag_column();
        let sql = format!(
            "INSERT INTO import_entities (id, import_id, entity_type, entity_id, {flag}) \
             VALUES (?, ?, ?, ?, 1) \
             ON CONFLICT(import_id, entity_type, entity_id) DO UPDATE SET {flag} = 1"
        );

        query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(import_id.to_string())
            .bind(&record.entity_type)
            .bind(record.id.to_string())
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn find_result_records(
        &self,
        import: &Import,
        relation: ImportRelation,
        query: &SelectQuery,
    ) -> DomainResult<Vec<Record>> {
        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT r.id, r.entity_type, r.name, r.attributes, r.created_at, r.created_by_user_id",
        );
        Self::push_result_scope(&mut builder, import, relation, query)?;

        // r.id keeps the order stable between pages when sort values tie
        builder.push(format!(
            " ORDER BY {} {}, r.id ASC",
            query.order_by.to_sql("r"),
            query.order.as_sql()
        ));

        match (query.limit, query.offset) {
            (Some(limit), offset) => {
                builder.push(" LIMIT ");
                builder.push_bind(i64::from(limit));
                builder.push(" OFFSET ");
                builder.push_bind(i64::from(offset.unwrap_or(0)));
            }
            (None, Some(offset)) => {
                builder.push(" LIMIT -1 OFFSET ");
                builder.push_bind(i64::from(offset));
            }
            (None, None) => {}
        }

        let rows = builder
            .build_query_as::<RecordRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(DbError::from)?;

        log::debug!(
            "Fetched {} '{}' records of import {}",
            rows.len(),
            relation.as_str(),
            import.id
        );

        rows.into_iter().map(RecordRow::into_entity).collect()
    }

    async fn count_result_records(
        &self,
        import: &Import,
        relation: ImportRelation,
        query: &SelectQuery,
    ) -> DomainResult<u64> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
        Self::push_result_scope(&mut builder, import, relation, query)?;

        let total: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::from)?;

        Ok(total.max(0) as u64)
    }
}
