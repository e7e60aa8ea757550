use sqlx::SqlitePool;

use crate::errors::{DbError, DbResult};

const MIGRATION_RECORDS_AND_IMPORTS: &str = include_str!("../migrations/20241001000000_records_and_imports.sql");
const MIGRATION_ATTACHMENTS: &str = include_str!("../migrations/20241001000001_attachments.sql");

// Applied in order; names are recorded in the `migrations` table
const MIGRATIONS: &[(&str, &str)] = &[
    ("20241001000000_records_and_imports.sql", MIGRATION_RECORDS_AND_IMPORTS),
    ("20241001000001_attachments.sql", MIGRATION_ATTACHMENTS),
];

/// Brings the schema of `pool` up to date.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    create_migrations_table(pool).await?;

    let last_migration = get_last_migration(pool).await?;
    match &last_migration {
        Some(name) => log::debug!("Last applied migration: {}", name),
        None => log::debug!("No migrations applied yet"),
    }

    apply_pending_migrations(pool, last_migration).await
}

async fn create_migrations_table(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Migration(format!("Failed to create migrations table: {}", e)))?;

    Ok(())
}

async fn get_last_migration(pool: &SqlitePool) -> DbResult<Option<String>> {
    sqlx::query_scalar::<_, String>("SELECT name FROM migrations ORDER BY id DESC LIMIT 1")
        .fetch_optional(pool)
        .await
        .map_err(|e| DbError::Migration(format!("Failed to get last migration: {}", e)))
}

async fn apply_pending_migrations(pool: &SqlitePool, last_migration: Option<String>) -> DbResult<()> {
    let pending = pending_migrations(last_migration.as_deref());
    if pending.is_empty() {
        return Ok(());
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DbError::Migration(format!("Failed to begin transaction: {}", e)))?;

    for (name, sql) in pending {
        log::info!("Applying migration {}", name);

        sqlx::query(sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("Failed to apply migration {}: {}", name, e)))?;

        sqlx::query("INSERT INTO migrations (name, applied_at) VALUES (?, ?)")
            .bind(name)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("Failed to record migration {}: {}", name, e)))?;
    }

    tx.commit()
        .await
        .map_err(|e| DbError::Migration(format!("Failed to commit migrations: {}", e)))?;

    Ok(())
}

/// Migrations after `last_migration`, or all of them on a fresh database.
fn pending_migrations(last_migration: Option<&str>) -> Vec<(&'static str, &'static str)> {
    let mut pending = Vec::new();
    let mut should_include = last_migration.is_none();

    for &(name, sql) in MIGRATIONS {
        if should_include {
            pending.push((name, sql));
        } else if Some(name) == last_migration {
            should_include = true;
        }
    }

    pending
}
