//! Import results core: lists the records an import run created, flagged as
//! duplicates or updated, and exports them to CSV attachments.

// Public modules
pub mod auth;
pub mod config;
pub mod domains;
pub mod errors;
pub mod ffi;
pub mod globals;
pub mod types;
pub mod validation;

mod db_migration;

pub use config::CoreConfig;
pub use db_migration::run_migrations;

/// Initialize logging, the database and the services.
/// Must complete before any FFI call other than `import_core_initialize`.
pub async fn initialize(config: CoreConfig) -> ffi::FFIResult<()> {
    globals::initialize(config).await
}

/// Get a reference to the SQLite connection pool
pub fn get_db_pool() -> ffi::FFIResult<sqlx::SqlitePool> {
    globals::get_db_pool()
}
