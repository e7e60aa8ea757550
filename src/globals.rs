use lazy_static::lazy_static;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::CoreConfig;
use crate::domains::attachment::repository::SqliteAttachmentRepository;
use crate::domains::core::file_storage_service::{FileStorageService, LocalFileStorageService};
use crate::domains::export::service::CsvExportTool;
use crate::domains::import::linked::UnsupportedLinkFinder;
use crate::domains::import::repository::SqliteImportRepository;
use crate::domains::import::service::{ImportService, ImportServiceImpl};
use crate::domains::permission::{AccessGate, TableAccessGate};
use crate::domains::record::list_load_processor::FieldListLoadProcessor;
use crate::domains::record::output_preparer::RecordServiceContainer;
use crate::domains::select::builder::AclSelectBuilder;
use crate::domains::select::types::EntityTypeRegistry;
use crate::ffi::error::{FFIError, FFIResult};

lazy_static! {
    static ref INIT_MUTEX: tokio::sync::Mutex<()> = tokio::sync::Mutex::new(());
    static ref INITIALIZED: AtomicBool = AtomicBool::new(false);

    static ref CONFIG: Mutex<Option<CoreConfig>> = Mutex::new(None);
    static ref DB_POOL: Mutex<Option<SqlitePool>> = Mutex::new(None);
    static ref FILE_STORAGE_SERVICE: Mutex<Option<Arc<dyn FileStorageService>>> = Mutex::new(None);
    static ref IMPORT_SERVICE: Mutex<Option<Arc<dyn ImportService>>> = Mutex::new(None);
}

pub fn get_config() -> FFIResult<CoreConfig> {
    CONFIG.lock().map_err(|_| FFIError::internal("CONFIG lock poisoned".to_string()))?.clone().ok_or_else(|| FFIError::internal("Configuration not initialized".to_string()))
}
pub fn get_db_pool() -> FFIResult<SqlitePool> {
    DB_POOL.lock().map_err(|_| FFIError::internal("DB_POOL lock poisoned".to_string()))?.clone().ok_or_else(|| FFIError::internal("Database pool not initialized".to_string()))
}
pub fn get_file_storage_service() -> FFIResult<Arc<dyn FileStorageService>> {
    FILE_STORAGE_SERVICE.lock().map_err(|_| FFIError::internal("FILE_STORAGE_SERVICE lock poisoned".to_string()))?.clone().ok_or_else(|| FFIError::internal("FileStorageService not initialized".to_string()))
}
pub fn get_import_service() -> FFIResult<Arc<dyn ImportService>> {
    IMPORT_SERVICE.lock().map_err(|_| FFIError::internal("IMPORT_SERVICE lock poisoned".to_string()))?.clone().ok_or_else(|| FFIError::internal("ImportService not initialized".to_string()))
}

pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::Acquire)
}

/// Wires the default collaborators around one pool and storage root.
pub fn build_import_service(
    pool: SqlitePool,
    file_storage: Arc<dyn FileStorageService>,
    base_path: &str,
    entity_types: EntityTypeRegistry,
) -> Arc<dyn ImportService> {
    let access_gate: Arc<dyn AccessGate> = Arc::new(TableAccessGate::new());
    let export_tool = CsvExportTool::new(
        access_gate.clone(),
        file_storage,
        Arc::new(SqliteAttachmentRepository::new(pool.clone())),
    );

    Arc::new(ImportServiceImpl::new(
        Arc::new(SqliteImportRepository::new(pool)),
        access_gate.clone(),
        Arc::new(AclSelectBuilder::new(access_gate, entity_types)),
        Arc::new(FieldListLoadProcessor::default()),
        Arc::new(RecordServiceContainer::default()),
        Arc::new(export_tool),
        Arc::new(UnsupportedLinkFinder::new()),
        base_path,
    ))
}

/// Sets up logging, the database and the services. Later calls are no-ops.
pub async fn initialize(config: CoreConfig) -> FFIResult<()> {
    let _guard = INIT_MUTEX.lock().await;

    if INITIALIZED.load(Ordering::Acquire) {
        return Ok(());
    }

    let result = initialize_internal(config).await;
    if result.is_ok() {
        INITIALIZED.store(true, Ordering::Release);
    }
    result
}

async fn initialize_internal(config: CoreConfig) -> FFIResult<()> {
    let _ = env_logger::Builder::new()
        .parse_filters(&config.log_level)
        .try_init();

    config.validate()?;

    log::info!("Initializing import core");
    log::debug!("Database URL: {}", config.database_url);
    log::debug!("Storage path: {}", config.storage_path);

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| FFIError::internal(format!("Database connection failed: {}", e)))?;

    crate::db_migration::run_migrations(&pool).await?;

    let file_storage: Arc<dyn FileStorageService> = Arc::new(
        LocalFileStorageService::new(&config.storage_path)
            .map_err(|e| FFIError::internal(format!("File storage init failed: {}", e)))?,
    );
    let import_service = build_import_service(
        pool.clone(),
        file_storage.clone(),
        &config.base_path,
        EntityTypeRegistry::new(config.entity_types.iter().cloned()),
    );

    *DB_POOL.lock().map_err(|_| FFIError::internal("DB_POOL lock poisoned".to_string()))? = Some(pool);
    *FILE_STORAGE_SERVICE.lock().map_err(|_| FFIError::internal("FILE_STORAGE_SERVICE lock poisoned".to_string()))? = Some(file_storage);
    *IMPORT_SERVICE.lock().map_err(|_| FFIError::internal("IMPORT_SERVICE lock poisoned".to_string()))? = Some(import_service);
    *CONFIG.lock().map_err(|_| FFIError::internal("CONFIG lock poisoned".to_string()))? = Some(config);

    log::info!("Import core initialized");
    Ok(())
}
