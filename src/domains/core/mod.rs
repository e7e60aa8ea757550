pub mod repository;
pub mod file_storage_service;
pub mod row_parsing;

pub use repository::FindById;
pub use file_storage_service::{FileStorageService, FileStorageResult, FileStorageError, LocalFileStorageService};
