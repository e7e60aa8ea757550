pub mod types;
pub mod repository;
pub mod linked;
pub mod service;

pub use types::{ExportRelationshipResult, Import, ImportRelation, ImportStatus, LinkName, NewImport, IMPORT_SCOPE};
pub use repository::{ImportRepository, SqliteImportRepository};
pub use linked::{LinkedRecordFinder, UnsupportedLinkFinder};
pub use service::{ImportService, ImportServiceImpl};
