pub mod types;
pub mod repository;
pub mod list_load_processor;
pub mod output_preparer;

pub use types::{NewRecord, Record, RecordCollection, RecordRow};
pub use repository::{RecordRepository, SqliteRecordRepository};
pub use list_load_processor::{FieldListLoadProcessor, ListLoadProcessor};
pub use output_preparer::{DefaultOutputPreparer, RecordOutputPreparer, RecordServiceContainer};
