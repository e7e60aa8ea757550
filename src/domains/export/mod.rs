pub mod types;
pub mod csv_record;
pub mod service;

pub use types::{ExportFormat, ExportParams, ExportResult};
pub use service::{CsvExportTool, ExportTool};
