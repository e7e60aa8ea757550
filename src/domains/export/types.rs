use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Export formats supported by the export tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
}

impl ExportFormat {
    pub fn file_extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(&self) -> String {
        match self {
            ExportFormat::Csv => mime::TEXT_CSV_UTF_8.to_string(),
        }
    }
}

/// What to export and how; built fluently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportParams {
    pub entity_type: String,
    pub format: ExportFormat,
    /// Re-check read access per record before writing it out
    pub access_control: bool,
    pub file_name: Option<String>,
    /// Columns to write; all known fields when absent
    pub field_list: Option<Vec<String>>,
}

impl ExportParams {
    pub fn new(entity_type: &str) -> Self {
        Self {
            entity_type: entity_type.to_string(),
            format: ExportFormat::Csv,
            access_control: false,
            file_name: None,
            field_list: None,
        }
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_access_control(mut self) -> Self {
        self.access_control = true;
        self
    }

    pub fn with_file_name(mut self, file_name: &str) -> Self {
        self.file_name = Some(file_name.to_string());
        self
    }

    pub fn with_field_list(mut self, fields: Vec<String>) -> Self {
        self.field_list = Some(fields);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub attachment_id: Uuid,
    /// Records actually written, after access filtering
    pub exported_count: usize,
}
