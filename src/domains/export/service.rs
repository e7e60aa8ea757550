use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::auth::AuthContext;
use crate::domains::attachment::repository::AttachmentRepository;
use crate::domains::attachment::types::NewAttachment;
use crate::domains::core::file_storage_service::FileStorageService;
use crate::domains::export::csv_record::{header_for, CsvRecord};
use crate::domains::export::types::{ExportParams, ExportResult};
use crate::domains::permission::{AccessGate, AclAction};
use crate::domains::record::types::{Record, RecordCollection};
use crate::errors::{DomainError, DomainResult};
use crate::validation::validate_identifier;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes a record collection to a file and registers it as an attachment.
#[async_trait]
pub trait ExportTool: Send + Sync {
    async fn run(
        &self,
        params: &ExportParams,
        collection: &RecordCollection,
        auth: &AuthContext,
    ) -> DomainResult<ExportResult>;
}

pub struct CsvExportTool {
    access_gate: Arc<dyn AccessGate>,
    file_storage: Arc<dyn FileStorageService>,
    attachment_repo: Arc<dyn AttachmentRepository>,
}

impl CsvExportTool {
    pub fn new(
        access_gate: Arc<dyn AccessGate>,
        file_storage: Arc<dyn FileStorageService>,
        attachment_repo: Arc<dyn AttachmentRepository>,
    ) -> Self {
        Self {
            access_gate,
            file_storage,
            attachment_repo,
        }
    }

    fn default_file_name(params: &ExportParams) -> String {
        format!(
            "Export_{}_{}.{}",
            params.entity_type,
            Utc::now().format("%Y-%m-%d_%H%M%S"),
            params.format.file_extension()
        )
    }
}

/// BOM-prefixed CSV so spreadsheet apps pick up UTF-8.
fn write_csv<T: CsvRecord>(header: &[String], records: &[T]) -> DomainResult<Vec<u8>> {
    let mut buffer = UTF8_BOM.to_vec();
    {
        let mut wtr = csv::WriterBuilder::new().from_writer(&mut buffer);
        wtr.write_record(header)
            .map_err(|e| DomainError::Export(e.to_string()))?;
        for record in records {
            wtr.write_record(header.iter().map(|column| record.cell(column)))
                .map_err(|e| DomainError::Export(e.to_string()))?;
        }
        wtr.flush().map_err(|e| DomainError::Export(e.to_string()))?;
    }
    Ok(buffer)
}

#[async_trait]
impl ExportTool for CsvExportTool {
    async fn run(
        &self,
        params: &ExportParams,
        collection: &RecordCollection,
        auth: &AuthContext,
    ) -> DomainResult<ExportResult> {
        validate_identifier("entityType", &params.entity_type)?;

        let records: Vec<&Record> = collection
            .records
            .iter()
            .filter(|record| {
                !params.access_control || self.access_gate.check_entity(auth, *record, AclAction::Read)
            })
            .collect();

        if records.len() < collection.records.len() {
            log::debug!(
                "Export of {} skipped {} records the user cannot read",
                params.entity_type,
                collection.records.len() - records.len()
            );
        }

        let header = match &params.field_list {
            Some(fields) if !fields.is_empty() => fields.clone(),
            _ => header_for(&records),
        };
        let bytes = write_csv(&header, &records)?;
        let checksum = hex::encode(Sha256::digest(&bytes));

        let file_name = params
            .file_name
            .clone()
            .unwrap_or_else(|| Self::default_file_name(params));

        let (storage_path, size) = self
            .file_storage
            .save_file(bytes, &params.entity_type, &file_name)
            .await?;

        let new_attachment = NewAttachment {
            name: file_name,
            mime_type: params.format.mime_type(),
            size,
            storage_path: storage_path.clone(),
            related_type: Some(params.entity_type.clone()),
            checksum,
        };

        let attachment = match self.attachment_repo.create(&new_attachment, auth).await {
            Ok(attachment) => attachment,
            Err(e) => {
                // orphaned file would never be reachable
                if let Err(cleanup) = self.file_storage.delete_file(&storage_path).await {
                    log::warn!("Failed to remove export file {}: {}", storage_path, cleanup);
                }
                return Err(e);
            }
        };

        log::info!(
            "Exported {} {} records to attachment {}",
            records.len(),
            params.entity_type,
            attachment.id
        );

        Ok(ExportResult {
            attachment_id: attachment.id,
            exported_count: records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_migration::run_migrations;
    use crate::domains::attachment::repository::SqliteAttachmentRepository;
    use crate::domains::core::file_storage_service::LocalFileStorageService;
    use crate::domains::core::repository::FindById;
    use crate::domains::export::types::ExportFormat;
    use crate::domains::permission::{AclLevel, AclTable, ScopeAcl, TableAccessGate, UserRole};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;
    use uuid::Uuid;

    struct Fixture {
        tool: CsvExportTool,
        storage: Arc<LocalFileStorageService>,
        attachments: Arc<SqliteAttachmentRepository>,
        _dir: TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(LocalFileStorageService::new(dir.path().to_str().unwrap()).unwrap());
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        let attachments = Arc::new(SqliteAttachmentRepository::new(pool));
        let tool = CsvExportTool::new(
            Arc::new(TableAccessGate::new()),
            storage.clone(),
            attachments.clone(),
        );
        Fixture {
            tool,
            storage,
            attachments,
            _dir: dir,
        }
    }

    fn contact(name: &str, owner: Uuid, attributes: serde_json::Value) -> Record {
        Record {
            id: Uuid::new_v4(),
            entity_type: "Contact".to_string(),
            name: Some(name.to_string()),
            created_at: Utc::now(),
            created_by_user_id: Some(owner),
            attributes: attributes.as_object().cloned().unwrap_or_default(),
        }
    }

    #[tokio::test]
    async fn writes_bom_header_and_rows() {
        let f = fixture().await;
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Admin, AclTable::new());
        let records = vec![
            contact("Ann", auth.user_id, json!({"city": "Lviv"})),
            contact("Bob, Jr.", auth.user_id, json!({"phone": "555"})),
        ];
        let collection = RecordCollection::typed("Contact", records, 2);
        let params = ExportParams::new("Contact")
            .with_format(ExportFormat::Csv)
            .with_access_control();

        let result = f.tool.run(&params, &collection, &auth).await.unwrap();
        assert_eq!(result.exported_count, 2);

        let attachment = f.attachments.find_by_id(result.attachment_id).await.unwrap();
        assert_eq!(attachment.related_type.as_deref(), Some("Contact"));
        assert!(attachment.name.ends_with(".csv"));

        let data = f.storage.get_file_data(&attachment.storage_path).await.unwrap();
        assert_eq!(attachment.size, data.len() as u64);
        assert_eq!(attachment.checksum, hex::encode(Sha256::digest(&data)));
        assert!(data.starts_with(UTF8_BOM));

        let text = String::from_utf8(data[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "id,name,city,phone,createdAt");
        assert!(lines[1].contains(",Ann,Lviv,,"));
        assert!(lines[2].contains(",\"Bob, Jr.\",,555,"));
    }

    #[tokio::test]
    async fn access_control_drops_unreadable_records() {
        let f = fixture().await;
        let acl = AclTable::new().with_scope("Contact", ScopeAcl::read_only(AclLevel::Own));
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Regular, acl);
        let records = vec![
            contact("Mine", auth.user_id, json!({})),
            contact("Theirs", Uuid::new_v4(), json!({})),
        ];
        let collection = RecordCollection::typed("Contact", records, 2);

        let filtered = f
            .tool
            .run(&ExportParams::new("Contact").with_access_control(), &collection, &auth)
            .await
            .unwrap();
        assert_eq!(filtered.exported_count, 1);

        let unfiltered = f
            .tool
            .run(&ExportParams::new("Contact"), &collection, &auth)
            .await
            .unwrap();
        assert_eq!(unfiltered.exported_count, 2);
    }

    #[tokio::test]
    async fn field_list_limits_columns() {
        let f = fixture().await;
        let auth = AuthContext::new(Uuid::new_v4(), UserRole::Admin, AclTable::new());
        let collection = RecordCollection::typed(
            "Contact",
            vec![contact("Ann", auth.user_id, json!({"city": "Lviv", "phone": "1"}))],
            1,
        );
        let params = ExportParams::new("Contact")
            .with_field_list(vec!["name".to_string(), "city".to_string()])
            .with_file_name("contacts.csv");

        let result = f.tool.run(&params, &collection, &auth).await.unwrap();
        let attachment = f.attachments.find_by_id(result.attachment_id).await.unwrap();
        assert_eq!(attachment.name, "contacts.csv");

        let data = f.storage.get_file_data(&attachment.storage_path).await.unwrap();
        let text = String::from_utf8(data[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["name,city", "Ann,Lviv"]);
    }
}
