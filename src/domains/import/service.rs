use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::domains::export::service::ExportTool;
use crate::domains::export::types::{ExportFormat, ExportParams};
use crate::domains::import::linked::LinkedRecordFinder;
use crate::domains::import::repository::ImportRepository;
use crate::domains::import::types::{ExportRelationshipResult, ImportRelation, LinkName};
use crate::domains::permission::{AccessGate, AclAction, AclLevel, Permission};
use crate::domains::record::list_load_processor::ListLoadProcessor;
use crate::domains::record::output_preparer::RecordServiceContainer;
use crate::domains::record::types::RecordCollection;
use crate::domains::select::builder::SelectBuilder;
use crate::errors::{DomainError, ServiceError, ServiceResult};
use crate::types::{Order, SearchParams, DEFAULT_ORDER_BY};

/// Linked-record access and export for import runs
#[async_trait]
pub trait ImportService: Send + Sync {
    /// Page of records linked to import `id` through `link`. Links other than
    /// the import result relations go to the generic finder untouched.
    async fn find_linked(
        &self,
        id: Uuid,
        link: &str,
        params: &SearchParams,
        auth: &AuthContext,
    ) -> ServiceResult<RecordCollection>;

    /// All records of a link, oldest first.
    async fn list_linked(&self, id: Uuid, link: &str, auth: &AuthContext) -> ServiceResult<RecordCollection>;

    /// Exports a collection to CSV. `None` when there is nothing to export.
    async fn export_records(&self, collection: &RecordCollection, auth: &AuthContext) -> ServiceResult<Option<Uuid>>;

    /// Lists a link and exports it in one go.
    async fn export_relationship(
        &self,
        id: Uuid,
        link: &str,
        auth: &AuthContext,
    ) -> ServiceResult<ExportRelationshipResult>;
}

pub struct ImportServiceImpl {
    repo: Arc<dyn ImportRepository>,
    access_gate: Arc<dyn AccessGate>,
    select_builder: Arc<dyn SelectBuilder>,
    list_load_processor: Arc<dyn ListLoadProcessor>,
    record_services: Arc<RecordServiceContainer>,
    export_tool: Arc<dyn ExportTool>,
    link_finder: Arc<dyn LinkedRecordFinder>,
    base_path: String,
}

impl ImportServiceImpl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: Arc<dyn ImportRepository>,
        access_gate: Arc<dyn AccessGate>,
        select_builder: Arc<dyn SelectBuilder>,
        list_load_processor: Arc<dyn ListLoadProcessor>,
        record_services: Arc<RecordServiceContainer>,
        export_tool: Arc<dyn ExportTool>,
        link_finder: Arc<dyn LinkedRecordFinder>,
        base_path: &str,
    ) -> Self {
        Self {
            repo,
            access_gate,
            select_builder,
            list_load_processor,
            record_services,
            export_tool,
            link_finder,
            base_path: base_path.to_string(),
        }
    }

    async fn find_relation(
        &self,
        id: Uuid,
        relation: ImportRelation,
        params: &SearchParams,
        auth: &AuthContext,
    ) -> ServiceResult<RecordCollection> {
        let import = match self.repo.find_by_id(id).await {
            Ok(import) => import,
            Err(DomainError::EntityNotFound(_, _)) => {
                log::warn!("Import {} requested by {} does not exist", id, auth.user_id);
                return Err(ServiceError::NotFoundSilent(format!("Import {} not found", id)));
            }
            Err(e) => return Err(e.into()),
        };
        let entity_type = import.entity_type.clone();

        // both checks always run so the log names every missing grant
        let import_readable = self.access_gate.check_entity(auth, &import, AclAction::Read);
        let target_readable = self.access_gate.check_scope(auth, &entity_type, AclAction::Read);
        if !import_readable || !target_readable {
            let mut denied = Vec::new();
            if !import_readable {
                denied.push(format!("Import {}", id));
            }
            if !target_readable {
                denied.push(format!("entity type {}", entity_type));
            }
            let reason = format!("No read access to {}", denied.join(" and "));
            log::warn!("User {}: {}", auth.user_id, reason);
            return Err(ServiceError::Forbidden(reason));
        }

        let query = self
            .select_builder
            .build(&entity_type, params, auth)
            .map_err(|e| match e {
                DomainError::AuthorizationFailed(reason) => ServiceError::Forbidden(reason),
                other => ServiceError::Domain(other),
            })?;

        let mut records = self.repo.find_result_records(&import, relation, &query).await?;
        let total = self.repo.count_result_records(&import, relation, &query).await?;

        let preparer = self.record_services.get(&entity_type);
        for record in records.iter_mut() {
            self.list_load_processor.process(record);
            preparer.prepare_for_output(record);
        }

        log::debug!(
            "Import {} '{}': {} of {} {} records",
            id,
            relation.as_str(),
            records.len(),
            total,
            entity_type
        );

        Ok(RecordCollection::typed(&entity_type, records, total))
    }
}

#[async_trait]
impl ImportService for ImportServiceImpl {
    async fn find_linked(
        &self,
        id: Uuid,
        link: &str,
        params: &SearchParams,
        auth: &AuthContext,
    ) -> ServiceResult<RecordCollection> {
        match LinkName::parse(link) {
            LinkName::Relation(relation) => self.find_relation(id, relation, params, auth).await,
            LinkName::Other(other) => self.link_finder.find_linked(id, &other, params, auth).await,
        }
    }

    async fn list_linked(&self, id: Uuid, link: &str, auth: &AuthContext) -> ServiceResult<RecordCollection> {
        let params = SearchParams::create()
            .with_order_by(DEFAULT_ORDER_BY)
            .with_order(Order::Asc);
        self.find_linked(id, link, &params, auth).await
    }

    async fn export_records(&self, collection: &RecordCollection, auth: &AuthContext) -> ServiceResult<Option<Uuid>> {
        let export_level = self.access_gate.permission_level(auth, Permission::Export);
        if export_level != AclLevel::Yes {
            log::warn!(
                "User {} attempted an export with export permission '{}'",
                auth.user_id,
                export_level.as_str()
            );
            return Err(ServiceError::ForbiddenSilent(
                "User has no 'export' permission.".to_string(),
            ));
        }

        if collection.total == 0 {
            return Ok(None);
        }

        let entity_type = match collection.entity_type() {
            Some(entity_type) => entity_type,
            None => return Ok(None),
        };

        let params = ExportParams::new(entity_type)
            .with_format(ExportFormat::Csv)
            .with_access_control();

        let result = self.export_tool.run(&params, collection, auth).await?;
        Ok(Some(result.attachment_id))
    }

    async fn export_relationship(
        &self,
        id: Uuid,
        link: &str,
        auth: &AuthContext,
    ) -> ServiceResult<ExportRelationshipResult> {
        let collection = self.list_linked(id, link, auth).await?;

        Ok(match self.export_records(&collection, auth).await? {
            Some(attachment_id) => ExportRelationshipResult::for_attachment(&self.base_path, attachment_id),
            None => ExportRelationshipResult::empty(),
        })
    }
}
