//! Remote operations against the knowledge base service

use std::fmt::Debug;

use async_trait::async_trait;

use super::entity::{
    BucketDescriptor, CreateBucketRequest, CreateDataSourceRequest, CreateKnowledgeBaseRequest,
    CreateRoleRequest, DataSourceDescriptor, IngestionJobDescriptor, KnowledgeBaseDescriptor,
    RetrieveRequest, RetrievedPassage, RoleDescriptor, S3ObjectDescriptor, StartIngestionJobRequest,
    UpdateKnowledgeBaseRequest, UploadConfirmation, UploadObjectRequest,
};
use super::pagination::Page;
use crate::domain::DomainError;

/// One remote call per method. Implementations do parameter marshaling only;
/// every reference they receive is already a fully-qualified ARN.
#[async_trait]
pub trait KnowledgeBaseGateway: Send + Sync + Debug {
    async fn create_knowledge_base(
        &self,
        request: CreateKnowledgeBaseRequest,
    ) -> Result<KnowledgeBaseDescriptor, DomainError>;

    async fn list_knowledge_bases(
        &self,
        next_token: Option<String>,
    ) -> Result<Page<KnowledgeBaseDescriptor>, DomainError>;

    async fn get_knowledge_base(
        &self,
        knowledge_base_id: &str,
    ) -> Result<KnowledgeBaseDescriptor, DomainError>;

    async fn update_knowledge_base(
        &self,
        request: UpdateKnowledgeBaseRequest,
    ) -> Result<KnowledgeBaseDescriptor, DomainError>;

    async fn create_data_source(
        &self,
        request: CreateDataSourceRequest,
    ) -> Result<DataSourceDescriptor, DomainError>;

    async fn list_data_sources(
        &self,
        knowledge_base_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<DataSourceDescriptor>, DomainError>;

    async fn start_ingestion_job(
        &self,
        request: StartIngestionJobRequest,
    ) -> Result<IngestionJobDescriptor, DomainError>;

    async fn get_ingestion_job(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
        ingestion_job_id: &str,
    ) -> Result<IngestionJobDescriptor, DomainError>;

    async fn retrieve(&self, request: RetrieveRequest)
    -> Result<Vec<RetrievedPassage>, DomainError>;

    async fn upload_object(
        &self,
        request: UploadObjectRequest,
    ) -> Result<UploadConfirmation, DomainError>;

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<Page<S3ObjectDescriptor>, DomainError>;

    async fn create_bucket(
        &self,
        request: CreateBucketRequest,
    ) -> Result<BucketDescriptor, DomainError>;

    async fn create_role(&self, request: CreateRoleRequest)
    -> Result<RoleDescriptor, DomainError>;
}
