//! Knowledge base domain: request and response models, the gateway seam and
//! pagination

mod entity;
mod gateway;
mod pagination;

pub use entity::{
    BucketDescriptor, CreateBucketRequest, CreateDataSourceRequest, CreateKnowledgeBaseRequest,
    CreateRoleRequest, DataSourceDescriptor, IngestionJobDescriptor, IngestionJobStatistics,
    KnowledgeBaseDescriptor, RetrieveRequest, RetrievedPassage, RoleDescriptor,
    S3ObjectDescriptor, StartIngestionJobRequest, StorageConfiguration, StorageType,
    UpdateKnowledgeBaseRequest, UploadConfirmation, UploadObjectRequest,
};
pub use gateway::KnowledgeBaseGateway;
pub use pagination::{Page, collect_all, pages};

#[cfg(test)]
pub use gateway::mock;
