//! Knowledge base service - normalizes and validates tool input, assembles
//! ingestion configuration and issues the gateway call

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::domain::ingestion::non_blank;
use crate::domain::knowledge_base::{
    BucketDescriptor, CreateBucketRequest, CreateDataSourceRequest, CreateKnowledgeBaseRequest,
    CreateRoleRequest, DataSourceDescriptor, IngestionJobDescriptor, KnowledgeBaseDescriptor,
    KnowledgeBaseGateway, RetrieveRequest, RetrievedPassage, RoleDescriptor, S3ObjectDescriptor,
    StartIngestionJobRequest, StorageConfiguration, StorageType, UpdateKnowledgeBaseRequest,
    UploadConfirmation, UploadObjectRequest, collect_all,
};
use crate::domain::reference::{validate_bucket_name, validate_role_name};
use crate::domain::{
    DomainError, ErrorRecord, ErrorTranslator, IdentifierNormalizer, IngestionOptions,
    ReferenceKind,
};

pub const MIN_RESULTS: i64 = 1;
pub const MAX_RESULTS: i64 = 100;
pub const MIN_SESSION_DURATION: i64 = 3600;
pub const MAX_SESSION_DURATION: i64 = 43200;
pub const ROLE_PATH: &str = "/service-role/";
pub const DEFAULT_EMBEDDING_MODEL: &str = "amazon.titan-embed-text-v2:0";

/// Input for creating a knowledge base
#[derive(Debug, Clone, Default)]
pub struct CreateKnowledgeBaseInput {
    pub name: String,
    pub role_reference: String,
    pub bucket_reference: String,
    pub description: Option<String>,
    pub storage_type: Option<String>,
    pub embedding_model_arn: Option<String>,
    pub vector_index_name: Option<String>,
    pub multimodal_storage_uri: Option<String>,
    pub ingestion: IngestionOptions,
}

/// Input for updating a knowledge base; omitted fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct UpdateKnowledgeBaseInput {
    pub knowledge_base_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub role_reference: Option<String>,
}

/// Input for creating a data source
#[derive(Debug, Clone, Default)]
pub struct CreateDataSourceInput {
    pub knowledge_base_id: String,
    pub name: String,
    pub bucket_reference: String,
    pub source_type: Option<String>,
    pub description: Option<String>,
    /// Comma-separated key prefixes
    pub inclusion_prefixes: Option<String>,
    pub ingestion: IngestionOptions,
}

#[derive(Debug, Clone, Default)]
pub struct UploadDocumentInput {
    pub local_path: String,
    pub bucket_name: String,
    pub key: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateRoleInput {
    pub role_name: String,
    pub description: Option<String>,
    pub max_session_duration: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeBaseList {
    pub count: usize,
    pub knowledge_bases: Vec<KnowledgeBaseDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSourceList {
    pub count: usize,
    pub data_sources: Vec<DataSourceDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievalResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<RetrievedPassage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentListing {
    pub bucket: String,
    pub prefix: Option<String>,
    pub count: usize,
    pub documents: Vec<S3ObjectDescriptor>,
}

/// Knowledge base service
pub struct KnowledgeBaseService {
    gateway: Arc<dyn KnowledgeBaseGateway>,
    normalizer: IdentifierNormalizer,
    translator: ErrorTranslator,
}

impl std::fmt::Debug for KnowledgeBaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBaseService")
            .field("normalizer", &self.normalizer)
            .field("locale", &self.translator.locale())
            .finish()
    }
}

fn required(field: &str, value: &str) -> Result<String, DomainError> {
    let value = value.trim();

    if value.is_empty() {
        return Err(DomainError::validation(format!("{} is required", field)));
    }

    Ok(value.to_string())
}

fn optional(value: &Option<String>) -> Option<String> {
    non_blank(value).map(str::to_string)
}

/// Split a comma-separated list, dropping empty entries
fn split_prefixes(value: &Option<String>) -> Vec<String> {
    non_blank(value)
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn validate_multimodal_uri(uri: &str) -> Result<(), DomainError> {
    let bucket = uri
        .strip_prefix("s3://")
        .map(|rest| rest.split('/').next().unwrap_or_default())
        .ok_or_else(|| DomainError::validation("multimodal_storage_uri must start with 's3://'"))?;

    if bucket.is_empty() {
        return Err(DomainError::validation(
            "multimodal_storage_uri must name a bucket",
        ));
    }

    Ok(())
}

impl KnowledgeBaseService {
    pub fn new(
        gateway: Arc<dyn KnowledgeBaseGateway>,
        normalizer: IdentifierNormalizer,
        translator: ErrorTranslator,
    ) -> Self {
        Self {
            gateway,
            normalizer,
            translator,
        }
    }

    pub fn region(&self) -> &str {
        self.normalizer.region()
    }

    /// Render any failure as an error record
    pub fn translate(&self, error: &DomainError) -> ErrorRecord {
        self.translator.translate_error(error)
    }

    pub async fn create_knowledge_base(
        &self,
        input: CreateKnowledgeBaseInput,
    ) -> Result<KnowledgeBaseDescriptor, DomainError> {
        let name = required("name", &input.name)?;

        if input.ingestion.assemble()?.is_some() {
            return Err(DomainError::validation(
                "parsing and chunking options belong to create_data_source",
            ));
        }

        let storage_type = match non_blank(&input.storage_type) {
            Some(value) => value.parse::<StorageType>()?,
            None => StorageType::default(),
        };
        let multimodal_storage_uri = optional(&input.multimodal_storage_uri);
        let embedding_model_arn = match (storage_type, optional(&input.embedding_model_arn)) {
            (_, Some(model)) => model,
            (StorageType::S3, None) => self.default_embedding_model_arn(),
            (StorageType::S3Vectors, None) => {
                return Err(DomainError::validation(
                    "embedding_model_arn is required for S3_VECTORS storage",
                ));
            }
        };

        match (storage_type, &multimodal_storage_uri) {
            (StorageType::S3, Some(_)) => {
                return Err(DomainError::validation(
                    "multimodal_storage_uri is only supported with S3_VECTORS storage",
                ));
            }
            (StorageType::S3Vectors, Some(uri)) => validate_multimodal_uri(uri)?,
            (_, None) => {}
        }

        let role_arn = self
            .normalizer
            .normalize(&input.role_reference, ReferenceKind::IamRole)
            .await?;

        let storage = match storage_type {
            StorageType::S3 => StorageConfiguration::S3 {
                bucket_arn: self
                    .normalizer
                    .normalize(&input.bucket_reference, ReferenceKind::S3Bucket)
                    .await?,
            },
            StorageType::S3Vectors => StorageConfiguration::S3Vectors {
                vector_bucket_arn: self
                    .normalizer
                    .normalize(&input.bucket_reference, ReferenceKind::S3VectorBucket)
                    .await?,
                index_name: optional(&input.vector_index_name),
                multimodal_storage_uri,
            },
        };

        self.gateway
            .create_knowledge_base(CreateKnowledgeBaseRequest {
                name,
                description: optional(&input.description),
                role_arn,
                storage,
                embedding_model_arn: Some(embedding_model_arn),
            })
            .await
    }

    /// Titan text embeddings v2 in the server's region and partition
    fn default_embedding_model_arn(&self) -> String {
        format!(
            "arn:{}:bedrock:{}::foundation-model/{}",
            self.normalizer.partition(),
            self.normalizer.region(),
            DEFAULT_EMBEDDING_MODEL
        )
    }

    pub async fn list_knowledge_bases(&self) -> Result<KnowledgeBaseList, DomainError> {
        let knowledge_bases = collect_all(|token| self.gateway.list_knowledge_bases(token)).await?;

        Ok(KnowledgeBaseList {
            count: knowledge_bases.len(),
            knowledge_bases,
        })
    }

    pub async fn get_knowledge_base(
        &self,
        knowledge_base_id: &str,
    ) -> Result<KnowledgeBaseDescriptor, DomainError> {
        let knowledge_base_id = required("knowledge_base_id", knowledge_base_id)?;
        self.gateway.get_knowledge_base(&knowledge_base_id).await
    }

    pub async fn update_knowledge_base(
        &self,
        input: UpdateKnowledgeBaseInput,
    ) -> Result<KnowledgeBaseDescriptor, DomainError> {
        let knowledge_base_id = required("knowledge_base_id", &input.knowledge_base_id)?;
        let name = optional(&input.name);
        let description = optional(&input.description);

        let role_arn = match non_blank(&input.role_reference) {
            Some(reference) => Some(
                self.normalizer
                    .normalize(reference, ReferenceKind::IamRole)
                    .await?,
            ),
            None => None,
        };

        if name.is_none() && description.is_none() && role_arn.is_none() {
            return Err(DomainError::validation(
                "at least one of name, description or role_reference must be given",
            ));
        }

        self.gateway
            .update_knowledge_base(UpdateKnowledgeBaseRequest {
                knowledge_base_id,
                name,
                description,
                role_arn,
            })
            .await
    }

    pub async fn create_data_source(
        &self,
        input: CreateDataSourceInput,
    ) -> Result<DataSourceDescriptor, DomainError> {
        let knowledge_base_id = required("knowledge_base_id", &input.knowledge_base_id)?;
        let name = required("name", &input.name)?;

        if let Some(source_type) = non_blank(&input.source_type) {
            if !source_type.eq_ignore_ascii_case("S3") {
                return Err(DomainError::validation(format!(
                    "source_type must be S3, got '{}'",
                    source_type
                )));
            }
        }

        let bucket_arn = self
            .normalizer
            .normalize(&input.bucket_reference, ReferenceKind::S3Bucket)
            .await?;
        let vector_ingestion = input.ingestion.assemble()?;

        self.gateway
            .create_data_source(CreateDataSourceRequest {
                knowledge_base_id,
                name,
                description: optional(&input.description),
                bucket_arn,
                inclusion_prefixes: split_prefixes(&input.inclusion_prefixes),
                vector_ingestion,
            })
            .await
    }

    pub async fn list_data_sources(
        &self,
        knowledge_base_id: &str,
    ) -> Result<DataSourceList, DomainError> {
        let knowledge_base_id = required("knowledge_base_id", knowledge_base_id)?;
        let data_sources = collect_all(|token| {
            self.gateway.list_data_sources(&knowledge_base_id, token)
        })
        .await?;

        Ok(DataSourceList {
            count: data_sources.len(),
            data_sources,
        })
    }

    pub async fn start_ingestion_job(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
        description: Option<String>,
    ) -> Result<IngestionJobDescriptor, DomainError> {
        let request = StartIngestionJobRequest {
            knowledge_base_id: required("knowledge_base_id", knowledge_base_id)?,
            data_source_id: required("data_source_id", data_source_id)?,
            description: optional(&description),
        };

        self.gateway.start_ingestion_job(request).await
    }

    pub async fn get_ingestion_job(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
        ingestion_job_id: &str,
    ) -> Result<IngestionJobDescriptor, DomainError> {
        let knowledge_base_id = required("knowledge_base_id", knowledge_base_id)?;
        let data_source_id = required("data_source_id", data_source_id)?;
        let ingestion_job_id = required("ingestion_job_id", ingestion_job_id)?;

        self.gateway
            .get_ingestion_job(&knowledge_base_id, &data_source_id, &ingestion_job_id)
            .await
    }

    pub async fn retrieve(
        &self,
        knowledge_base_id: &str,
        query: &str,
        number_of_results: Option<i64>,
    ) -> Result<RetrievalResponse, DomainError> {
        let knowledge_base_id = required("knowledge_base_id", knowledge_base_id)?;
        let query = required("query", query)?;

        let number_of_results = match number_of_results {
            Some(count) if (MIN_RESULTS..=MAX_RESULTS).contains(&count) => Some(count as u32),
            Some(count) => {
                return Err(DomainError::validation(format!(
                    "number_of_results must be between {} and {}, got {}",
                    MIN_RESULTS, MAX_RESULTS, count
                )));
            }
            None => None,
        };

        let results = self
            .gateway
            .retrieve(RetrieveRequest {
                knowledge_base_id,
                query: query.clone(),
                number_of_results,
            })
            .await?;

        Ok(RetrievalResponse {
            query,
            count: results.len(),
            results,
        })
    }

    pub async fn upload_document(
        &self,
        input: UploadDocumentInput,
    ) -> Result<UploadConfirmation, DomainError> {
        let local_path = PathBuf::from(required("local_path", &input.local_path)?);
        let bucket = required("bucket_name", &input.bucket_name)?;
        validate_bucket_name(&bucket)?;
        let key = required("key", &input.key)?;

        let metadata = tokio::fs::metadata(&local_path).await.map_err(|_| {
            DomainError::validation(format!("file not found: {}", local_path.display()))
        })?;
        if !metadata.is_file() {
            return Err(DomainError::validation(format!(
                "not a regular file: {}",
                local_path.display()
            )));
        }

        let content_type = optional(&input.content_type).or_else(|| {
            mime_guess::from_path(&local_path)
                .first_raw()
                .map(str::to_string)
        });

        self.gateway
            .upload_object(UploadObjectRequest {
                local_path,
                bucket,
                key,
                content_type,
            })
            .await
    }

    pub async fn list_documents(
        &self,
        bucket_name: &str,
        prefix: Option<String>,
    ) -> Result<DocumentListing, DomainError> {
        let bucket = required("bucket_name", bucket_name)?;
        validate_bucket_name(&bucket)?;
        let prefix = optional(&prefix);

        let documents = collect_all(|token| {
            self.gateway
                .list_objects(&bucket, prefix.as_deref(), token)
        })
        .await?;

        Ok(DocumentListing {
            bucket,
            prefix,
            count: documents.len(),
            documents,
        })
    }

    pub async fn create_bucket(
        &self,
        bucket_name: &str,
        region: Option<String>,
    ) -> Result<BucketDescriptor, DomainError> {
        let bucket_name = required("bucket_name", bucket_name)?;
        validate_bucket_name(&bucket_name)?;
        let region = optional(&region).unwrap_or_else(|| self.normalizer.region().to_string());

        self.gateway
            .create_bucket(CreateBucketRequest {
                bucket_name,
                region,
            })
            .await
    }

    pub async fn create_role(&self, input: CreateRoleInput) -> Result<RoleDescriptor, DomainError> {
        let role_name = required("role_name", &input.role_name)?;
        validate_role_name(&role_name)?;

        let max_session_duration = input.max_session_duration.unwrap_or(MIN_SESSION_DURATION);
        if !(MIN_SESSION_DURATION..=MAX_SESSION_DURATION).contains(&max_session_duration) {
            return Err(DomainError::validation(format!(
                "max_session_duration must be between {} and {} seconds, got {}",
                MIN_SESSION_DURATION, MAX_SESSION_DURATION, max_session_duration
            )));
        }

        let trust_policy = self.trust_policy().await?;

        self.gateway
            .create_role(CreateRoleRequest {
                role_name,
                path: ROLE_PATH.to_string(),
                description: optional(&input.description),
                max_session_duration: max_session_duration as i32,
                trust_policy,
            })
            .await
    }

    /// Trust policy letting Bedrock assume the role for knowledge bases in this
    /// account and region only
    async fn trust_policy(&self) -> Result<serde_json::Value, DomainError> {
        let account = self.normalizer.account_id().await?;
        let partition = self.normalizer.partition();

        Ok(json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": "bedrock.amazonaws.com" },
                "Action": "sts:AssumeRole",
                "Condition": {
                    "StringEquals": { "aws:SourceAccount": account },
                    "ArnLike": {
                        "aws:SourceArn": format!(
                            "arn:{}:bedrock:{}:{}:knowledge-base/*",
                            partition,
                            self.normalizer.region(),
                            account
                        )
                    }
                }
            }]
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::domain::ingestion::{ChunkingConfiguration, ChunkingFields};
    use crate::domain::knowledge_base::Page;
    use crate::domain::knowledge_base::mock::{GatewayCall, MockGateway, knowledge_base};
    use crate::domain::reference::MockIdentityResolver;
    use crate::domain::{ErrorKind, Locale};

    const ACCOUNT: &str = "123456789012";

    fn identity() -> MockIdentityResolver {
        let mut identity = MockIdentityResolver::new();
        identity
            .expect_resolve_account_id()
            .returning(|| Ok(ACCOUNT.to_string()));
        identity
    }

    fn create_service(gateway: Arc<MockGateway>) -> KnowledgeBaseService {
        create_service_with(gateway, identity(), "us-east-1")
    }

    fn create_service_with(
        gateway: Arc<MockGateway>,
        identity: MockIdentityResolver,
        region: &str,
    ) -> KnowledgeBaseService {
        KnowledgeBaseService::new(
            gateway,
            IdentifierNormalizer::new(region, Arc::new(identity)),
            ErrorTranslator::new(Locale::En),
        )
    }

    fn create_input() -> CreateKnowledgeBaseInput {
        CreateKnowledgeBaseInput {
            name: "KB1".to_string(),
            role_reference: "role/R1".to_string(),
            bucket_reference: "s3://bucket1".to_string(),
            storage_type: Some("S3".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_knowledge_base_normalizes_references() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let kb = service.create_knowledge_base(create_input()).await.unwrap();

        assert_eq!(kb.knowledge_base_id, "KB0001");
        assert_eq!(kb.status, "CREATING");
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::CreateKnowledgeBase(CreateKnowledgeBaseRequest {
                name: "KB1".to_string(),
                description: None,
                role_arn: "arn:aws:iam::123456789012:role/R1".to_string(),
                storage: StorageConfiguration::S3 {
                    bucket_arn: "arn:aws:s3:::bucket1".to_string(),
                },
                embedding_model_arn: Some(
                    "arn:aws:bedrock:us-east-1::foundation-model/amazon.titan-embed-text-v2:0"
                        .to_string()
                ),
            })]
        );
    }

    #[tokio::test]
    async fn test_s3_default_embedding_model_follows_region() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service_with(gateway.clone(), identity(), "cn-north-1");

        service.create_knowledge_base(create_input()).await.unwrap();

        match &gateway.calls()[0] {
            GatewayCall::CreateKnowledgeBase(request) => {
                assert_eq!(
                    request.embedding_model_arn.as_deref(),
                    Some("arn:aws-cn:bedrock:cn-north-1::foundation-model/amazon.titan-embed-text-v2:0")
                );
                assert_eq!(
                    request.storage,
                    StorageConfiguration::S3 {
                        bucket_arn: "arn:aws-cn:s3:::bucket1".to_string(),
                    }
                );
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_knowledge_base_ingestion_options_fail_before_any_call() {
        let gateway = Arc::new(MockGateway::new());
        let mut identity = MockIdentityResolver::new();
        identity.expect_resolve_account_id().never();
        let service = create_service_with(gateway.clone(), identity, "us-east-1");

        let input = CreateKnowledgeBaseInput {
            ingestion: IngestionOptions {
                chunking_strategy: Some("FIXED_SIZE".to_string()),
                chunking: ChunkingFields {
                    max_tokens: Some(1000),
                    overlap_percentage: Some(20),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..create_input()
        };

        let error = service.create_knowledge_base(input).await.unwrap_err();

        assert!(matches!(error, DomainError::Validation { .. }));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_s3_vectors_knowledge_base() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let input = CreateKnowledgeBaseInput {
            storage_type: Some("s3_vectors".to_string()),
            bucket_reference: "s3://vectors".to_string(),
            embedding_model_arn: Some(
                "arn:aws:bedrock:us-east-1::foundation-model/amazon.titan-embed-text-v2:0"
                    .to_string(),
            ),
            vector_index_name: Some("docs".to_string()),
            multimodal_storage_uri: Some("s3://media/extracted/".to_string()),
            ..create_input()
        };

        service.create_knowledge_base(input).await.unwrap();

        match &gateway.calls()[0] {
            GatewayCall::CreateKnowledgeBase(request) => assert_eq!(
                request.storage,
                StorageConfiguration::S3Vectors {
                    vector_bucket_arn: "arn:aws:s3vectors:us-east-1:123456789012:bucket/vectors"
                        .to_string(),
                    index_name: Some("docs".to_string()),
                    multimodal_storage_uri: Some("s3://media/extracted/".to_string()),
                }
            ),
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_s3_vectors_without_embedding_model_fails_locally() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let input = CreateKnowledgeBaseInput {
            storage_type: Some("S3_VECTORS".to_string()),
            ..create_input()
        };

        let error = service.create_knowledge_base(input).await.unwrap_err();

        assert!(matches!(error, DomainError::Validation { .. }));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_multimodal_uri_rules() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let with_s3 = CreateKnowledgeBaseInput {
            multimodal_storage_uri: Some("s3://media".to_string()),
            ..create_input()
        };
        assert!(service.create_knowledge_base(with_s3).await.is_err());

        let bad_uri = CreateKnowledgeBaseInput {
            storage_type: Some("S3_VECTORS".to_string()),
            embedding_model_arn: Some("arn:aws:bedrock:us-east-1::foundation-model/m".to_string()),
            multimodal_storage_uri: Some("https://media".to_string()),
            ..create_input()
        };
        assert!(service.create_knowledge_base(bad_uri).await.is_err());

        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_bucket_reference_fails_before_any_call() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let input = CreateKnowledgeBaseInput {
            bucket_reference: "ftp://bucket1".to_string(),
            ..create_input()
        };

        let error = service.create_knowledge_base(input).await.unwrap_err();

        assert_eq!(service.translate(&error).kind, ErrorKind::InvalidReference);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_identity_failure_is_reported() {
        let gateway = Arc::new(MockGateway::new());
        let mut identity = MockIdentityResolver::new();
        identity
            .expect_resolve_account_id()
            .times(1)
            .returning(|| Err(DomainError::identity_resolution("no credentials")));
        let service = create_service_with(gateway.clone(), identity, "us-east-1");

        let error = service.create_knowledge_base(create_input()).await.unwrap_err();

        let record = service.translate(&error);
        assert_eq!(record.kind, ErrorKind::IdentityResolutionFailed);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_strategy_is_rejected() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let input = CreateDataSourceInput {
            knowledge_base_id: "KB1".to_string(),
            name: "docs".to_string(),
            bucket_reference: "arn:aws:s3:::bucket1".to_string(),
            ingestion: IngestionOptions {
                chunking_strategy: Some("SLIDING_WINDOW".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let error = service.create_data_source(input).await.unwrap_err();

        assert_eq!(service.translate(&error).kind, ErrorKind::UnsupportedStrategy);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_data_source() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let input = CreateDataSourceInput {
            knowledge_base_id: "KB1".to_string(),
            name: "docs".to_string(),
            bucket_reference: "s3://bucket1/docs/".to_string(),
            source_type: Some("s3".to_string()),
            inclusion_prefixes: Some("docs/, faq/ ,,".to_string()),
            ingestion: IngestionOptions {
                chunking_strategy: Some("FIXED_SIZE".to_string()),
                chunking: ChunkingFields {
                    max_tokens: Some(1000),
                    overlap_percentage: Some(20),
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        };

        let ds = service.create_data_source(input).await.unwrap();
        assert_eq!(ds.knowledge_base_id, "KB1");

        match &gateway.calls()[0] {
            GatewayCall::CreateDataSource(request) => {
                assert_eq!(request.bucket_arn, "arn:aws:s3:::bucket1");
                assert_eq!(request.inclusion_prefixes, vec!["docs/", "faq/"]);
                assert_eq!(
                    request.vector_ingestion.as_ref().and_then(|v| v.chunking.clone()),
                    Some(ChunkingConfiguration::FixedSize {
                        max_tokens: 1000,
                        overlap_percentage: 20
                    })
                );
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_data_source_type_must_be_s3() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let input = CreateDataSourceInput {
            knowledge_base_id: "KB1".to_string(),
            name: "docs".to_string(),
            bucket_reference: "s3://bucket1".to_string(),
            source_type: Some("WEB".to_string()),
            ..Default::default()
        };

        assert!(matches!(
            service.create_data_source(input).await,
            Err(DomainError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_knowledge_bases_drains_pages() {
        let gateway = Arc::new(
            MockGateway::new()
                .with_knowledge_base_page(
                    None,
                    Page::new(vec![knowledge_base("KB1", "a")], Some("p2".to_string())),
                )
                .with_knowledge_base_page(
                    Some("p2"),
                    Page::last(vec![knowledge_base("KB2", "b"), knowledge_base("KB3", "c")]),
                ),
        );
        let service = create_service(gateway.clone());

        let list = service.list_knowledge_bases().await.unwrap();

        assert_eq!(list.count, 3);
        let ids: Vec<_> = list
            .knowledge_bases
            .iter()
            .map(|kb| kb.knowledge_base_id.as_str())
            .collect();
        assert_eq!(ids, vec!["KB1", "KB2", "KB3"]);
        assert_eq!(
            gateway.calls(),
            vec![
                GatewayCall::ListKnowledgeBases(None),
                GatewayCall::ListKnowledgeBases(Some("p2".to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_data_sources_drains_pages() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let list = service.list_data_sources("KB1").await.unwrap();

        assert_eq!(list.count, 2);
        assert_eq!(list.data_sources[0].name, "first");
        assert_eq!(list.data_sources[1].name, "second");
    }

    #[tokio::test]
    async fn test_update_requires_a_change() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let input = UpdateKnowledgeBaseInput {
            knowledge_base_id: "KB1".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            service.update_knowledge_base(input).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_normalizes_role() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let input = UpdateKnowledgeBaseInput {
            knowledge_base_id: "KB1".to_string(),
            role_reference: Some("KbRole".to_string()),
            ..Default::default()
        };

        let kb = service.update_knowledge_base(input).await.unwrap();

        assert_eq!(
            kb.role_arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/KbRole")
        );
    }

    #[tokio::test]
    async fn test_retrieve_rejects_out_of_range_count_before_call() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        for count in [0, -1, 101] {
            let error = service.retrieve("KB1", "q", Some(count)).await.unwrap_err();
            assert_eq!(service.translate(&error).kind, ErrorKind::ValidationError);
        }

        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_retrieve() {
        let passage = RetrievedPassage {
            content: "hello".to_string(),
            score: Some(0.9),
            location: Some("s3://bucket1/a.txt".to_string()),
            location_type: Some("S3".to_string()),
            metadata: serde_json::Map::new(),
        };
        let gateway = Arc::new(MockGateway::new().with_passages(vec![passage.clone()]));
        let service = create_service(gateway.clone());

        let response = service.retrieve("KB1", " what is it ", None).await.unwrap();

        assert_eq!(response.query, "what is it");
        assert_eq!(response.count, 1);
        assert_eq!(response.results, vec![passage]);
        assert_eq!(
            gateway.calls(),
            vec![GatewayCall::Retrieve(RetrieveRequest {
                knowledge_base_id: "KB1".to_string(),
                query: "what is it".to_string(),
                number_of_results: None,
            })]
        );
    }

    #[tokio::test]
    async fn test_remote_throttling_is_translated() {
        let gateway = Arc::new(MockGateway::new().fail_with(DomainError::remote(
            "Retrieve",
            Some("ThrottlingException".to_string()),
            Some("Rate exceeded".to_string()),
            Some("req-42".to_string()),
        )));
        let service = create_service(gateway.clone());

        let error = service.retrieve("KB1", "q", Some(5)).await.unwrap_err();
        let record = service.translate(&error);

        assert_eq!(record.kind, ErrorKind::RemoteThrottled);
        assert!(record.retryable);
        assert_eq!(record.correlation_id.as_deref(), Some("req-42"));
        assert_eq!(record.code.as_deref(), Some("ThrottlingException"));
    }

    #[tokio::test]
    async fn test_upload_missing_file_fails_before_call() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let input = UploadDocumentInput {
            local_path: "/nonexistent/report.pdf".to_string(),
            bucket_name: "bucket1".to_string(),
            key: "report.pdf".to_string(),
            content_type: None,
        };

        assert!(matches!(
            service.upload_document(input).await,
            Err(DomainError::Validation { .. })
        ));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_directory_is_rejected() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());
        let dir = tempfile::tempdir().unwrap();

        let input = UploadDocumentInput {
            local_path: dir.path().display().to_string(),
            bucket_name: "bucket1".to_string(),
            key: "dir".to_string(),
            content_type: None,
        };

        assert!(service.upload_document(input).await.is_err());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_upload_guesses_content_type() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        writeln!(file, "{{}}").unwrap();

        let input = UploadDocumentInput {
            local_path: file.path().display().to_string(),
            bucket_name: "bucket1".to_string(),
            key: "docs/data.json".to_string(),
            content_type: None,
        };

        let confirmation = service.upload_document(input).await.unwrap();

        assert_eq!(confirmation.s3_uri, "s3://bucket1/docs/data.json");
        assert_eq!(confirmation.status, "uploaded");
        match &gateway.calls()[0] {
            GatewayCall::UploadObject(request) => {
                assert_eq!(request.content_type.as_deref(), Some("application/json"));
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_list_documents() {
        let object = |key: &str| S3ObjectDescriptor {
            key: key.to_string(),
            size: 10,
            last_modified: None,
        };
        let gateway = Arc::new(
            MockGateway::new()
                .with_object_page(None, Page::new(vec![object("docs/a")], Some("c2".to_string())))
                .with_object_page(Some("c2"), Page::last(vec![object("docs/b")])),
        );
        let service = create_service(gateway.clone());

        let listing = service
            .list_documents("bucket1", Some("docs/".to_string()))
            .await
            .unwrap();

        assert_eq!(listing.count, 2);
        assert_eq!(listing.prefix.as_deref(), Some("docs/"));
        assert_eq!(
            gateway.calls()[1],
            GatewayCall::ListObjects(
                "bucket1".to_string(),
                Some("docs/".to_string()),
                Some("c2".to_string())
            )
        );
    }

    #[tokio::test]
    async fn test_create_bucket_defaults_to_active_region() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service_with(gateway.clone(), identity(), "eu-west-1");

        let bucket = service.create_bucket("kb-docs", None).await.unwrap();
        assert_eq!(bucket.region, "eu-west-1");

        for name in ["KB-Docs", "ab", "my..bucket", "192.168.1.1"] {
            assert!(service.create_bucket(name, None).await.is_err(), "{}", name);
        }
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_create_role_trust_policy() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service_with(gateway.clone(), identity(), "cn-north-1");

        let role = service
            .create_role(CreateRoleInput {
                role_name: "BedrockKbRole".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(role.path, "/service-role/");

        match &gateway.calls()[0] {
            GatewayCall::CreateRole(request) => {
                assert_eq!(request.max_session_duration, 3600);
                let condition = &request.trust_policy["Statement"][0]["Condition"];
                assert_eq!(condition["StringEquals"]["aws:SourceAccount"], ACCOUNT);
                assert_eq!(
                    condition["ArnLike"]["aws:SourceArn"],
                    "arn:aws-cn:bedrock:cn-north-1:123456789012:knowledge-base/*"
                );
                assert_eq!(
                    request.trust_policy["Statement"][0]["Principal"]["Service"],
                    "bedrock.amazonaws.com"
                );
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_role_validation() {
        let gateway = Arc::new(MockGateway::new());
        let service = create_service(gateway.clone());

        let too_short = CreateRoleInput {
            role_name: "KbRole".to_string(),
            max_session_duration: Some(600),
            ..Default::default()
        };
        assert!(service.create_role(too_short).await.is_err());

        let bad_name = CreateRoleInput {
            role_name: "kb role!".to_string(),
            ..Default::default()
        };
        assert!(service.create_role(bad_name).await.is_err());

        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_account_is_resolved_once() {
        let gateway = Arc::new(MockGateway::new());
        let mut identity = MockIdentityResolver::new();
        identity
            .expect_resolve_account_id()
            .times(1)
            .returning(|| Ok(ACCOUNT.to_string()));
        let service = create_service_with(gateway.clone(), identity, "us-east-1");

        service.create_knowledge_base(create_input()).await.unwrap();
        service
            .update_knowledge_base(UpdateKnowledgeBaseInput {
                knowledge_base_id: "KB0001".to_string(),
                role_reference: Some("role/R2".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(gateway.calls().len(), 2);
    }
}
