//! AWS implementation of the knowledge base gateway

use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_bedrockagent::Client as BedrockAgentClient;
use aws_sdk_bedrockagentruntime::Client as BedrockAgentRuntimeClient;
use aws_sdk_bedrockagentruntime::types::{
    KnowledgeBaseQuery, KnowledgeBaseRetrievalConfiguration, KnowledgeBaseVectorSearchConfiguration,
};
use aws_sdk_iam::Client as IamClient;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, PublicAccessBlockConfiguration,
};

use super::convert;
use super::error::remote_error;
use super::marshal;
use crate::config::DEFAULT_REGION;
use crate::domain::{DomainError, Partition};
use crate::domain::knowledge_base::{
    BucketDescriptor, CreateBucketRequest, CreateDataSourceRequest, CreateKnowledgeBaseRequest,
    CreateRoleRequest, DataSourceDescriptor, IngestionJobDescriptor, KnowledgeBaseDescriptor,
    KnowledgeBaseGateway, Page, RetrieveRequest, RetrievedPassage, RoleDescriptor,
    S3ObjectDescriptor, StartIngestionJobRequest, UpdateKnowledgeBaseRequest, UploadConfirmation,
    UploadObjectRequest,
};

/// Gateway over Bedrock Agent, Bedrock Agent Runtime, S3 and IAM
#[derive(Debug, Clone)]
pub struct AwsKnowledgeBaseGateway {
    agent: BedrockAgentClient,
    runtime: BedrockAgentRuntimeClient,
    s3: S3Client,
    iam: IamClient,
    sdk_config: SdkConfig,
}

impl AwsKnowledgeBaseGateway {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            agent: BedrockAgentClient::new(sdk_config),
            runtime: BedrockAgentRuntimeClient::new(sdk_config),
            s3: S3Client::new(sdk_config),
            iam: IamClient::new(sdk_config),
            sdk_config: sdk_config.clone(),
        }
    }

    /// S3 client pinned to `region`; bucket creation must target the bucket's region
    fn s3_for_region(&self, region: &str) -> S3Client {
        let config = aws_sdk_s3::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();

        S3Client::from_conf(config)
    }
}

fn missing(operation: &str, member: &str) -> DomainError {
    DomainError::remote(
        operation,
        Some("InternalFailure".to_string()),
        Some(format!("response carried no {}", member)),
        None,
    )
}

fn number_of_results(value: u32) -> Result<i32, DomainError> {
    i32::try_from(value)
        .map_err(|_| DomainError::validation("number_of_results is out of range"))
}

#[async_trait]
impl KnowledgeBaseGateway for AwsKnowledgeBaseGateway {
    async fn create_knowledge_base(
        &self,
        request: CreateKnowledgeBaseRequest,
    ) -> Result<KnowledgeBaseDescriptor, DomainError> {
        let (storage, knowledge_base_configuration) = marshal::knowledge_base_settings(
            &request.storage,
            request.embedding_model_arn.as_deref(),
        )?;

        tracing::debug!(
            name = %request.name,
            storage_type = request.storage.storage_type().as_str(),
            "Creating knowledge base"
        );

        let output = self
            .agent
            .create_knowledge_base()
            .name(&request.name)
            .set_description(request.description)
            .role_arn(&request.role_arn)
            .storage_configuration(storage)
            .set_knowledge_base_configuration(knowledge_base_configuration)
            .send()
            .await
            .map_err(|e| remote_error("CreateKnowledgeBase", e))?;

        let kb = output
            .knowledge_base()
            .ok_or_else(|| missing("CreateKnowledgeBase", "knowledge base"))?;

        tracing::info!(knowledge_base_id = %kb.knowledge_base_id(), "Created knowledge base");
        Ok(convert::knowledge_base(kb))
    }

    async fn list_knowledge_bases(
        &self,
        next_token: Option<String>,
    ) -> Result<Page<KnowledgeBaseDescriptor>, DomainError> {
        let output = self
            .agent
            .list_knowledge_bases()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| remote_error("ListKnowledgeBases", e))?;

        Ok(Page::new(
            output
                .knowledge_base_summaries()
                .iter()
                .map(convert::knowledge_base_summary)
                .collect(),
            output.next_token().map(str::to_string),
        ))
    }

    async fn get_knowledge_base(
        &self,
        knowledge_base_id: &str,
    ) -> Result<KnowledgeBaseDescriptor, DomainError> {
        let output = self
            .agent
            .get_knowledge_base()
            .knowledge_base_id(knowledge_base_id)
            .send()
            .await
            .map_err(|e| remote_error("GetKnowledgeBase", e))?;

        output
            .knowledge_base()
            .map(convert::knowledge_base)
            .ok_or_else(|| missing("GetKnowledgeBase", "knowledge base"))
    }

    async fn update_knowledge_base(
        &self,
        request: UpdateKnowledgeBaseRequest,
    ) -> Result<KnowledgeBaseDescriptor, DomainError> {
        let current = self
            .agent
            .get_knowledge_base()
            .knowledge_base_id(&request.knowledge_base_id)
            .send()
            .await
            .map_err(|e| remote_error("GetKnowledgeBase", e))?;

        let existing = current
            .knowledge_base()
            .ok_or_else(|| missing("GetKnowledgeBase", "knowledge base"))?;

        let name = request
            .name
            .unwrap_or_else(|| existing.name().to_string());
        let description = request
            .description
            .or_else(|| existing.description().map(str::to_string));
        let role_arn = request
            .role_arn
            .unwrap_or_else(|| existing.role_arn().to_string());

        let output = self
            .agent
            .update_knowledge_base()
            .knowledge_base_id(&request.knowledge_base_id)
            .name(name)
            .set_description(description)
            .role_arn(role_arn)
            .set_knowledge_base_configuration(existing.knowledge_base_configuration().cloned())
            .set_storage_configuration(existing.storage_configuration().cloned())
            .send()
            .await
            .map_err(|e| remote_error("UpdateKnowledgeBase", e))?;

        let kb = output
            .knowledge_base()
            .ok_or_else(|| missing("UpdateKnowledgeBase", "knowledge base"))?;

        tracing::info!(knowledge_base_id = %kb.knowledge_base_id(), "Updated knowledge base");
        Ok(convert::knowledge_base(kb))
    }

    async fn create_data_source(
        &self,
        request: CreateDataSourceRequest,
    ) -> Result<DataSourceDescriptor, DomainError> {
        let configuration =
            marshal::data_source_configuration(&request.bucket_arn, &request.inclusion_prefixes)?;
        let vector_ingestion = request
            .vector_ingestion
            .as_ref()
            .map(marshal::vector_ingestion)
            .transpose()?;

        let output = self
            .agent
            .create_data_source()
            .knowledge_base_id(&request.knowledge_base_id)
            .name(&request.name)
            .set_description(request.description)
            .data_source_configuration(configuration)
            .set_vector_ingestion_configuration(vector_ingestion)
            .send()
            .await
            .map_err(|e| remote_error("CreateDataSource", e))?;

        let ds = output
            .data_source()
            .ok_or_else(|| missing("CreateDataSource", "data source"))?;

        tracing::info!(
            knowledge_base_id = %ds.knowledge_base_id(),
            data_source_id = %ds.data_source_id(),
            "Created data source"
        );
        Ok(convert::data_source(ds))
    }

    async fn list_data_sources(
        &self,
        knowledge_base_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<DataSourceDescriptor>, DomainError> {
        let output = self
            .agent
            .list_data_sources()
            .knowledge_base_id(knowledge_base_id)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| remote_error("ListDataSources", e))?;

        Ok(Page::new(
            output
                .data_source_summaries()
                .iter()
                .map(convert::data_source_summary)
                .collect(),
            output.next_token().map(str::to_string),
        ))
    }

    async fn start_ingestion_job(
        &self,
        request: StartIngestionJobRequest,
    ) -> Result<IngestionJobDescriptor, DomainError> {
        let output = self
            .agent
            .start_ingestion_job()
            .knowledge_base_id(&request.knowledge_base_id)
            .data_source_id(&request.data_source_id)
            .set_description(request.description)
            .send()
            .await
            .map_err(|e| remote_error("StartIngestionJob", e))?;

        let job = output
            .ingestion_job()
            .ok_or_else(|| missing("StartIngestionJob", "ingestion job"))?;

        tracing::info!(ingestion_job_id = %job.ingestion_job_id(), "Started ingestion job");
        Ok(convert::ingestion_job(job))
    }

    async fn get_ingestion_job(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
        ingestion_job_id: &str,
    ) -> Result<IngestionJobDescriptor, DomainError> {
        let output = self
            .agent
            .get_ingestion_job()
            .knowledge_base_id(knowledge_base_id)
            .data_source_id(data_source_id)
            .ingestion_job_id(ingestion_job_id)
            .send()
            .await
            .map_err(|e| remote_error("GetIngestionJob", e))?;

        output
            .ingestion_job()
            .map(convert::ingestion_job)
            .ok_or_else(|| missing("GetIngestionJob", "ingestion job"))
    }

    async fn retrieve(
        &self,
        request: RetrieveRequest,
    ) -> Result<Vec<RetrievedPassage>, DomainError> {
        let query = KnowledgeBaseQuery::builder().text(request.query).build();

        let retrieval_configuration = match request.number_of_results {
            Some(count) => Some(
                KnowledgeBaseRetrievalConfiguration::builder()
                    .vector_search_configuration(
                        KnowledgeBaseVectorSearchConfiguration::builder()
                            .number_of_results(number_of_results(count)?)
                            .build(),
                    )
                    .build(),
            ),
            None => None,
        };

        let response = self
            .runtime
            .retrieve()
            .knowledge_base_id(&request.knowledge_base_id)
            .retrieval_query(query)
            .set_retrieval_configuration(retrieval_configuration)
            .send()
            .await
            .map_err(|e| remote_error("Retrieve", e))?;

        Ok(response
            .retrieval_results()
            .iter()
            .filter_map(convert::retrieved_passage)
            .collect())
    }

    async fn upload_object(
        &self,
        request: UploadObjectRequest,
    ) -> Result<UploadConfirmation, DomainError> {
        let body = ByteStream::from_path(&request.local_path)
            .await
            .map_err(|e| {
                DomainError::validation(format!(
                    "cannot read '{}': {}",
                    request.local_path.display(),
                    e
                ))
            })?;

        let output = self
            .s3
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .body(body)
            .set_content_type(request.content_type)
            .send()
            .await
            .map_err(|e| remote_error("PutObject", e))?;

        tracing::info!(bucket = %request.bucket, key = %request.key, "Uploaded object");

        Ok(UploadConfirmation {
            s3_uri: format!("s3://{}/{}", request.bucket, request.key),
            bucket: request.bucket,
            key: request.key,
            etag: output.e_tag().map(str::to_string),
            status: "uploaded".to_string(),
        })
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<Page<S3ObjectDescriptor>, DomainError> {
        let output = self
            .s3
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(str::to_string))
            .set_continuation_token(next_token)
            .send()
            .await
            .map_err(|e| remote_error("ListObjectsV2", e))?;

        let next_token = match output.is_truncated() {
            Some(true) => output.next_continuation_token().map(str::to_string),
            _ => None,
        };

        Ok(Page::new(
            output.contents().iter().filter_map(convert::s3_object).collect(),
            next_token,
        ))
    }

    async fn create_bucket(
        &self,
        request: CreateBucketRequest,
    ) -> Result<BucketDescriptor, DomainError> {
        let client = self.s3_for_region(&request.region);

        let bucket_configuration = (request.region != DEFAULT_REGION).then(|| {
            CreateBucketConfiguration::builder()
                .location_constraint(BucketLocationConstraint::from(request.region.as_str()))
                .build()
        });

        let output = client
            .create_bucket()
            .bucket(&request.bucket_name)
            .set_create_bucket_configuration(bucket_configuration)
            .send()
            .await
            .map_err(|e| remote_error("CreateBucket", e))?;

        client
            .put_public_access_block()
            .bucket(&request.bucket_name)
            .public_access_block_configuration(
                PublicAccessBlockConfiguration::builder()
                    .block_public_acls(true)
                    .ignore_public_acls(true)
                    .block_public_policy(true)
                    .restrict_public_buckets(true)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| remote_error("PutPublicAccessBlock", e))?;

        let partition = Partition::from_region(&request.region);
        tracing::info!(bucket = %request.bucket_name, region = %request.region, "Created bucket");

        Ok(BucketDescriptor {
            arn: format!("arn:{}:s3:::{}", partition, request.bucket_name),
            location: output.location().map(str::to_string),
            bucket_name: request.bucket_name,
            region: request.region,
            status: "created".to_string(),
        })
    }

    async fn create_role(
        &self,
        request: CreateRoleRequest,
    ) -> Result<RoleDescriptor, DomainError> {
        let policy = serde_json::to_string(&request.trust_policy)
            .map_err(|e| DomainError::validation(format!("invalid trust policy: {}", e)))?;

        let output = self
            .iam
            .create_role()
            .role_name(&request.role_name)
            .path(&request.path)
            .assume_role_policy_document(policy)
            .set_description(request.description)
            .max_session_duration(request.max_session_duration)
            .send()
            .await
            .map_err(|e| remote_error("CreateRole", e))?;

        let role = output
            .role()
            .ok_or_else(|| missing("CreateRole", "role"))?;

        tracing::info!(role_name = %role.role_name(), "Created role");

        Ok(RoleDescriptor {
            role_name: role.role_name().to_string(),
            role_arn: role.arn().to_string(),
            path: role.path().to_string(),
            status: "created".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AwsSettings;
    use crate::infrastructure::aws::{build_retry_config, load_sdk_config};

    async fn offline_gateway() -> AwsKnowledgeBaseGateway {
        let settings = AwsSettings {
            region: "us-west-2".to_string(),
            profile: None,
        };
        let config = load_sdk_config(&settings, &build_retry_config()).await;

        AwsKnowledgeBaseGateway::new(&config)
    }

    #[tokio::test]
    async fn test_unreadable_upload_source_fails_before_put() {
        let gateway = offline_gateway().await;

        let result = gateway
            .upload_object(UploadObjectRequest {
                local_path: "/nonexistent/definitely/missing.pdf".into(),
                bucket: "bucket1".to_string(),
                key: "missing.pdf".to_string(),
                content_type: None,
            })
            .await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_regional_client_uses_requested_region() {
        let gateway = offline_gateway().await;
        let client = gateway.s3_for_region("ap-northeast-1");

        assert_eq!(
            client.config().region().map(|r| r.as_ref()),
            Some("ap-northeast-1")
        );
    }
}
