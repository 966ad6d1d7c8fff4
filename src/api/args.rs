//! Tool argument schemas

use rmcp::schemars;
use serde::Deserialize;

use crate::domain::IngestionOptions;
use crate::domain::ingestion::{ChunkingFields, ParsingFields};
use crate::infrastructure::services::{
    CreateDataSourceInput, CreateKnowledgeBaseInput, CreateRoleInput, UpdateKnowledgeBaseInput,
    UploadDocumentInput,
};

/// Parsing and chunking parameters shared by knowledge base and data source tools
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct IngestionArgs {
    #[schemars(description = "Parser: BEDROCK_FOUNDATION_MODEL or BEDROCK_DATA_AUTOMATION")]
    pub parsing_strategy: Option<String>,
    #[schemars(description = "Model ARN for foundation-model parsing")]
    pub parsing_model_arn: Option<String>,
    #[schemars(description = "TEXT or MULTIMODAL")]
    pub parsing_modality: Option<String>,
    #[schemars(description = "Instructions given to the parsing model")]
    pub parsing_prompt_text: Option<String>,
    #[schemars(description = "Chunking: FIXED_SIZE, HIERARCHICAL, SEMANTIC or NONE")]
    pub chunking_strategy: Option<String>,
    #[schemars(description = "Maximum tokens per chunk (FIXED_SIZE, SEMANTIC)")]
    pub chunking_max_tokens: Option<i64>,
    #[schemars(description = "Overlap between chunks in percent, 0-99 (FIXED_SIZE)")]
    pub chunking_overlap_percentage: Option<i64>,
    #[schemars(description = "Parent chunk size in tokens (HIERARCHICAL)")]
    pub chunking_parent_max_tokens: Option<i64>,
    #[schemars(description = "Child chunk size in tokens (HIERARCHICAL)")]
    pub chunking_child_max_tokens: Option<i64>,
    #[schemars(description = "Overlap between child chunks in tokens (HIERARCHICAL)")]
    pub chunking_overlap_tokens: Option<i64>,
    #[schemars(description = "Sentences compared on each side, 0-1 (SEMANTIC)")]
    pub chunking_buffer_size: Option<i64>,
    #[schemars(description = "Breakpoint percentile threshold, 50-99 (SEMANTIC)")]
    pub chunking_breakpoint_threshold: Option<i64>,
}

impl From<IngestionArgs> for IngestionOptions {
    fn from(args: IngestionArgs) -> Self {
        Self {
            parsing_strategy: args.parsing_strategy,
            parsing: ParsingFields {
                model_arn: args.parsing_model_arn,
                modality: args.parsing_modality,
                prompt_text: args.parsing_prompt_text,
            },
            chunking_strategy: args.chunking_strategy,
            chunking: ChunkingFields {
                max_tokens: args.chunking_max_tokens,
                overlap_percentage: args.chunking_overlap_percentage,
                parent_max_tokens: args.chunking_parent_max_tokens,
                child_max_tokens: args.chunking_child_max_tokens,
                overlap_tokens: args.chunking_overlap_tokens,
                buffer_size: args.chunking_buffer_size,
                breakpoint_threshold: args.chunking_breakpoint_threshold,
            },
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(description = "Parameters for creating a knowledge base")]
pub struct CreateKnowledgeBaseArgs {
    pub name: String,
    /// IAM role: full ARN, `role/<name>` or a bare role name
    #[serde(alias = "role_arn")]
    pub role_reference: String,
    /// Bucket: full ARN or `s3://<bucket>[/<path>]`
    #[serde(alias = "bucket_arn")]
    pub bucket_reference: String,
    pub description: Option<String>,
    #[schemars(description = "S3 (default) or S3_VECTORS")]
    pub storage_type: Option<String>,
    #[schemars(description = "Embedding model ARN; required for S3_VECTORS")]
    pub embedding_model_arn: Option<String>,
    #[schemars(description = "Vector index name (S3_VECTORS)")]
    pub vector_index_name: Option<String>,
    #[schemars(description = "s3:// location for extracted multimodal content (S3_VECTORS)")]
    pub multimodal_storage_uri: Option<String>,
    #[serde(flatten)]
    pub ingestion: IngestionArgs,
}

impl From<CreateKnowledgeBaseArgs> for CreateKnowledgeBaseInput {
    fn from(args: CreateKnowledgeBaseArgs) -> Self {
        Self {
            name: args.name,
            role_reference: args.role_reference,
            bucket_reference: args.bucket_reference,
            description: args.description,
            storage_type: args.storage_type,
            embedding_model_arn: args.embedding_model_arn,
            vector_index_name: args.vector_index_name,
            multimodal_storage_uri: args.multimodal_storage_uri,
            ingestion: args.ingestion.into(),
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct KnowledgeBaseIdArgs {
    pub knowledge_base_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(description = "Parameters for updating a knowledge base")]
pub struct UpdateKnowledgeBaseArgs {
    pub knowledge_base_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "role_arn")]
    pub role_reference: Option<String>,
}

impl From<UpdateKnowledgeBaseArgs> for UpdateKnowledgeBaseInput {
    fn from(args: UpdateKnowledgeBaseArgs) -> Self {
        Self {
            knowledge_base_id: args.knowledge_base_id,
            name: args.name,
            description: args.description,
            role_reference: args.role_reference,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(description = "Parameters for creating an S3 data source")]
pub struct CreateDataSourceArgs {
    pub knowledge_base_id: String,
    pub name: String,
    #[serde(alias = "bucket_arn")]
    pub bucket_reference: String,
    #[schemars(description = "Only S3 is supported")]
    pub source_type: Option<String>,
    pub description: Option<String>,
    #[schemars(description = "Comma-separated key prefixes to include")]
    pub inclusion_prefixes: Option<String>,
    #[serde(flatten)]
    pub ingestion: IngestionArgs,
}

impl From<CreateDataSourceArgs> for CreateDataSourceInput {
    fn from(args: CreateDataSourceArgs) -> Self {
        Self {
            knowledge_base_id: args.knowledge_base_id,
            name: args.name,
            bucket_reference: args.bucket_reference,
            source_type: args.source_type,
            description: args.description,
            inclusion_prefixes: args.inclusion_prefixes,
            ingestion: args.ingestion.into(),
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct StartIngestionJobArgs {
    pub knowledge_base_id: String,
    pub data_source_id: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetIngestionJobArgs {
    pub knowledge_base_id: String,
    pub data_source_id: String,
    pub ingestion_job_id: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(description = "Parameters for querying a knowledge base")]
pub struct RetrieveArgs {
    pub knowledge_base_id: String,
    /// Natural language query
    pub query: String,
    #[schemars(description = "Number of passages to return, 1-100")]
    pub number_of_results: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UploadDocumentArgs {
    /// Path of the file on this machine
    pub local_path: String,
    pub bucket_name: String,
    /// Destination object key
    pub key: String,
    #[schemars(description = "MIME type; guessed from the file extension when omitted")]
    pub content_type: Option<String>,
}

impl From<UploadDocumentArgs> for UploadDocumentInput {
    fn from(args: UploadDocumentArgs) -> Self {
        Self {
            local_path: args.local_path,
            bucket_name: args.bucket_name,
            key: args.key,
            content_type: args.content_type,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDocumentsArgs {
    pub bucket_name: String,
    pub prefix: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateBucketArgs {
    pub bucket_name: String,
    #[schemars(description = "Region for the bucket; defaults to the server region")]
    pub region: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
#[schemars(description = "Parameters for creating a Bedrock knowledge base service role")]
pub struct CreateRoleArgs {
    pub role_name: String,
    pub description: Option<String>,
    #[schemars(description = "Maximum session duration in seconds, 3600-43200")]
    pub max_session_duration: Option<i64>,
}

impl From<CreateRoleArgs> for CreateRoleInput {
    fn from(args: CreateRoleArgs) -> Self {
        Self {
            role_name: args.role_name,
            description: args.description,
            max_session_duration: args.max_session_duration,
        }
    }
}
