//! Domain configuration to Bedrock Agent request types

use aws_sdk_bedrockagent::types::{
    BedrockDataAutomationConfiguration, BedrockFoundationModelConfiguration,
    ChunkingConfiguration as SdkChunkingConfiguration, ChunkingStrategy as SdkChunkingStrategy,
    DataSourceConfiguration, DataSourceType, FixedSizeChunkingConfiguration,
    HierarchicalChunkingConfiguration, HierarchicalChunkingLevelConfiguration,
    KnowledgeBaseConfiguration, KnowledgeBaseStorageType, KnowledgeBaseType,
    ParsingConfiguration as SdkParsingConfiguration, ParsingModality as SdkParsingModality,
    ParsingPrompt, ParsingStrategy as SdkParsingStrategy, S3DataSourceConfiguration, S3Location,
    S3VectorsConfiguration, SemanticChunkingConfiguration, StorageConfiguration as SdkStorage,
    SupplementalDataStorageConfiguration, SupplementalDataStorageLocation,
    SupplementalDataStorageLocationType, VectorIngestionConfiguration as SdkVectorIngestion,
    VectorKnowledgeBaseConfiguration,
};

use super::error::build_error;
use crate::domain::DomainError;
use crate::domain::ingestion::{
    ChunkingConfiguration, ParsingConfiguration, ParsingModality, VectorIngestionConfiguration,
};
use crate::domain::knowledge_base::StorageConfiguration;

/// Storage and knowledge-base configuration for CreateKnowledgeBase
pub fn knowledge_base_settings(
    storage: &StorageConfiguration,
    embedding_model_arn: Option<&str>,
) -> Result<(SdkStorage, Option<KnowledgeBaseConfiguration>), DomainError> {
    match storage {
        StorageConfiguration::S3 { bucket_arn } => {
            let storage = SdkStorage::builder()
                .r#type(KnowledgeBaseStorageType::from("S3"))
                .build()
                .map_err(build_error)?;

            let model = embedding_model_arn.ok_or_else(|| {
                DomainError::validation("embedding_model_arn is required to carry the S3 bucket")
            })?;
            let knowledge_base = vector_configuration(model, Some(&bucket_uri(bucket_arn)?))?;

            Ok((storage, Some(knowledge_base)))
        }
        StorageConfiguration::S3Vectors {
            vector_bucket_arn,
            index_name,
            multimodal_storage_uri,
        } => {
            let model = embedding_model_arn.ok_or_else(|| {
                DomainError::validation("embedding_model_arn is required for S3_VECTORS storage")
            })?;

            let vectors = S3VectorsConfiguration::builder()
                .vector_bucket_arn(vector_bucket_arn)
                .set_index_name(index_name.clone())
                .build();

            let storage = SdkStorage::builder()
                .r#type(KnowledgeBaseStorageType::from("S3_VECTORS"))
                .s3_vectors_configuration(vectors)
                .build()
                .map_err(build_error)?;

            let knowledge_base = vector_configuration(model, multimodal_storage_uri.as_deref())?;

            Ok((storage, Some(knowledge_base)))
        }
    }
}

fn vector_configuration(
    embedding_model_arn: &str,
    supplemental_uri: Option<&str>,
) -> Result<KnowledgeBaseConfiguration, DomainError> {
    let supplemental = supplemental_uri
        .map(|uri| -> Result<_, DomainError> {
            let location = SupplementalDataStorageLocation::builder()
                .r#type(SupplementalDataStorageLocationType::S3)
                .s3_location(S3Location::builder().uri(uri).build().map_err(build_error)?)
                .build()
                .map_err(build_error)?;

            SupplementalDataStorageConfiguration::builder()
                .storage_locations(location)
                .build()
                .map_err(build_error)
        })
        .transpose()?;

    let vector = VectorKnowledgeBaseConfiguration::builder()
        .embedding_model_arn(embedding_model_arn)
        .set_supplemental_data_storage_configuration(supplemental)
        .build()
        .map_err(build_error)?;

    KnowledgeBaseConfiguration::builder()
        .r#type(KnowledgeBaseType::Vector)
        .vector_knowledge_base_configuration(vector)
        .build()
        .map_err(build_error)
}

/// `arn:<partition>:s3:::<bucket>` to `s3://<bucket>`
fn bucket_uri(bucket_arn: &str) -> Result<String, DomainError> {
    bucket_arn
        .rsplit_once(":::")
        .map(|(_, bucket)| format!("s3://{}", bucket))
        .ok_or_else(|| DomainError::invalid_reference(bucket_arn, "not an S3 bucket ARN"))
}

/// S3 data source configuration with optional inclusion prefixes
pub fn data_source_configuration(
    bucket_arn: &str,
    inclusion_prefixes: &[String],
) -> Result<DataSourceConfiguration, DomainError> {
    let prefixes = (!inclusion_prefixes.is_empty()).then(|| inclusion_prefixes.to_vec());

    let s3 = S3DataSourceConfiguration::builder()
        .bucket_arn(bucket_arn)
        .set_inclusion_prefixes(prefixes)
        .build()
        .map_err(build_error)?;

    DataSourceConfiguration::builder()
        .r#type(DataSourceType::S3)
        .s3_configuration(s3)
        .build()
        .map_err(build_error)
}

pub fn vector_ingestion(
    config: &VectorIngestionConfiguration,
) -> Result<SdkVectorIngestion, DomainError> {
    let parsing = parsing_configuration(&config.parsing)?;
    let chunking = config
        .chunking
        .as_ref()
        .map(chunking_configuration)
        .transpose()?;

    Ok(SdkVectorIngestion::builder()
        .set_parsing_configuration(parsing)
        .set_chunking_configuration(chunking)
        .build())
}

/// `None` keeps the service default parser
fn parsing_configuration(
    parsing: &ParsingConfiguration,
) -> Result<Option<SdkParsingConfiguration>, DomainError> {
    let configuration = match parsing {
        ParsingConfiguration::None => return Ok(None),
        ParsingConfiguration::FoundationModel {
            model_arn,
            modality,
            prompt_text,
        } => {
            let prompt = prompt_text
                .as_ref()
                .map(|text| {
                    ParsingPrompt::builder()
                        .parsing_prompt_text(text)
                        .build()
                        .map_err(build_error)
                })
                .transpose()?;

            let model = BedrockFoundationModelConfiguration::builder()
                .model_arn(model_arn)
                .set_parsing_prompt(prompt)
                .set_parsing_modality(modality_of(*modality))
                .build()
                .map_err(build_error)?;

            SdkParsingConfiguration::builder()
                .parsing_strategy(SdkParsingStrategy::BedrockFoundationModel)
                .bedrock_foundation_model_configuration(model)
                .build()
        }
        ParsingConfiguration::DataAutomation { modality } => {
            let automation = BedrockDataAutomationConfiguration::builder()
                .set_parsing_modality(modality_of(*modality))
                .build();

            SdkParsingConfiguration::builder()
                .parsing_strategy(SdkParsingStrategy::from("BEDROCK_DATA_AUTOMATION"))
                .bedrock_data_automation_configuration(automation)
                .build()
        }
    };

    configuration.map(Some).map_err(build_error)
}

/// Text is the service default and is not sent
fn modality_of(modality: ParsingModality) -> Option<SdkParsingModality> {
    match modality {
        ParsingModality::Text => None,
        ParsingModality::Multimodal => Some(SdkParsingModality::from("MULTIMODAL")),
    }
}

fn chunking_configuration(
    chunking: &ChunkingConfiguration,
) -> Result<SdkChunkingConfiguration, DomainError> {
    let builder = match chunking {
        ChunkingConfiguration::None => {
            SdkChunkingConfiguration::builder().chunking_strategy(SdkChunkingStrategy::from("NONE"))
        }
        ChunkingConfiguration::FixedSize {
            max_tokens,
            overlap_percentage,
        } => {
            let fixed = FixedSizeChunkingConfiguration::builder()
                .max_tokens(to_i32(*max_tokens)?)
                .overlap_percentage(to_i32(*overlap_percentage)?)
                .build()
                .map_err(build_error)?;

            SdkChunkingConfiguration::builder()
                .chunking_strategy(SdkChunkingStrategy::from("FIXED_SIZE"))
                .fixed_size_chunking_configuration(fixed)
        }
        ChunkingConfiguration::Hierarchical {
            parent_max_tokens,
            child_max_tokens,
            overlap_tokens,
        } => {
            let mut hierarchical = HierarchicalChunkingConfiguration::builder();
            for max_tokens in [parent_max_tokens, child_max_tokens] {
                let level = HierarchicalChunkingLevelConfiguration::builder()
                    .max_tokens(to_i32(*max_tokens)?)
                    .build()
                    .map_err(build_error)?;
                hierarchical = hierarchical.level_configurations(level);
            }

            let hierarchical = hierarchical
                .overlap_tokens(to_i32(*overlap_tokens)?)
                .build()
                .map_err(build_error)?;

            SdkChunkingConfiguration::builder()
                .chunking_strategy(SdkChunkingStrategy::from("HIERARCHICAL"))
                .hierarchical_chunking_configuration(hierarchical)
        }
        ChunkingConfiguration::Semantic {
            max_tokens,
            buffer_size,
            breakpoint_percentile_threshold,
        } => {
            let semantic = SemanticChunkingConfiguration::builder()
                .max_tokens(to_i32(*max_tokens)?)
                .buffer_size(to_i32(*buffer_size)?)
                .breakpoint_percentile_threshold(to_i32(*breakpoint_percentile_threshold)?)
                .build()
                .map_err(build_error)?;

            SdkChunkingConfiguration::builder()
                .chunking_strategy(SdkChunkingStrategy::from("SEMANTIC"))
                .semantic_chunking_configuration(semantic)
        }
    };

    builder.build().map_err(build_error)
}

fn to_i32(value: u32) -> Result<i32, DomainError> {
    i32::try_from(value)
        .map_err(|_| DomainError::validation(format!("value {} is out of range", value)))
}
