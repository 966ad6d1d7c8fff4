//! Knowledge base requests and read models

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::DomainError;
use crate::domain::ingestion::VectorIngestionConfiguration;

/// Storage backend selected for a new knowledge base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageType {
    #[default]
    S3,
    S3Vectors,
}

impl StorageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S3 => "S3",
            Self::S3Vectors => "S3_VECTORS",
        }
    }
}

impl FromStr for StorageType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S3" => Ok(Self::S3),
            "S3_VECTORS" | "S3VECTORS" => Ok(Self::S3Vectors),
            other => Err(DomainError::validation(format!(
                "storage_type must be S3 or S3_VECTORS, got '{}'",
                other
            ))),
        }
    }
}

/// Storage configuration with every reference already normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfiguration {
    S3 {
        bucket_arn: String,
    },
    S3Vectors {
        vector_bucket_arn: String,
        index_name: Option<String>,
        multimodal_storage_uri: Option<String>,
    },
}

impl StorageConfiguration {
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::S3 { .. } => StorageType::S3,
            Self::S3Vectors { .. } => StorageType::S3Vectors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateKnowledgeBaseRequest {
    pub name: String,
    pub description: Option<String>,
    pub role_arn: String,
    pub storage: StorageConfiguration,
    pub embedding_model_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateKnowledgeBaseRequest {
    pub knowledge_base_id: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub role_arn: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDataSourceRequest {
    pub knowledge_base_id: String,
    pub name: String,
    pub description: Option<String>,
    pub bucket_arn: String,
    pub inclusion_prefixes: Vec<String>,
    pub vector_ingestion: Option<VectorIngestionConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartIngestionJobRequest {
    pub knowledge_base_id: String,
    pub data_source_id: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrieveRequest {
    pub knowledge_base_id: String,
    pub query: String,
    /// `None` leaves the result count to the service default
    pub number_of_results: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadObjectRequest {
    pub local_path: PathBuf,
    pub bucket: String,
    pub key: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBucketRequest {
    pub bucket_name: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateRoleRequest {
    pub role_name: String,
    pub path: String,
    pub description: Option<String>,
    pub max_session_duration: i32,
    pub trust_policy: serde_json::Value,
}

/// Knowledge base as reported by the service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeBaseDescriptor {
    pub knowledge_base_id: String,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failure_reasons: Vec<String>,
}

/// Data source as reported by the service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSourceDescriptor {
    pub data_source_id: String,
    pub knowledge_base_id: String,
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Document counters of an ingestion job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionJobStatistics {
    pub documents_scanned: i64,
    pub metadata_documents_scanned: i64,
    pub new_documents_indexed: i64,
    pub modified_documents_indexed: i64,
    pub documents_deleted: i64,
    pub documents_failed: i64,
}

/// Ingestion job as reported by the service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionJobDescriptor {
    pub ingestion_job_id: String,
    pub knowledge_base_id: String,
    pub data_source_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<IngestionJobStatistics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failure_reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// One ranked passage returned by a retrieval query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedPassage {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_type: Option<String>,
    #[serde(skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct S3ObjectDescriptor {
    pub key: String,
    pub size: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadConfirmation {
    pub s3_uri: String,
    pub bucket: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketDescriptor {
    pub bucket_name: String,
    pub region: String,
    pub arn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDescriptor {
    pub role_name: String,
    pub role_arn: String,
    pub path: String,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_type_parsing() {
        assert_eq!("s3".parse::<StorageType>().unwrap(), StorageType::S3);
        assert_eq!(
            "S3_VECTORS".parse::<StorageType>().unwrap(),
            StorageType::S3Vectors
        );
        assert!(matches!(
            "OPENSEARCH".parse::<StorageType>(),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn test_descriptor_skips_empty_fields() {
        let descriptor = KnowledgeBaseDescriptor {
            knowledge_base_id: "KB123".to_string(),
            name: "docs".to_string(),
            status: "CREATING".to_string(),
            arn: None,
            description: None,
            role_arn: None,
            created_at: None,
            updated_at: None,
            failure_reasons: vec![],
        };

        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            serde_json::json!({
                "knowledge_base_id": "KB123",
                "name": "docs",
                "status": "CREATING"
            })
        );
    }
}
