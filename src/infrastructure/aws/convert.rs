//! SDK output types to domain read models

use aws_sdk_bedrockagent::types::{
    DataSource, DataSourceSummary, IngestionJob, KnowledgeBase, KnowledgeBaseSummary,
};
use aws_sdk_bedrockagentruntime::types::KnowledgeBaseRetrievalResult;
use aws_sdk_s3::types::Object;
use aws_smithy_types::date_time::Format;
use aws_smithy_types::{DateTime, Document as SmithyDocument};

use crate::domain::knowledge_base::{
    DataSourceDescriptor, IngestionJobDescriptor, IngestionJobStatistics,
    KnowledgeBaseDescriptor, RetrievedPassage, S3ObjectDescriptor,
};

/// RFC 3339 rendering of an SDK timestamp
pub fn timestamp(value: &DateTime) -> Option<String> {
    value.fmt(Format::DateTime).ok()
}

pub fn knowledge_base(kb: &KnowledgeBase) -> KnowledgeBaseDescriptor {
    KnowledgeBaseDescriptor {
        knowledge_base_id: kb.knowledge_base_id().to_string(),
        name: kb.name().to_string(),
        status: kb.status().as_str().to_string(),
        arn: Some(kb.knowledge_base_arn().to_string()).filter(|a| !a.is_empty()),
        description: kb.description().map(str::to_string),
        role_arn: Some(kb.role_arn().to_string()).filter(|a| !a.is_empty()),
        created_at: timestamp(kb.created_at()),
        updated_at: timestamp(kb.updated_at()),
        failure_reasons: kb.failure_reasons().to_vec(),
    }
}

pub fn knowledge_base_summary(summary: &KnowledgeBaseSummary) -> KnowledgeBaseDescriptor {
    KnowledgeBaseDescriptor {
        knowledge_base_id: summary.knowledge_base_id().to_string(),
        name: summary.name().to_string(),
        status: summary.status().as_str().to_string(),
        arn: None,
        description: summary.description().map(str::to_string),
        role_arn: None,
        created_at: None,
        updated_at: timestamp(summary.updated_at()),
        failure_reasons: vec![],
    }
}

pub fn data_source(ds: &DataSource) -> DataSourceDescriptor {
    DataSourceDescriptor {
        data_source_id: ds.data_source_id().to_string(),
        knowledge_base_id: ds.knowledge_base_id().to_string(),
        name: ds.name().to_string(),
        status: ds.status().as_str().to_string(),
        description: ds.description().map(str::to_string),
        created_at: timestamp(ds.created_at()),
        updated_at: timestamp(ds.updated_at()),
    }
}

pub fn data_source_summary(summary: &DataSourceSummary) -> DataSourceDescriptor {
    DataSourceDescriptor {
        data_source_id: summary.data_source_id().to_string(),
        knowledge_base_id: summary.knowledge_base_id().to_string(),
        name: summary.name().to_string(),
        status: summary.status().as_str().to_string(),
        description: summary.description().map(str::to_string),
        created_at: None,
        updated_at: timestamp(summary.updated_at()),
    }
}

pub fn ingestion_job(job: &IngestionJob) -> IngestionJobDescriptor {
    let statistics = job.statistics().map(|s| IngestionJobStatistics {
        documents_scanned: s.number_of_documents_scanned(),
        metadata_documents_scanned: s.number_of_metadata_documents_scanned(),
        new_documents_indexed: s.number_of_new_documents_indexed(),
        modified_documents_indexed: s.number_of_modified_documents_indexed(),
        documents_deleted: s.number_of_documents_deleted(),
        documents_failed: s.number_of_documents_failed(),
    });

    IngestionJobDescriptor {
        ingestion_job_id: job.ingestion_job_id().to_string(),
        knowledge_base_id: job.knowledge_base_id().to_string(),
        data_source_id: job.data_source_id().to_string(),
        status: job.status().as_str().to_string(),
        statistics,
        failure_reasons: job.failure_reasons().to_vec(),
        started_at: timestamp(job.started_at()),
        updated_at: timestamp(job.updated_at()),
    }
}

/// Results without text content are skipped
pub fn retrieved_passage(result: &KnowledgeBaseRetrievalResult) -> Option<RetrievedPassage> {
    let content = result.content()?;
    let text: Option<&str> = content.text().into();

    let location = result.location();
    let uri = location.and_then(|l| {
        l.s3_location()
            .and_then(|s3| s3.uri())
            .or_else(|| l.web_location().and_then(|web| web.url()))
    });

    let metadata = result
        .metadata()
        .map(|metadata| {
            metadata
                .iter()
                .filter_map(|(key, doc)| doc_to_json(doc).map(|value| (key.clone(), value)))
                .collect()
        })
        .unwrap_or_default();

    Some(RetrievedPassage {
        content: text?.to_string(),
        score: result.score(),
        location: uri.map(str::to_string),
        location_type: location.map(|l| l.r#type().as_str().to_string()),
        metadata,
    })
}

pub fn s3_object(object: &Object) -> Option<S3ObjectDescriptor> {
    Some(S3ObjectDescriptor {
        key: object.key()?.to_string(),
        size: object.size().unwrap_or_default(),
        last_modified: object.last_modified().and_then(timestamp),
    })
}

/// Convert AWS Smithy Document to serde_json::Value
pub fn doc_to_json(doc: &SmithyDocument) -> Option<serde_json::Value> {
    match doc {
        SmithyDocument::String(s) => Some(serde_json::Value::String(s.clone())),
        SmithyDocument::Number(n) => serde_json::Number::from_f64(n.to_f64_lossy())
            .map(serde_json::Value::Number),
        SmithyDocument::Bool(b) => Some(serde_json::Value::Bool(*b)),
        SmithyDocument::Null => Some(serde_json::Value::Null),
        SmithyDocument::Array(items) => Some(serde_json::Value::Array(
            items.iter().filter_map(doc_to_json).collect(),
        )),
        SmithyDocument::Object(fields) => Some(serde_json::Value::Object(
            fields
                .iter()
                .filter_map(|(k, v)| doc_to_json(v).map(|value| (k.clone(), value)))
                .collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aws_sdk_bedrockagent::types::{IngestionJobStatus, KnowledgeBaseStatus};
    use aws_smithy_types::Number;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_timestamp_is_rfc3339() {
        let value = DateTime::from_secs(1_700_000_000);
        assert_eq!(timestamp(&value).as_deref(), Some("2023-11-14T22:13:20Z"));
    }

    #[test]
    fn test_knowledge_base_summary() {
        let summary = KnowledgeBaseSummary::builder()
            .knowledge_base_id("KB123")
            .name("docs")
            .status(KnowledgeBaseStatus::Active)
            .updated_at(DateTime::from_secs(0))
            .build()
            .unwrap();

        let descriptor = knowledge_base_summary(&summary);

        assert_eq!(descriptor.knowledge_base_id, "KB123");
        assert_eq!(descriptor.status, "ACTIVE");
        assert_eq!(descriptor.updated_at.as_deref(), Some("1970-01-01T00:00:00Z"));
        assert_eq!(descriptor.description, None);
    }

    #[test]
    fn test_ingestion_job_statistics() {
        let job = IngestionJob::builder()
            .knowledge_base_id("KB1")
            .data_source_id("DS1")
            .ingestion_job_id("JOB1")
            .status(IngestionJobStatus::Complete)
            .statistics(
                aws_sdk_bedrockagent::types::IngestionJobStatistics::builder()
                    .number_of_documents_scanned(12)
                    .number_of_new_documents_indexed(10)
                    .number_of_documents_failed(2)
                    .build(),
            )
            .started_at(DateTime::from_secs(0))
            .updated_at(DateTime::from_secs(60))
            .build()
            .unwrap();

        let descriptor = ingestion_job(&job);

        assert_eq!(descriptor.status, "COMPLETE");
        let statistics = descriptor.statistics.unwrap();
        assert_eq!(statistics.documents_scanned, 12);
        assert_eq!(statistics.new_documents_indexed, 10);
        assert_eq!(statistics.documents_failed, 2);
        assert_eq!(statistics.documents_deleted, 0);
    }

    #[test]
    fn test_object_without_key_is_skipped() {
        assert!(s3_object(&Object::builder().size(10).build()).is_none());

        let object = s3_object(&Object::builder().key("docs/a.pdf").size(10).build()).unwrap();
        assert_eq!(object.key, "docs/a.pdf");
        assert_eq!(object.size, 10);
    }

    #[test]
    fn test_doc_to_json_nested() {
        let mut fields = HashMap::new();
        fields.insert("flag".to_string(), SmithyDocument::Bool(true));
        fields.insert(
            "tags".to_string(),
            SmithyDocument::Array(vec![SmithyDocument::String("a".to_string())]),
        );

        assert_eq!(
            doc_to_json(&SmithyDocument::Object(fields)),
            Some(json!({ "flag": true, "tags": ["a"] }))
        );
        assert_eq!(
            doc_to_json(&SmithyDocument::Number(Number::Float(f64::NAN))),
            None
        );
    }
}
