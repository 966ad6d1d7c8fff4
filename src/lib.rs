//! Bedrock knowledge base MCP server
//!
//! Exposes Amazon Bedrock knowledge base management and retrieval as MCP
//! tools, normalizing short-form resource references and translating remote
//! failures into localized error records.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::KnowledgeBaseMcpServer;
use domain::{ErrorTranslator, IdentifierNormalizer};
use infrastructure::aws::{
    AwsKnowledgeBaseGateway, StsIdentityResolver, build_retry_config, load_sdk_config,
};
use infrastructure::services::KnowledgeBaseService;

/// Wire the AWS clients, normalizer and translator into a ready MCP server
pub async fn build_server(config: &AppConfig) -> KnowledgeBaseMcpServer {
    let sdk_config = load_sdk_config(&config.aws, &build_retry_config()).await;

    let identity = Arc::new(StsIdentityResolver::new(&sdk_config));
    let normalizer = IdentifierNormalizer::new(config.aws.region.clone(), identity);
    let gateway = Arc::new(AwsKnowledgeBaseGateway::new(&sdk_config));
    let translator = ErrorTranslator::new(config.errors.locale);

    let service = KnowledgeBaseService::new(gateway, normalizer, translator);

    KnowledgeBaseMcpServer::new(Arc::new(service))
}
