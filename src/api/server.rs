//! MCP server exposing the knowledge base tools over stdio

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    tool, tool_handler, tool_router,
    transport::stdio,
};
use serde::Serialize;
use tracing::{error, info};

use super::args::{
    CreateBucketArgs, CreateDataSourceArgs, CreateKnowledgeBaseArgs, CreateRoleArgs,
    GetIngestionJobArgs, KnowledgeBaseIdArgs, ListDocumentsArgs, RetrieveArgs,
    StartIngestionJobArgs, UpdateKnowledgeBaseArgs, UploadDocumentArgs,
};
use crate::domain::{DomainError, ErrorRecord};
use crate::infrastructure::services::KnowledgeBaseService;

pub const SERVER_NAME: &str = "bedrock-kb-mcp-server";

const INSTRUCTIONS: &str = "Manage Amazon Bedrock knowledge bases: create knowledge bases \
    and S3 data sources, run ingestion jobs, retrieve passages, and prepare the S3 buckets \
    and IAM roles they depend on. Resource references may be full ARNs or short forms such \
    as `role/<name>` and `s3://<bucket>`.";

fn success_text<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

fn failure_text(record: &ErrorRecord) -> Result<String, McpError> {
    serde_json::to_string_pretty(record).map_err(|e| McpError::internal_error(e.to_string(), None))
}

/// Knowledge base MCP server
#[derive(Clone)]
pub struct KnowledgeBaseMcpServer {
    service: Arc<KnowledgeBaseService>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for KnowledgeBaseMcpServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBaseMcpServer")
            .field("service", &self.service)
            .finish()
    }
}

impl KnowledgeBaseMcpServer {
    pub fn new(service: Arc<KnowledgeBaseService>) -> Self {
        Self {
            service,
            tool_router: Self::tool_router(),
        }
    }

    /// Serve the MCP protocol on stdin/stdout until the client disconnects
    pub async fn serve_stdio(self) -> anyhow::Result<()> {
        let running = self.serve(stdio()).await?;
        info!("MCP server ready on stdio");

        let reason = running.waiting().await?;
        info!(reason = ?reason, "MCP session ended");

        Ok(())
    }

    fn respond<T: Serialize>(
        &self,
        tool: &str,
        result: Result<T, DomainError>,
    ) -> Result<CallToolResult, McpError> {
        match result {
            Ok(value) => {
                info!(tool = %tool, "Tool call succeeded");
                Ok(CallToolResult::success(vec![Content::text(success_text(
                    &value,
                )?)]))
            }
            Err(e) => {
                let record = self.service.translate(&e);
                error!(
                    tool = %tool,
                    kind = %record.kind,
                    code = ?record.code,
                    correlation_id = ?record.correlation_id,
                    retryable = record.retryable,
                    "Tool call failed"
                );
                Ok(CallToolResult::error(vec![Content::text(failure_text(
                    &record,
                )?)]))
            }
        }
    }
}

#[tool_router]
impl KnowledgeBaseMcpServer {
    #[tool(description = "Create a Bedrock knowledge base backed by S3 or S3 Vectors storage")]
    async fn create_knowledge_base(
        &self,
        Parameters(args): Parameters<CreateKnowledgeBaseArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "create_knowledge_base", name = %args.name, "Tool invoked");
        let result = self.service.create_knowledge_base(args.into()).await;
        self.respond("create_knowledge_base", result)
    }

    #[tool(description = "List all knowledge bases in the account and region")]
    async fn list_knowledge_bases(&self) -> Result<CallToolResult, McpError> {
        info!(tool = "list_knowledge_bases", "Tool invoked");
        let result = self.service.list_knowledge_bases().await;
        self.respond("list_knowledge_bases", result)
    }

    #[tool(description = "Get the details and status of a knowledge base")]
    async fn get_knowledge_base(
        &self,
        Parameters(args): Parameters<KnowledgeBaseIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "get_knowledge_base", knowledge_base_id = %args.knowledge_base_id, "Tool invoked");
        let result = self.service.get_knowledge_base(&args.knowledge_base_id).await;
        self.respond("get_knowledge_base", result)
    }

    #[tool(description = "Update the name, description or role of a knowledge base")]
    async fn update_knowledge_base(
        &self,
        Parameters(args): Parameters<UpdateKnowledgeBaseArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "update_knowledge_base", knowledge_base_id = %args.knowledge_base_id, "Tool invoked");
        let result = self.service.update_knowledge_base(args.into()).await;
        self.respond("update_knowledge_base", result)
    }

    #[tool(description = "Attach an S3 data source to a knowledge base, with optional parsing and chunking settings")]
    async fn create_data_source(
        &self,
        Parameters(args): Parameters<CreateDataSourceArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "create_data_source", knowledge_base_id = %args.knowledge_base_id, "Tool invoked");
        let result = self.service.create_data_source(args.into()).await;
        self.respond("create_data_source", result)
    }

    #[tool(description = "List the data sources of a knowledge base")]
    async fn list_data_sources(
        &self,
        Parameters(args): Parameters<KnowledgeBaseIdArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "list_data_sources", knowledge_base_id = %args.knowledge_base_id, "Tool invoked");
        let result = self.service.list_data_sources(&args.knowledge_base_id).await;
        self.respond("list_data_sources", result)
    }

    #[tool(description = "Start an ingestion job that syncs a data source into its knowledge base")]
    async fn start_ingestion_job(
        &self,
        Parameters(args): Parameters<StartIngestionJobArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            tool = "start_ingestion_job",
            knowledge_base_id = %args.knowledge_base_id,
            data_source_id = %args.data_source_id,
            "Tool invoked"
        );
        let result = self
            .service
            .start_ingestion_job(&args.knowledge_base_id, &args.data_source_id, args.description)
            .await;
        self.respond("start_ingestion_job", result)
    }

    #[tool(description = "Get the status and document statistics of an ingestion job")]
    async fn get_ingestion_job(
        &self,
        Parameters(args): Parameters<GetIngestionJobArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(
            tool = "get_ingestion_job",
            knowledge_base_id = %args.knowledge_base_id,
            ingestion_job_id = %args.ingestion_job_id,
            "Tool invoked"
        );
        let result = self
            .service
            .get_ingestion_job(
                &args.knowledge_base_id,
                &args.data_source_id,
                &args.ingestion_job_id,
            )
            .await;
        self.respond("get_ingestion_job", result)
    }

    #[tool(description = "Retrieve the passages of a knowledge base most relevant to a query")]
    async fn retrieve(
        &self,
        Parameters(args): Parameters<RetrieveArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "retrieve", knowledge_base_id = %args.knowledge_base_id, "Tool invoked");
        let result = self
            .service
            .retrieve(&args.knowledge_base_id, &args.query, args.number_of_results)
            .await;
        self.respond("retrieve", result)
    }

    #[tool(description = "Upload a local file to an S3 bucket")]
    async fn upload_document_to_s3(
        &self,
        Parameters(args): Parameters<UploadDocumentArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "upload_document_to_s3", bucket = %args.bucket_name, key = %args.key, "Tool invoked");
        let result = self.service.upload_document(args.into()).await;
        self.respond("upload_document_to_s3", result)
    }

    #[tool(description = "List the objects in an S3 bucket, optionally under a prefix")]
    async fn list_s3_documents(
        &self,
        Parameters(args): Parameters<ListDocumentsArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "list_s3_documents", bucket = %args.bucket_name, "Tool invoked");
        let result = self
            .service
            .list_documents(&args.bucket_name, args.prefix)
            .await;
        self.respond("list_s3_documents", result)
    }

    #[tool(description = "Create a private S3 bucket for knowledge base documents")]
    async fn create_s3_bucket(
        &self,
        Parameters(args): Parameters<CreateBucketArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "create_s3_bucket", bucket = %args.bucket_name, "Tool invoked");
        let result = self
            .service
            .create_bucket(&args.bucket_name, args.region)
            .await;
        self.respond("create_s3_bucket", result)
    }

    #[tool(description = "Create an IAM service role that Bedrock can assume for knowledge bases")]
    async fn create_bedrock_kb_role(
        &self,
        Parameters(args): Parameters<CreateRoleArgs>,
    ) -> Result<CallToolResult, McpError> {
        info!(tool = "create_bedrock_kb_role", role_name = %args.role_name, "Tool invoked");
        let result = self.service.create_role(args.into()).await;
        self.respond("create_bedrock_kb_role", result)
    }
}

#[tool_handler]
impl ServerHandler for KnowledgeBaseMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
        }
    }
}
