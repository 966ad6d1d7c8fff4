//! Infrastructure services

mod knowledge_base_service;

pub use knowledge_base_service::{
    CreateDataSourceInput, CreateKnowledgeBaseInput, CreateRoleInput, DataSourceList,
    DocumentListing, KnowledgeBaseList, KnowledgeBaseService, RetrievalResponse,
    UpdateKnowledgeBaseInput, UploadDocumentInput,
};
