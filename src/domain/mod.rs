//! Domain layer - Core business logic and entities

pub mod error;
pub mod ingestion;
pub mod knowledge_base;
pub mod reference;
pub mod translation;

pub use error::{DomainError, RemoteFailure};
pub use ingestion::{IngestionOptions, VectorIngestionConfiguration};
pub use knowledge_base::KnowledgeBaseGateway;
pub use reference::{IdentifierNormalizer, IdentityResolver, Partition, ReferenceKind};
pub use translation::{ErrorKind, ErrorRecord, ErrorTranslator, Locale};
