//! AWS SDK backed implementations of the domain seams

mod convert;
mod error;
mod gateway;
mod identity;
mod marshal;
mod retry;
mod sdk;

pub use error::remote_error;
pub use gateway::AwsKnowledgeBaseGateway;
pub use identity::StsIdentityResolver;
pub use retry::{BackoffMode, RetryPolicy, build_retry_config};
pub use sdk::{has_explicit_credentials, load_sdk_config};
