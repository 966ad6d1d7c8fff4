use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sts::Client as StsClient;

use super::error::remote_error;
use crate::domain::{DomainError, IdentityResolver};

/// Resolves the caller's account through STS GetCallerIdentity
#[derive(Debug, Clone)]
pub struct StsIdentityResolver {
    client: StsClient,
}

impl StsIdentityResolver {
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: StsClient::new(sdk_config),
        }
    }
}

#[async_trait]
impl IdentityResolver for StsIdentityResolver {
    async fn resolve_account_id(&self) -> Result<String, DomainError> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| {
                DomainError::identity_resolution(remote_error("GetCallerIdentity", e).to_string())
            })?;

        output
            .account()
            .map(str::to_string)
            .ok_or_else(|| DomainError::identity_resolution("caller identity carried no account id"))
    }
}
