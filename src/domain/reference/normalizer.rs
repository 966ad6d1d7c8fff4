//! Completes short-form references into canonical ARNs

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::OnceCell;

#[cfg(test)]
use mockall::automock;

use super::{Partition, ReferenceKind, ResourceReference, validate_bucket_name, validate_role_name};
use crate::domain::DomainError;

static S3_ARN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^arn:(aws|aws-cn|aws-us-gov):s3:::\S+$").unwrap());

static S3_VECTORS_ARN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^arn:(aws|aws-cn|aws-us-gov):s3vectors:[a-z0-9-]+:\d{12}:bucket/[^/\s]+$").unwrap()
});

static S3_URI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(s3|s3a|s3n)://([^/\s]+)(/.*)?$").unwrap());

static ROLE_ARN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^arn:(aws|aws-cn|aws-us-gov):iam::(\d{12}):role/(.+)$").unwrap());

static ACCOUNTLESS_ROLE_ARN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^arn:(aws|aws-cn|aws-us-gov):iam::role/(.+)$").unwrap());

static ACCOUNT_ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{12}$").unwrap());

/// Resolves the account the active credentials belong to
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Returns the 12-digit account id of the caller
    async fn resolve_account_id(&self) -> Result<String, DomainError>;
}

/// Normalizes bucket and role references for a single region.
///
/// The caller's account id is looked up lazily on the first short-form role
/// reference and kept for the lifetime of the normalizer. A failed lookup is
/// not cached.
pub struct IdentifierNormalizer {
    region: String,
    partition: Partition,
    identity: Arc<dyn IdentityResolver>,
    account_id: OnceCell<String>,
}

impl std::fmt::Debug for IdentifierNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierNormalizer")
            .field("region", &self.region)
            .field("partition", &self.partition)
            .field("account_resolved", &self.account_id.initialized())
            .finish()
    }
}

impl IdentifierNormalizer {
    pub fn new(region: impl Into<String>, identity: Arc<dyn IdentityResolver>) -> Self {
        let region = region.into();
        let partition = Partition::from_region(&region);

        Self {
            region,
            partition,
            identity,
            account_id: OnceCell::new(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn partition(&self) -> Partition {
        self.partition
    }

    /// Account id of the active credentials, resolved once on first use
    pub async fn account_id(&self) -> Result<&str, DomainError> {
        let account = self
            .account_id
            .get_or_try_init(|| async {
                let account = self.identity.resolve_account_id().await.map_err(|e| match e {
                    DomainError::IdentityResolution { .. } => e,
                    other => DomainError::identity_resolution(other.to_string()),
                })?;

                if !ACCOUNT_ID_PATTERN.is_match(&account) {
                    return Err(DomainError::identity_resolution(format!(
                        "identity service returned malformed account id '{}'",
                        account
                    )));
                }

                tracing::debug!(partition = %self.partition, "Resolved caller account id");
                Ok(account)
            })
            .await?;

        Ok(account.as_str())
    }

    /// Normalize a raw reference of the given kind into a fully-qualified ARN
    pub async fn normalize(&self, raw: &str, kind: ReferenceKind) -> Result<String, DomainError> {
        let reference = ResourceReference::parse(raw)?;

        match kind {
            ReferenceKind::S3Bucket => self.normalize_bucket(&reference),
            ReferenceKind::S3VectorBucket => self.normalize_vector_bucket(&reference).await,
            ReferenceKind::IamRole => self.normalize_role(&reference).await,
        }
    }

    fn normalize_bucket(&self, reference: &ResourceReference) -> Result<String, DomainError> {
        match reference {
            ResourceReference::Arn(arn) if S3_ARN_PATTERN.is_match(arn) => Ok(arn.clone()),
            ResourceReference::Arn(arn) => Err(DomainError::invalid_reference(
                arn,
                "expected an S3 bucket ARN (arn:<partition>:s3:::<bucket>)",
            )),
            ResourceReference::ShortForm(value) => {
                let bucket = bucket_from_uri(value)?;
                Ok(format!("arn:{}:s3:::{}", self.partition, bucket))
            }
        }
    }

    async fn normalize_vector_bucket(
        &self,
        reference: &ResourceReference,
    ) -> Result<String, DomainError> {
        match reference {
            ResourceReference::Arn(arn) if S3_VECTORS_ARN_PATTERN.is_match(arn) => Ok(arn.clone()),
            ResourceReference::Arn(arn) => Err(DomainError::invalid_reference(
                arn,
                "expected an S3 Vectors bucket ARN (arn:<partition>:s3vectors:<region>:<account>:bucket/<name>)",
            )),
            ResourceReference::ShortForm(value) => {
                let bucket = bucket_from_uri(value)?;
                let account = self.account_id().await?;

                Ok(format!(
                    "arn:{}:s3vectors:{}:{}:bucket/{}",
                    self.partition, self.region, account, bucket
                ))
            }
        }
    }

    async fn normalize_role(&self, reference: &ResourceReference) -> Result<String, DomainError> {
        let name = match reference {
            ResourceReference::Arn(arn) if ROLE_ARN_PATTERN.is_match(arn) => {
                return Ok(arn.clone());
            }
            ResourceReference::Arn(arn) => match ACCOUNTLESS_ROLE_ARN_PATTERN.captures(arn) {
                Some(caps) => caps[2].to_string(),
                None => {
                    return Err(DomainError::invalid_reference(
                        arn,
                        "expected an IAM role ARN (arn:<partition>:iam::<account>:role/<name>)",
                    ));
                }
            },
            ResourceReference::ShortForm(value) => match value.strip_prefix("role/") {
                Some(name) if name.trim().is_empty() => {
                    return Err(DomainError::invalid_reference(value, "role name is empty"));
                }
                Some(name) => {
                    validate_role_path(name).map_err(|e| match e {
                        DomainError::Validation { message } => {
                            DomainError::invalid_reference(value, message)
                        }
                        other => other,
                    })?;
                    name.to_string()
                }
                None if validate_role_name(value).is_ok() => value.clone(),
                None => {
                    return Err(DomainError::invalid_reference(
                        value,
                        "expected a role ARN, 'role/<name>' or a bare role name",
                    ));
                }
            },
        };

        let account = self.account_id().await?;
        Ok(format!("arn:{}:iam::{}:role/{}", self.partition, account, name))
    }
}

/// Checks `[path/]name`: every path segment must be non-blank and the final
/// segment must be a valid role name.
fn validate_role_path(name: &str) -> Result<(), DomainError> {
    let (path, role) = name.rsplit_once('/').unwrap_or(("", name));

    if !path.is_empty()
        && path
            .split('/')
            .any(|segment| segment.is_empty() || segment.chars().any(char::is_whitespace))
    {
        return Err(DomainError::validation(format!(
            "Role path '{}' must not contain blank segments or whitespace",
            path
        )));
    }

    validate_role_name(role)
}

fn bucket_from_uri(value: &str) -> Result<&str, DomainError> {
    let caps = S3_URI_PATTERN.captures(value).ok_or_else(|| {
        DomainError::invalid_reference(value, "expected an S3 URI (s3://<bucket>[/<path>]) or ARN")
    })?;

    let bucket = caps.get(2).map(|m| m.as_str()).unwrap_or_default();

    validate_bucket_name(bucket).map_err(|e| match e {
        DomainError::Validation { message } => DomainError::invalid_reference(value, message),
        other => other,
    })?;

    Ok(bucket)
}
