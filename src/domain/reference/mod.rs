//! Resource references and their normalization into fully-qualified ARNs

mod normalizer;
mod partition;

pub use normalizer::{IdentifierNormalizer, IdentityResolver};
pub use partition::Partition;

#[cfg(test)]
pub use normalizer::MockIdentityResolver;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::DomainError;

/// Pattern for S3 bucket names accepted by the normalizer
static BUCKET_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9.-]*[a-z0-9]$").unwrap());

/// Pattern for IAM role names (without path)
static ROLE_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w+=,.@-]{1,64}$").unwrap());

pub const MIN_BUCKET_NAME_LENGTH: usize = 3;
pub const MAX_BUCKET_NAME_LENGTH: usize = 63;

/// Kind of resource a reference points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// General purpose S3 bucket
    S3Bucket,
    /// S3 Vectors vector bucket
    S3VectorBucket,
    /// IAM role assumed by Bedrock
    IamRole,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S3Bucket => "S3_BUCKET",
            Self::S3VectorBucket => "S3_VECTOR_BUCKET",
            Self::IamRole => "IAM_ROLE",
        }
    }
}

/// A reference as supplied by a caller: either a full ARN or a short form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceReference {
    Arn(String),
    ShortForm(String),
}

impl ResourceReference {
    /// Classify a raw tool parameter. Surrounding whitespace is ignored.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(DomainError::invalid_reference(raw, "reference is empty"));
        }

        if trimmed.starts_with("arn:") {
            Ok(Self::Arn(trimmed.to_string()))
        } else {
            Ok(Self::ShortForm(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Arn(value) | Self::ShortForm(value) => value,
        }
    }
}

/// Validate an S3 bucket name (3-63 chars, lowercase, no `..`, not IP-shaped)
pub fn validate_bucket_name(name: &str) -> Result<(), DomainError> {
    let length = name.len();

    if !(MIN_BUCKET_NAME_LENGTH..=MAX_BUCKET_NAME_LENGTH).contains(&length) {
        return Err(DomainError::validation(format!(
            "Bucket name must be between {} and {} characters, got {}",
            MIN_BUCKET_NAME_LENGTH, MAX_BUCKET_NAME_LENGTH, length
        )));
    }

    if !BUCKET_NAME_PATTERN.is_match(name) {
        return Err(DomainError::validation(format!(
            "Bucket name '{}' may only contain lowercase letters, digits, dots and hyphens",
            name
        )));
    }

    if name.contains("..") {
        return Err(DomainError::validation(format!(
            "Bucket name '{}' must not contain consecutive dots",
            name
        )));
    }

    if name.parse::<std::net::Ipv4Addr>().is_ok() {
        return Err(DomainError::validation(format!(
            "Bucket name '{}' must not be formatted as an IP address",
            name
        )));
    }

    Ok(())
}

/// Validate an IAM role name (without path)
pub fn validate_role_name(name: &str) -> Result<(), DomainError> {
    if ROLE_NAME_PATTERN.is_match(name) {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "Role name '{}' must be 1-64 characters of letters, digits and +=,.@_-",
            name
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reference_shapes() {
        assert_eq!(
            ResourceReference::parse("  arn:aws:s3:::docs ").unwrap(),
            ResourceReference::Arn("arn:aws:s3:::docs".to_string())
        );
        assert_eq!(
            ResourceReference::parse("role/Reader").unwrap(),
            ResourceReference::ShortForm("role/Reader".to_string())
        );
    }

    #[test]
    fn test_parse_empty_reference() {
        let err = ResourceReference::parse("   ").unwrap_err();
        assert!(matches!(err, DomainError::InvalidReference { .. }));
    }

    #[test]
    fn test_bucket_name_rules() {
        assert!(validate_bucket_name("my-bucket.docs").is_ok());
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name(&"a".repeat(64)).is_err());
        assert!(validate_bucket_name("My-Bucket").is_err());
        assert!(validate_bucket_name("bucket-").is_err());
        assert!(validate_bucket_name("my..bucket").is_err());
        assert!(validate_bucket_name("192.168.0.1").is_err());
    }

    #[test]
    fn test_role_name_rules() {
        assert!(validate_role_name("AmazonBedrockExecutionRole_KB").is_ok());
        assert!(validate_role_name("svc+role=a,b.c@d-e").is_ok());
        assert!(validate_role_name("").is_err());
        assert!(validate_role_name("has space").is_err());
        assert!(validate_role_name(&"r".repeat(65)).is_err());
    }
}
