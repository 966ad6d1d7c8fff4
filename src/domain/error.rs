use thiserror::Error;

/// Failure reported by the remote service, reduced to the fields the
/// error translator needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    pub operation: String,
    pub code: Option<String>,
    pub message: Option<String>,
    pub request_id: Option<String>,
}

impl std::fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed with {}",
            self.operation,
            self.code.as_deref().unwrap_or("unknown error")
        )?;

        if let Some(message) = &self.message {
            write!(f, ": {}", message)?;
        }

        Ok(())
    }
}

/// Core domain errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("Identity resolution failed: {message}")]
    IdentityResolution { message: String },

    #[error("Unsupported {category} strategy: {value}")]
    UnsupportedStrategy { category: String, value: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Remote error: {0}")]
    Remote(RemoteFailure),
}

impl DomainError {
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    pub fn identity_resolution(message: impl Into<String>) -> Self {
        Self::IdentityResolution {
            message: message.into(),
        }
    }

    pub fn unsupported_strategy(category: impl Into<String>, value: impl Into<String>) -> Self {
        Self::UnsupportedStrategy {
            category: category.into(),
            value: value.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn remote(
        operation: impl Into<String>,
        code: Option<String>,
        message: Option<String>,
        request_id: Option<String>,
    ) -> Self {
        Self::Remote(RemoteFailure {
            operation: operation.into(),
            code,
            message,
            request_id,
        })
    }

    /// True when the error was raised before any remote call was issued
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Remote(_))
    }
}
