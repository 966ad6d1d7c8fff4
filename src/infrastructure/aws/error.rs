//! Reduction of SDK errors to remote failures

use aws_sdk_bedrockagent::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_bedrockagent::operation::RequestId;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::operation::BuildError;

use crate::domain::DomainError;

/// Reduce an SDK error to `{code, message, request_id}`.
///
/// Failures that never reached the service get a synthetic code so the
/// translator can still classify them.
pub fn remote_error<E>(operation: &str, error: SdkError<E>) -> DomainError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let request_id = error.request_id().map(str::to_string);

    let (code, message) = match &error {
        SdkError::TimeoutError(_) => (
            Some("RequestTimeout".to_string()),
            Some(DisplayErrorContext(&error).to_string()),
        ),
        SdkError::DispatchFailure(_) => (
            Some("DispatchFailure".to_string()),
            Some(DisplayErrorContext(&error).to_string()),
        ),
        SdkError::ConstructionFailure(_) => (
            Some("ConstructionFailure".to_string()),
            Some(DisplayErrorContext(&error).to_string()),
        ),
        _ => (
            error.code().map(str::to_string),
            error
                .message()
                .map(str::to_string)
                .or_else(|| Some(DisplayErrorContext(&error).to_string())),
        ),
    };

    tracing::warn!(
        operation,
        code = code.as_deref().unwrap_or("unknown"),
        request_id = request_id.as_deref().unwrap_or("-"),
        "Remote call failed"
    );

    DomainError::remote(operation, code, message, request_id)
}

/// SDK builders reject missing required members before any call is made
pub fn build_error(error: BuildError) -> DomainError {
    DomainError::validation(error.to_string())
}
