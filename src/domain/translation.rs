//! Translation of domain and remote failures into caller-facing error records

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Closed set of error kinds surfaced to tool callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidReference,
    IdentityResolutionFailed,
    UnsupportedStrategy,
    ValidationError,
    RemoteThrottled,
    RemoteNotFound,
    RemoteAccessDenied,
    RemoteConflict,
    RemoteInternal,
    RemoteUnavailable,
    RemoteQuotaExceeded,
    UnknownRemoteError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Language used for error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ja" | "ja-jp" | "ja_jp" => Ok(Self::Ja),
            "en" | "en-us" | "en_us" => Ok(Self::En),
            other => Err(format!("unsupported locale '{}'", other)),
        }
    }
}

/// Error surfaced across the tool boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    pub retryable: bool,
}

#[derive(Debug, Clone, Copy)]
struct Template {
    ja: &'static str,
    en: &'static str,
}

impl Template {
    fn render(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::Ja => self.ja,
            Locale::En => self.en,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    kind: ErrorKind,
    template: Template,
    retryable: bool,
}

const fn entry(kind: ErrorKind, ja: &'static str, en: &'static str, retryable: bool) -> Entry {
    Entry {
        kind,
        template: Template { ja, en },
        retryable,
    }
}

/// Remote error codes known to the translator. Codes are matched exactly.
static REMOTE_ERRORS: Lazy<HashMap<&'static str, Entry>> = Lazy::new(|| {
    use ErrorKind::*;

    let throttled = entry(
        RemoteThrottled,
        "リクエストが多すぎます。しばらく待ってから再試行してください",
        "Too many requests. Wait a moment and try again",
        true,
    );
    let not_found = entry(
        RemoteNotFound,
        "リソースが見つかりません",
        "The requested resource was not found",
        false,
    );
    let access_denied = entry(
        RemoteAccessDenied,
        "アクセス権限がありません",
        "Access denied",
        false,
    );
    let validation = entry(
        ValidationError,
        "入力値が無効です",
        "The request contains invalid input",
        false,
    );
    let conflict = entry(
        RemoteConflict,
        "リソースが既に存在するか、競合しています",
        "The resource already exists or is in a conflicting state",
        false,
    );
    let internal = entry(
        RemoteInternal,
        "サーバー内部エラーが発生しました",
        "The service encountered an internal error",
        true,
    );
    let unavailable = entry(
        RemoteUnavailable,
        "サービスが一時的に利用できません",
        "The service is temporarily unavailable",
        true,
    );
    let quota = entry(
        RemoteQuotaExceeded,
        "リソースの制限を超えました",
        "A service quota or limit was exceeded",
        false,
    );

    HashMap::from([
        ("ThrottlingException", throttled),
        ("Throttling", throttled),
        (
            "TooManyRequestsException",
            entry(RemoteThrottled, "リクエストが多すぎます", "Too many requests", true),
        ),
        ("RequestLimitExceeded", throttled),
        ("SlowDown", throttled),
        ("ValidationException", validation),
        (
            "InvalidParameterException",
            entry(ValidationError, "パラメータが無効です", "A parameter is invalid", false),
        ),
        (
            "InvalidRequestException",
            entry(ValidationError, "リクエストが無効です", "The request is invalid", false),
        ),
        (
            "BadRequestException",
            entry(ValidationError, "リクエストが不正です", "The request is malformed", false),
        ),
        (
            "MalformedPolicyDocument",
            entry(
                ValidationError,
                "ポリシードキュメントが不正です",
                "The policy document is malformed",
                false,
            ),
        ),
        (
            "InvalidBucketName",
            entry(ValidationError, "バケット名が無効です", "The bucket name is invalid", false),
        ),
        ("ConstructionFailure", validation),
        ("ResourceNotFoundException", not_found),
        ("NotFoundException", not_found),
        (
            "NoSuchBucket",
            entry(RemoteNotFound, "バケットが見つかりません", "The bucket does not exist", false),
        ),
        ("NoSuchKey", not_found),
        ("NoSuchEntity", not_found),
        ("AccessDeniedException", access_denied),
        ("AccessDenied", access_denied),
        (
            "ForbiddenException",
            entry(RemoteAccessDenied, "アクセスが拒否されました", "Access was refused", false),
        ),
        (
            "UnauthorizedException",
            entry(RemoteAccessDenied, "認証に失敗しました", "Authentication failed", false),
        ),
        (
            "UnrecognizedClientException",
            entry(RemoteAccessDenied, "認証に失敗しました", "Authentication failed", false),
        ),
        (
            "ExpiredTokenException",
            entry(
                RemoteAccessDenied,
                "認証情報の有効期限が切れています",
                "The credentials have expired",
                false,
            ),
        ),
        (
            "InvalidClientTokenId",
            entry(RemoteAccessDenied, "認証に失敗しました", "Authentication failed", false),
        ),
        ("ConflictException", conflict),
        (
            "ResourceInUseException",
            entry(RemoteConflict, "リソースが使用中です", "The resource is in use", false),
        ),
        ("BucketAlreadyExists", conflict),
        ("BucketAlreadyOwnedByYou", conflict),
        ("EntityAlreadyExists", conflict),
        ("InternalServerException", internal),
        ("InternalFailure", internal),
        ("InternalError", internal),
        ("ServiceFailure", internal),
        ("ServiceUnavailableException", unavailable),
        ("ServiceUnavailable", unavailable),
        ("RequestTimeout", unavailable),
        ("DispatchFailure", unavailable),
        ("ServiceQuotaExceededException", quota),
        ("LimitExceededException", quota),
        ("LimitExceeded", quota),
    ])
});

const UNKNOWN_REMOTE: Entry = entry(
    ErrorKind::UnknownRemoteError,
    "予期しないエラーが発生しました",
    "An unexpected error occurred",
    false,
);

fn local_entry(kind: ErrorKind) -> Entry {
    match kind {
        ErrorKind::InvalidReference => entry(
            kind,
            "リソース参照が無効です",
            "The resource reference is invalid",
            false,
        ),
        ErrorKind::IdentityResolutionFailed => entry(
            kind,
            "アカウントIDを解決できませんでした",
            "The caller account id could not be resolved",
            true,
        ),
        ErrorKind::UnsupportedStrategy => entry(
            kind,
            "サポートされていない戦略です",
            "The strategy is not supported",
            false,
        ),
        _ => entry(
            ErrorKind::ValidationError,
            "入力値が無効です",
            "The request contains invalid input",
            false,
        ),
    }
}

/// Maps failures onto [`ErrorRecord`]s in a fixed locale
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTranslator {
    locale: Locale,
}

impl ErrorTranslator {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Translate a remote error code. Total over every input string.
    pub fn translate(
        &self,
        code: &str,
        message: Option<&str>,
        request_id: Option<&str>,
    ) -> ErrorRecord {
        let code = code.trim();
        let entry = REMOTE_ERRORS.get(code).copied().unwrap_or(UNKNOWN_REMOTE);

        ErrorRecord {
            kind: entry.kind,
            message: entry.template.render(self.locale).to_string(),
            code: (!code.is_empty()).then(|| code.to_string()),
            details: message
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string),
            correlation_id: request_id
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
            retryable: entry.retryable,
        }
    }

    /// Translate any domain error, local or remote
    pub fn translate_error(&self, error: &DomainError) -> ErrorRecord {
        let (kind, details) = match error {
            DomainError::Remote(failure) => {
                return self.translate(
                    failure.code.as_deref().unwrap_or_default(),
                    failure.message.as_deref(),
                    failure.request_id.as_deref(),
                );
            }
            DomainError::InvalidReference { reference, reason } => (
                ErrorKind::InvalidReference,
                format!("{}: {}", reference, reason),
            ),
            DomainError::IdentityResolution { message } => {
                (ErrorKind::IdentityResolutionFailed, message.clone())
            }
            DomainError::UnsupportedStrategy { category, value } => (
                ErrorKind::UnsupportedStrategy,
                format!("{} strategy '{}'", category, value),
            ),
            DomainError::Validation { message } => (ErrorKind::ValidationError, message.clone()),
        };

        let entry = local_entry(kind);

        ErrorRecord {
            kind: entry.kind,
            message: format!("{}: {}", entry.template.render(self.locale), details),
            code: None,
            details: Some(details),
            correlation_id: None,
            retryable: entry.retryable,
        }
    }
}
