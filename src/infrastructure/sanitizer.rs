//! Redaction of resource identifiers and credentials before they reach logs

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Replacement for every redacted span
pub const MASK: &str = "***MASKED***";

static ARN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\barn:(?:aws|aws-cn|aws-us-gov):[A-Za-z0-9-]+:[^:\s"']*:[^:\s"']*:[^\s"',}\])<>]*[^\s"',}\])<>.;:]"#,
    )
    .unwrap()
});

static ACCESS_KEY_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:AKIA|ASIA|AROA|AIDA)[A-Z0-9]{16}\b").unwrap());

static BEARER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._~+/=-]+").unwrap());

static CREDENTIAL_PAIR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\b((?:aws_secret_access_key|aws_access_key_id|aws_session_token|secret_access_key|session_token|access_key|api_key|secret|password|passwd|token|credentials?|authorization)"?\s*[:=]\s*"?)([^\s",}]+)"#,
    )
    .unwrap()
});

const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "credential",
    "credentials",
    "authorization",
    "access_key",
    "api_key",
    "aws_access_key_id",
    "aws_secret_access_key",
    "aws_session_token",
    "session_token",
    "secret_access_key",
];

/// Whether a structured field name denotes a credential
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_ascii_lowercase();

    SENSITIVE_KEYS.contains(&key.as_str())
        || key.ends_with("_token")
        || key.ends_with("_secret")
        || key.ends_with("_password")
}

/// Mask ARNs and credential-shaped spans in free text.
///
/// Idempotent: masking already-masked text returns it unchanged.
pub fn sanitize_str(input: &str) -> Cow<'_, str> {
    let mut output = Cow::Borrowed(input);

    for (pattern, replacement) in [
        (&*ARN_PATTERN, MASK.to_string()),
        (&*ACCESS_KEY_ID_PATTERN, MASK.to_string()),
        (&*BEARER_PATTERN, format!("Bearer {}", MASK)),
        (&*CREDENTIAL_PAIR_PATTERN, format!("${{1}}{}", MASK)),
    ] {
        let replaced = match pattern.replace_all(&output, replacement.as_str()) {
            Cow::Owned(replaced) => Some(replaced),
            Cow::Borrowed(_) => None,
        };

        if let Some(replaced) = replaced {
            output = Cow::Owned(replaced);
        }
    }

    output
}

/// Deep-sanitize a JSON value. Values under credential-like keys are
/// replaced wholesale; every other string is scanned with [`sanitize_str`].
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_str(s).into_owned()),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| {
                    let value = if is_sensitive_key(key) && !value.is_null() {
                        Value::String(MASK.to_string())
                    } else {
                        sanitize_value(value)
                    };
                    (key.clone(), value)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
