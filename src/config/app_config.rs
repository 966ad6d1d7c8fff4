use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::domain::Locale;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub aws: AwsSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub errors: ErrorsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AwsSettings {
    /// Active region, drives ARN partition derivation
    #[serde(default = "default_region")]
    pub region: String,
    /// Named profile from the shared credentials file
    #[serde(default)]
    pub profile: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// One of DEBUG, INFO, WARNING, ERROR, CRITICAL
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub structured: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorsConfig {
    #[serde(default)]
    pub locale: Locale,
}

/// Log verbosity accepted from the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warn",
            Self::Error | Self::Critical => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            other => Err(format!(
                "invalid log level '{}', expected DEBUG, INFO, WARNING, ERROR or CRITICAL",
                other
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        };
        f.write_str(name)
    }
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: default_region(),
            profile: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            structured: false,
        }
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_level() -> String {
    LogLevel::default().to_string()
}

/// Interpret a boolean toggle the way shell users write it
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Load configuration, reading the well-known AWS and logging variables
    /// through `env`
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self, config::ConfigError> {
        let region = env("AWS_REGION")
            .or_else(|| env("AWS_DEFAULT_REGION"))
            .filter(|r| !r.trim().is_empty());
        let structured = env("FASTMCP_STRUCTURED_LOG").map(|v| parse_flag(&v));

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("BEDROCK_KB")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("aws.region", region)?
            .set_override_option("aws.profile", env("AWS_PROFILE"))?
            .set_override_option("logging.level", env("FASTMCP_LOG_LEVEL"))?
            .set_override_option("logging.structured", structured)?
            .build()?;

        config.try_deserialize()
    }

    /// Resolved log level; falls back to INFO when the configured value is invalid
    pub fn log_level(&self) -> Result<LogLevel, String> {
        self.logging.level.parse()
    }
}
