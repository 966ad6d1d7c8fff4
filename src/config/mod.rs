//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AwsSettings, ErrorsConfig, LogLevel, LoggingConfig, DEFAULT_REGION, parse_flag,
};
