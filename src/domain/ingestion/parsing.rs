//! Parsing configuration assembly

use std::str::FromStr;

use serde::Serialize;

use super::non_blank;
use crate::domain::DomainError;

/// Parsing strategy selected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsingStrategy {
    None,
    FoundationModel,
    DataAutomation,
}

impl ParsingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::FoundationModel => "BEDROCK_FOUNDATION_MODEL",
            Self::DataAutomation => "BEDROCK_DATA_AUTOMATION",
        }
    }
}

impl FromStr for ParsingStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "BEDROCK_FOUNDATION_MODEL" => Ok(Self::FoundationModel),
            "BEDROCK_DATA_AUTOMATION" => Ok(Self::DataAutomation),
            _ => Err(DomainError::unsupported_strategy("parsing", s.trim())),
        }
    }
}

/// Content modality handled by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParsingModality {
    #[default]
    Text,
    Multimodal,
}

impl FromStr for ParsingModality {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TEXT" => Ok(Self::Text),
            "MULTIMODAL" => Ok(Self::Multimodal),
            other => Err(DomainError::validation(format!(
                "parsing_modality must be MULTIMODAL or TEXT, got '{}'",
                other
            ))),
        }
    }
}

/// Flat parsing options as supplied on a tool call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsingFields {
    pub model_arn: Option<String>,
    pub modality: Option<String>,
    pub prompt_text: Option<String>,
}

impl ParsingFields {
    /// Names of the options that were actually supplied
    fn supplied(&self) -> Vec<&'static str> {
        let mut names = Vec::new();

        if non_blank(&self.model_arn).is_some() {
            names.push("parsing_model_arn");
        }
        if non_blank(&self.modality).is_some() {
            names.push("parsing_modality");
        }
        if non_blank(&self.prompt_text).is_some() {
            names.push("parsing_prompt_text");
        }

        names
    }
}

/// How documents are parsed before chunking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParsingConfiguration {
    /// Service default parser
    None,
    #[serde(rename = "BEDROCK_FOUNDATION_MODEL")]
    FoundationModel {
        model_arn: String,
        modality: ParsingModality,
        #[serde(skip_serializing_if = "Option::is_none")]
        prompt_text: Option<String>,
    },
    #[serde(rename = "BEDROCK_DATA_AUTOMATION")]
    DataAutomation { modality: ParsingModality },
}

impl ParsingConfiguration {
    pub fn is_default(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Build a parsing configuration from a strategy name and flat options.
///
/// An absent or blank strategy means the service default parser; options
/// supplied without a strategy, or options that belong to another strategy,
/// are rejected.
pub fn assemble_parsing(
    strategy: Option<&str>,
    fields: &ParsingFields,
) -> Result<ParsingConfiguration, DomainError> {
    let strategy = match strategy.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.parse::<ParsingStrategy>()?,
        None => ParsingStrategy::None,
    };

    let supplied = fields.supplied();
    let allowed: &[&str] = match strategy {
        ParsingStrategy::None => &[],
        ParsingStrategy::FoundationModel => {
            &["parsing_model_arn", "parsing_modality", "parsing_prompt_text"]
        }
        ParsingStrategy::DataAutomation => &["parsing_modality"],
    };

    if let Some(extra) = supplied.into_iter().find(|name| !allowed.contains(name)) {
        return Err(DomainError::validation(format!(
            "{} is not applicable to parsing strategy {}",
            extra,
            strategy.as_str()
        )));
    }

    let modality = match non_blank(&fields.modality) {
        Some(value) => value.parse::<ParsingModality>()?,
        None => ParsingModality::default(),
    };

    match strategy {
        ParsingStrategy::None => Ok(ParsingConfiguration::None),
        ParsingStrategy::FoundationModel => {
            let model_arn = non_blank(&fields.model_arn).ok_or_else(|| {
                DomainError::validation(
                    "parsing_model_arn is required for parsing strategy BEDROCK_FOUNDATION_MODEL",
                )
            })?;

            Ok(ParsingConfiguration::FoundationModel {
                model_arn: model_arn.to_string(),
                modality,
                prompt_text: non_blank(&fields.prompt_text).map(str::to_string),
            })
        }
        ParsingStrategy::DataAutomation => Ok(ParsingConfiguration::DataAutomation { modality }),
    }
}
