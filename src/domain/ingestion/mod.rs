//! Ingestion configuration: parsing and chunking strategies assembled from
//! flat tool parameters

mod chunking;
mod parsing;

pub use chunking::{
    ChunkingConfiguration, ChunkingFields, ChunkingStrategy, assemble_chunking,
    DEFAULT_BREAKPOINT_THRESHOLD, DEFAULT_BUFFER_SIZE, DEFAULT_CHILD_MAX_TOKENS,
    DEFAULT_OVERLAP_TOKENS, DEFAULT_PARENT_MAX_TOKENS,
};
pub use parsing::{
    ParsingConfiguration, ParsingFields, ParsingModality, ParsingStrategy, assemble_parsing,
};

use serde::Serialize;

use crate::domain::DomainError;

/// Parsing and chunking settings attached to a data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VectorIngestionConfiguration {
    pub parsing: ParsingConfiguration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunking: Option<ChunkingConfiguration>,
}

/// Combine parsing and chunking into a vector ingestion configuration.
///
/// Returns `None` when both are left at the service defaults.
pub fn assemble_vector_ingestion(
    parsing: ParsingConfiguration,
    chunking: Option<ChunkingConfiguration>,
) -> Option<VectorIngestionConfiguration> {
    if parsing.is_default() && chunking.is_none() {
        return None;
    }

    Some(VectorIngestionConfiguration { parsing, chunking })
}

/// Every parsing and chunking option a tool call can carry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestionOptions {
    pub parsing_strategy: Option<String>,
    pub parsing: ParsingFields,
    pub chunking_strategy: Option<String>,
    pub chunking: ChunkingFields,
}

impl IngestionOptions {
    /// Validate and assemble the options into a vector ingestion configuration
    pub fn assemble(&self) -> Result<Option<VectorIngestionConfiguration>, DomainError> {
        let parsing = assemble_parsing(self.parsing_strategy.as_deref(), &self.parsing)?;
        let chunking = assemble_chunking(self.chunking_strategy.as_deref(), &self.chunking)?;

        Ok(assemble_vector_ingestion(parsing, chunking))
    }
}

/// Treat blank strings the same as an omitted option
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_options_yield_no_configuration() {
        let options = IngestionOptions::default();
        assert_eq!(options.assemble().unwrap(), None);
    }

    #[test]
    fn test_single_chunking_option_yields_configuration() {
        let options = IngestionOptions {
            chunking_strategy: Some("FIXED_SIZE".to_string()),
            chunking: ChunkingFields {
                max_tokens: Some(300),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = options.assemble().unwrap().unwrap();
        assert!(config.parsing.is_default());
        assert_eq!(
            config.chunking,
            Some(ChunkingConfiguration::FixedSize {
                max_tokens: 300,
                overlap_percentage: 0
            })
        );
    }

    #[test]
    fn test_single_parsing_option_yields_configuration() {
        let options = IngestionOptions {
            parsing_strategy: Some("BEDROCK_DATA_AUTOMATION".to_string()),
            ..Default::default()
        };

        let config = options.assemble().unwrap().unwrap();
        assert_eq!(
            config.parsing,
            ParsingConfiguration::DataAutomation {
                modality: ParsingModality::Text
            }
        );
        assert_eq!(config.chunking, None);
    }

    #[test]
    fn test_assemble_vector_ingestion_directly() {
        assert_eq!(assemble_vector_ingestion(ParsingConfiguration::None, None), None);
        assert!(
            assemble_vector_ingestion(ParsingConfiguration::None, Some(ChunkingConfiguration::None))
                .is_some()
        );
    }

    #[test]
    fn test_errors_propagate() {
        let options = IngestionOptions {
            chunking_strategy: Some("FIXED_SIZE".to_string()),
            chunking: ChunkingFields {
                max_tokens: Some(300),
                overlap_percentage: Some(100),
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(matches!(
            options.assemble(),
            Err(DomainError::Validation { .. })
        ));
    }

    #[test]
    fn test_serialized_shape() {
        let config = VectorIngestionConfiguration {
            parsing: ParsingConfiguration::None,
            chunking: Some(ChunkingConfiguration::FixedSize {
                max_tokens: 300,
                overlap_percentage: 20,
            }),
        };

        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            serde_json::json!({
                "parsing": { "strategy": "NONE" },
                "chunking": { "strategy": "FIXED_SIZE", "max_tokens": 300, "overlap_percentage": 20 }
            })
        );
    }
}
