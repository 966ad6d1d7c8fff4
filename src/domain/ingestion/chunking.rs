//! Chunking configuration assembly

use std::str::FromStr;

use serde::Serialize;

use crate::domain::DomainError;

pub const DEFAULT_PARENT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_CHILD_MAX_TOKENS: u32 = 300;
pub const DEFAULT_OVERLAP_TOKENS: u32 = 60;
pub const DEFAULT_BUFFER_SIZE: u32 = 0;
pub const DEFAULT_BREAKPOINT_THRESHOLD: u32 = 95;

/// Chunking strategy selected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkingStrategy {
    None,
    FixedSize,
    Hierarchical,
    Semantic,
}

impl ChunkingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::FixedSize => "FIXED_SIZE",
            Self::Hierarchical => "HIERARCHICAL",
            Self::Semantic => "SEMANTIC",
        }
    }

    fn allowed_fields(&self) -> &'static [&'static str] {
        match self {
            Self::None => &[],
            Self::FixedSize => &["chunking_max_tokens", "chunking_overlap_percentage"],
            Self::Hierarchical => &[
                "chunking_parent_max_tokens",
                "chunking_child_max_tokens",
                "chunking_overlap_tokens",
            ],
            Self::Semantic => &[
                "chunking_max_tokens",
                "chunking_buffer_size",
                "chunking_breakpoint_threshold",
            ],
        }
    }
}

impl FromStr for ChunkingStrategy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NONE" => Ok(Self::None),
            "FIXED_SIZE" => Ok(Self::FixedSize),
            "HIERARCHICAL" => Ok(Self::Hierarchical),
            "SEMANTIC" => Ok(Self::Semantic),
            _ => Err(DomainError::unsupported_strategy("chunking", s.trim())),
        }
    }
}

/// Flat chunking options as supplied on a tool call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkingFields {
    pub max_tokens: Option<i64>,
    pub overlap_percentage: Option<i64>,
    pub parent_max_tokens: Option<i64>,
    pub child_max_tokens: Option<i64>,
    pub overlap_tokens: Option<i64>,
    pub buffer_size: Option<i64>,
    pub breakpoint_threshold: Option<i64>,
}

impl ChunkingFields {
    fn supplied(&self) -> Vec<&'static str> {
        [
            ("chunking_max_tokens", self.max_tokens),
            ("chunking_overlap_percentage", self.overlap_percentage),
            ("chunking_parent_max_tokens", self.parent_max_tokens),
            ("chunking_child_max_tokens", self.child_max_tokens),
            ("chunking_overlap_tokens", self.overlap_tokens),
            ("chunking_buffer_size", self.buffer_size),
            ("chunking_breakpoint_threshold", self.breakpoint_threshold),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|_| name))
        .collect()
    }
}

/// How parsed documents are split before embedding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChunkingConfiguration {
    /// Every document is kept as a single chunk
    None,
    FixedSize {
        max_tokens: u32,
        overlap_percentage: u32,
    },
    Hierarchical {
        parent_max_tokens: u32,
        child_max_tokens: u32,
        overlap_tokens: u32,
    },
    Semantic {
        max_tokens: u32,
        buffer_size: u32,
        breakpoint_percentile_threshold: u32,
    },
}

/// Build a chunking configuration from a strategy name and flat options.
///
/// Returns `Ok(None)` when neither a strategy nor any option was supplied,
/// leaving chunking to the service default.
pub fn assemble_chunking(
    strategy: Option<&str>,
    fields: &ChunkingFields,
) -> Result<Option<ChunkingConfiguration>, DomainError> {
    let supplied = fields.supplied();

    let strategy = match strategy.map(str::trim).filter(|s| !s.is_empty()) {
        Some(value) => value.parse::<ChunkingStrategy>()?,
        None if supplied.is_empty() => return Ok(None),
        None => {
            return Err(DomainError::validation(format!(
                "chunking_strategy is required when {} is supplied",
                supplied.join(", ")
            )));
        }
    };

    let allowed = strategy.allowed_fields();
    if let Some(extra) = supplied.into_iter().find(|name| !allowed.contains(name)) {
        return Err(DomainError::validation(format!(
            "{} is not applicable to chunking strategy {}",
            extra,
            strategy.as_str()
        )));
    }

    let config = match strategy {
        ChunkingStrategy::None => ChunkingConfiguration::None,
        ChunkingStrategy::FixedSize => {
            let max_tokens = required(fields.max_tokens, "chunking_max_tokens", strategy)?;
            let max_tokens = positive(max_tokens, "chunking_max_tokens")?;
            let overlap_percentage = fields.overlap_percentage.unwrap_or(0);

            if !(0..100).contains(&overlap_percentage) {
                return Err(DomainError::validation(format!(
                    "chunking_overlap_percentage must be in [0, 100), got {}",
                    overlap_percentage
                )));
            }

            ChunkingConfiguration::FixedSize {
                max_tokens,
                overlap_percentage: overlap_percentage as u32,
            }
        }
        ChunkingStrategy::Hierarchical => {
            let parent_max_tokens = match fields.parent_max_tokens {
                Some(value) => positive(value, "chunking_parent_max_tokens")?,
                None => DEFAULT_PARENT_MAX_TOKENS,
            };
            let child_max_tokens = match fields.child_max_tokens {
                Some(value) => positive(value, "chunking_child_max_tokens")?,
                None => DEFAULT_CHILD_MAX_TOKENS,
            };
            let overlap_tokens = match fields.overlap_tokens {
                Some(value) => non_negative(value, "chunking_overlap_tokens")?,
                None => DEFAULT_OVERLAP_TOKENS,
            };

            if child_max_tokens >= parent_max_tokens {
                return Err(DomainError::validation(format!(
                    "chunking_child_max_tokens ({}) must be smaller than chunking_parent_max_tokens ({})",
                    child_max_tokens, parent_max_tokens
                )));
            }

            ChunkingConfiguration::Hierarchical {
                parent_max_tokens,
                child_max_tokens,
                overlap_tokens,
            }
        }
        ChunkingStrategy::Semantic => {
            let max_tokens = required(fields.max_tokens, "chunking_max_tokens", strategy)?;
            let max_tokens = positive(max_tokens, "chunking_max_tokens")?;
            let buffer_size = fields.buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE as i64);
            let threshold = fields
                .breakpoint_threshold
                .unwrap_or(DEFAULT_BREAKPOINT_THRESHOLD as i64);

            if !(0..=1).contains(&buffer_size) {
                return Err(DomainError::validation(format!(
                    "chunking_buffer_size must be 0 or 1, got {}",
                    buffer_size
                )));
            }

            if !(50..=99).contains(&threshold) {
                return Err(DomainError::validation(format!(
                    "chunking_breakpoint_threshold must be in [50, 99], got {}",
                    threshold
                )));
            }

            ChunkingConfiguration::Semantic {
                max_tokens,
                buffer_size: buffer_size as u32,
                breakpoint_percentile_threshold: threshold as u32,
            }
        }
    };

    Ok(Some(config))
}

fn required(
    value: Option<i64>,
    name: &str,
    strategy: ChunkingStrategy,
) -> Result<i64, DomainError> {
    value.ok_or_else(|| {
        DomainError::validation(format!(
            "{} is required for chunking strategy {}",
            name,
            strategy.as_str()
        ))
    })
}

fn positive(value: i64, name: &str) -> Result<u32, DomainError> {
    if value <= 0 || value > i32::MAX as i64 {
        return Err(DomainError::validation(format!(
            "{} must be a positive integer, got {}",
            name, value
        )));
    }

    Ok(value as u32)
}

fn non_negative(value: i64, name: &str) -> Result<u32, DomainError> {
    if value < 0 || value > i32::MAX as i64 {
        return Err(DomainError::validation(format!(
            "{} must not be negative, got {}",
            name, value
        )));
    }

    Ok(value as u32)
}
