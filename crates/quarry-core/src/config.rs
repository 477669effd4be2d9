//! Configuration for the Quarry engine.
//!
//! All tunables are carried in one [`CorpusConfig`] passed explicitly at
//! engine construction; there is no ambient global state. The struct can
//! be deserialized from a YAML file for deployments that keep retrieval
//! settings in configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::QuarryError;

// ============================================================================
// Chunker configuration
// ============================================================================

/// Chunker configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkerConfig {
    /// Target chunk size in characters.
    /// Default: 1000
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap carried from the end of one chunk into the next, in
    /// characters. Default: 200
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Minimum viable chunk size in characters; smaller buffers are
    /// dropped. Default: 100
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_min_chunk_size() -> usize {
    100
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_size: default_min_chunk_size(),
        }
    }
}

// ============================================================================
// Lexical (BM25) configuration
// ============================================================================

/// Lexical scoring parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LexicalConfig {
    /// Term frequency saturation parameter.
    /// Default: 1.5
    #[serde(default = "default_k1")]
    pub k1: f32,

    /// Document length normalization parameter.
    /// 0 = no normalization, 1 = full normalization.
    /// Default: 0.75
    #[serde(default = "default_b")]
    pub b: f32,
}

fn default_k1() -> f32 {
    1.5
}

fn default_b() -> f32 {
    0.75
}

impl Default for LexicalConfig {
    fn default() -> Self {
        Self {
            k1: default_k1(),
            b: default_b(),
        }
    }
}

// ============================================================================
// Fusion weights
// ============================================================================

/// Weights for combining semantic and lexical scores into a hybrid score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionWeights {
    /// Weight for the dense (semantic) score.
    /// Default: 0.7
    #[serde(default = "default_semantic_weight")]
    pub semantic: f32,

    /// Weight for the lexical (keyword) score.
    /// Default: 0.3
    #[serde(default = "default_lexical_weight")]
    pub lexical: f32,
}

fn default_semantic_weight() -> f32 {
    0.7
}

fn default_lexical_weight() -> f32 {
    0.3
}

impl Default for FusionWeights {
    fn default() -> Self {
        Self {
            semantic: default_semantic_weight(),
            lexical: default_lexical_weight(),
        }
    }
}

// ============================================================================
// Corpus configuration
// ============================================================================

/// Top-level configuration for a corpus engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusConfig {
    /// Embedding dimension agreed with the embedder at index creation.
    /// Default: 384
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Default number of results returned by searches.
    /// Default: 5
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Chunker settings.
    #[serde(default)]
    pub chunker: ChunkerConfig,

    /// Lexical scoring settings.
    #[serde(default)]
    pub lexical: LexicalConfig,

    /// Hybrid fusion weights.
    #[serde(default)]
    pub fusion: FusionWeights,
}

fn default_dimension() -> usize {
    384
}

fn default_top_k() -> usize {
    5
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            default_top_k: default_top_k(),
            chunker: ChunkerConfig::default(),
            lexical: LexicalConfig::default(),
            fusion: FusionWeights::default(),
        }
    }
}

impl CorpusConfig {
    /// Load a configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self, QuarryError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the configuration, returning warnings for questionable
    /// values.
    ///
    /// # Errors
    /// Returns an error if:
    /// - `dimension` is 0
    /// - `chunkSize` is 0 or `minChunkSize` exceeds it
    /// - `chunkOverlap` is not smaller than `chunkSize`
    /// - lexical `k1` or `b` is negative, or `b` exceeds 1
    /// - a fusion weight is negative
    ///
    /// # Warnings
    /// - Fusion weights don't sum to 1.0 (informational only, still valid)
    /// - Overlap larger than half the chunk size (heavy duplication)
    pub fn validate(&self) -> Result<Vec<String>, QuarryError> {
        let mut warnings = Vec::new();

        if self.dimension == 0 {
            return Err(QuarryError::InvalidConfiguration {
                message: "dimension must be positive".to_string(),
                hint: "Set dimension to the embedder's output size (e.g., 384)".to_string(),
            });
        }

        if self.chunker.chunk_size == 0 {
            return Err(QuarryError::InvalidConfiguration {
                message: "chunker.chunkSize must be positive".to_string(),
                hint: "Set chunkSize to a positive value (recommended: 1000)".to_string(),
            });
        }
        if self.chunker.min_chunk_size > self.chunker.chunk_size {
            return Err(QuarryError::InvalidConfiguration {
                message: "chunker.minChunkSize cannot exceed chunkSize".to_string(),
                hint: "Lower minChunkSize or raise chunkSize".to_string(),
            });
        }
        if self.chunker.chunk_overlap >= self.chunker.chunk_size {
            return Err(QuarryError::InvalidConfiguration {
                message: "chunker.chunkOverlap must be smaller than chunkSize".to_string(),
                hint: "Set chunkOverlap below chunkSize (recommended: 200)".to_string(),
            });
        }

        if self.lexical.k1 < 0.0 {
            return Err(QuarryError::InvalidConfiguration {
                message: "lexical.k1 cannot be negative".to_string(),
                hint: "Set k1 to a non-negative value (recommended: 1.5)".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.lexical.b) {
            return Err(QuarryError::InvalidConfiguration {
                message: "lexical.b must be between 0 and 1".to_string(),
                hint: "Set b within [0, 1] (recommended: 0.75)".to_string(),
            });
        }

        if self.fusion.semantic < 0.0 {
            return Err(QuarryError::InvalidConfiguration {
                message: "fusion.semantic cannot be negative".to_string(),
                hint: "Set fusion.semantic to 0.0 or higher (recommended: 0.7)".to_string(),
            });
        }
        if self.fusion.lexical < 0.0 {
            return Err(QuarryError::InvalidConfiguration {
                message: "fusion.lexical cannot be negative".to_string(),
                hint: "Set fusion.lexical to 0.0 or higher (recommended: 0.3)".to_string(),
            });
        }

        let weight_sum = self.fusion.semantic + self.fusion.lexical;
        if (weight_sum - 1.0).abs() > 0.01 {
            warnings.push(format!(
                "fusion weights sum to {} (semantic={}, lexical={}); weights summing to 1.0 \
                 are recommended",
                weight_sum, self.fusion.semantic, self.fusion.lexical
            ));
        }

        if self.chunker.chunk_overlap > self.chunker.chunk_size / 2 {
            warnings.push(format!(
                "chunkOverlap={} is more than half of chunkSize={}; consecutive chunks will \
                 be mostly duplicated text",
                self.chunker.chunk_overlap, self.chunker.chunk_size
            ));
        }

        Ok(warnings)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CorpusConfig::default();
        assert_eq!(config.dimension, 384);
        assert_eq!(config.default_top_k, 5);
        assert_eq!(config.chunker.chunk_size, 1000);
        assert_eq!(config.chunker.chunk_overlap, 200);
        assert_eq!(config.chunker.min_chunk_size, 100);
        assert!((config.lexical.k1 - 1.5).abs() < 0.001);
        assert!((config.lexical.b - 0.75).abs() < 0.001);
        assert!((config.fusion.semantic - 0.7).abs() < 0.001);
        assert!((config.fusion.lexical - 0.3).abs() < 0.001);
    }

    #[test]
    fn test_default_is_valid() {
        let warnings = CorpusConfig::default().validate().unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_validate_zero_dimension() {
        let config = CorpusConfig {
            dimension: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_overlap_must_be_below_chunk_size() {
        let mut config = CorpusConfig::default();
        config.chunker.chunk_overlap = config.chunker.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_negative_weight() {
        let mut config = CorpusConfig::default();
        config.fusion.lexical = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_weights_not_summing_to_one_warns() {
        let mut config = CorpusConfig::default();
        config.fusion.semantic = 0.4;
        config.fusion.lexical = 0.4;
        let warnings = config.validate().unwrap();
        assert!(!warnings.is_empty());
        assert!(warnings[0].contains("sum"));
    }

    #[test]
    fn test_yaml_roundtrip_with_partial_file() {
        let yaml = "dimension: 8\nchunker:\n  chunkSize: 64\n";
        let config: CorpusConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.dimension, 8);
        assert_eq!(config.chunker.chunk_size, 64);
        // Untouched fields fall back to defaults.
        assert_eq!(config.chunker.chunk_overlap, 200);
        assert_eq!(config.default_top_k, 5);
    }
}
