use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::rag::Metric;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for a retrieval store.
///
/// Covers the embedding provider, where vectors live, and how searches behave.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Configuration for the embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub base_url: String,
    /// Vector dimension. When absent, the store probes the embedder once at construction.
    #[serde(default)]
    pub dimension: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            base_url: "http://localhost:11434".to_string(),
            dimension: None,
        }
    }
}

/// Vector storage mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum StorageMode {
    /// In-memory index, nothing survives the process (default)
    #[default]
    Ephemeral,
    /// On-disk collection that can be reopened at `path`
    Durable { path: String },
}

/// Storage configuration for the vector backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub storage_mode: StorageMode,
    /// Distance metric, fixed for the lifetime of a store
    #[serde(default)]
    pub metric: Metric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Number of results to return from similarity searches
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    4
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `config.yaml` if it exists, otherwise use defaults.
    pub fn load_or_default() -> Self {
        Self::load("config.yaml").unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.storage_mode, StorageMode::Ephemeral);
        assert_eq!(config.metric, Metric::Cosine);
    }

    #[test]
    fn test_search_config_default() {
        assert_eq!(SearchConfig::default().top_k, 4);
    }

    #[test]
    fn test_embedding_config_defaults() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.model, "nomic-embed-text");
        assert_eq!(config.base_url, "http://localhost:11434");
        assert!(config.dimension.is_none());
    }

    #[test]
    fn test_parse_durable_config() {
        let yaml = r#"
embedding:
  model: mxbai-embed-large
  base_url: http://ollama:11434
  dimension: 1024
storage:
  storage_mode:
    mode: durable
    path: ./data/vectors
  metric: euclidean
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.embedding.dimension, Some(1024));
        assert_eq!(
            config.storage.storage_mode,
            StorageMode::Durable {
                path: "./data/vectors".to_string()
            }
        );
        assert_eq!(config.storage.metric, Metric::Euclidean);
        assert_eq!(config.search.top_k, 4);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/polaris/config.yaml");
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }

    #[test]
    fn test_load_rejects_unknown_metric() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "storage:\n  metric: manhattan\n").unwrap();

        let result = Config::load(&path);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
