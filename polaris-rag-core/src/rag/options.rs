use super::metric::Metric;
use crate::config::{Config, StorageMode};
use std::path::PathBuf;

/// Construction options for a [`VectorStore`](super::VectorStore).
///
/// Defaults to an ephemeral cosine store whose dimension is probed from the
/// embedder.
///
/// # Example
///
/// ```
/// # use polaris_rag_core::rag::{Metric, StoreOptions};
/// let options = StoreOptions::new()
///     .with_metric(Metric::Euclidean)
///     .with_dimension(384)
///     .with_collection_path("./data/vectors");
/// assert!(options.collection_path.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreOptions {
    pub metric: Metric,
    /// Explicit vector dimension; probed through the embedder when `None`.
    pub dimension: Option<usize>,
    /// Durable collection directory; ephemeral when `None`.
    pub collection_path: Option<PathBuf>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    pub fn with_collection_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.collection_path = Some(path.into());
        self
    }
}

impl From<&Config> for StoreOptions {
    fn from(config: &Config) -> Self {
        let collection_path = match &config.storage.storage_mode {
            StorageMode::Ephemeral => None,
            StorageMode::Durable { path } => Some(PathBuf::from(path)),
        };
        Self {
            metric: config.storage.metric,
            dimension: config.embedding.dimension,
            collection_path,
        }
    }
}
