//! Vector backend abstraction and factory.
//!
//! This module provides a single capability interface over the two storage
//! modes: an ephemeral in-memory index and a durable on-disk collection.

use super::durable_store::DurableCollection;
use super::memory_store::MemoryIndex;
use super::metric::Metric;
use super::types::DocumentId;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by a vector backend.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("empty vector not allowed")]
    EmptyVector,

    #[error("vector component {index} is not finite")]
    NonFinite { index: usize },

    /// Existing data at a path disagrees with the requested configuration.
    #[error("configuration mismatch: {0}")]
    ConfigMismatch(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt collection: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;

/// Checks that `vector` is non-empty, has `dimension` components, and that
/// every component is finite.
pub(crate) fn validate_vector(vector: &[f32], dimension: usize) -> Result<()> {
    if vector.is_empty() {
        return Err(IndexError::EmptyVector);
    }
    if vector.len() != dimension {
        return Err(IndexError::DimensionMismatch {
            expected: dimension,
            got: vector.len(),
        });
    }
    if let Some(index) = vector.iter().position(|x| !x.is_finite()) {
        return Err(IndexError::NonFinite { index });
    }
    Ok(())
}

/// Unified interface for vector backends.
///
/// Scores returned by [`search`](VectorIndex::search) are distances under the
/// backend's [`Metric`]: lower is closer.
pub trait VectorIndex: Send + Sync {
    /// Inserts a vector, overwriting any vector already stored under `id`.
    fn insert(&mut self, id: DocumentId, vector: &[f32]) -> Result<()>;

    /// Returns up to `k` `(id, distance)` pairs, closest first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(DocumentId, f32)>> {
        self.search_where(query, k, &|_: DocumentId| true)
    }

    /// Like [`search`](VectorIndex::search), but only ids for which `accept`
    /// returns `true` are candidates. Rejected ids never take up one of the
    /// `k` slots.
    fn search_where(
        &self,
        query: &[f32],
        k: usize,
        accept: &dyn Fn(DocumentId) -> bool,
    ) -> Result<Vec<(DocumentId, f32)>>;

    /// Blocks until every prior insert is safely persisted.
    fn flush(&mut self) -> Result<()>;

    /// Number of vectors held by the backend.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn dimension(&self) -> usize;

    fn metric(&self) -> Metric;
}

/// The backend owned by a store, chosen once at construction.
pub enum Backend {
    /// In-memory only; nothing survives the owning store.
    Ephemeral(MemoryIndex),
    /// Reopenable on-disk collection rooted at `path`.
    Durable {
        collection: DurableCollection,
        path: PathBuf,
    },
}

impl Backend {
    /// Creates a backend for the given configuration.
    ///
    /// - `None` creates a fresh [`MemoryIndex`]
    /// - `Some(path)` opens or creates a [`DurableCollection`] at `path`
    pub fn open(metric: Metric, dimension: usize, path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Backend::Ephemeral(MemoryIndex::new(metric, dimension))),
            Some(path) => {
                let collection = DurableCollection::open_or_create(path, dimension, metric)?;
                Ok(Backend::Durable {
                    collection,
                    path: path.to_path_buf(),
                })
            }
        }
    }

    pub fn is_durable(&self) -> bool {
        matches!(self, Backend::Durable { .. })
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Backend::Ephemeral(_) => None,
            Backend::Durable { path, .. } => Some(path),
        }
    }

    /// Inserts accepted but not yet persisted. Always zero for ephemeral backends.
    pub fn pending(&self) -> usize {
        match self {
            Backend::Ephemeral(_) => 0,
            Backend::Durable { collection, .. } => collection.pending(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Backend::Ephemeral(_) => "ephemeral",
            Backend::Durable { .. } => "durable",
        }
    }

    fn as_index(&self) -> &dyn VectorIndex {
        match self {
            Backend::Ephemeral(index) => index,
            Backend::Durable { collection, .. } => collection,
        }
    }

    fn as_index_mut(&mut self) -> &mut dyn VectorIndex {
        match self {
            Backend::Ephemeral(index) => index,
            Backend::Durable { collection, .. } => collection,
        }
    }
}

impl VectorIndex for Backend {
    fn insert(&mut self, id: DocumentId, vector: &[f32]) -> Result<()> {
        self.as_index_mut().insert(id, vector)
    }

    fn search_where(
        &self,
        query: &[f32],
        k: usize,
        accept: &dyn Fn(DocumentId) -> bool,
    ) -> Result<Vec<(DocumentId, f32)>> {
        self.as_index().search_where(query, k, accept)
    }

    fn flush(&mut self) -> Result<()> {
        self.as_index_mut().flush()
    }

    fn len(&self) -> usize {
        self.as_index().len()
    }

    fn dimension(&self) -> usize {
        self.as_index().dimension()
    }

    fn metric(&self) -> Metric {
        self.as_index().metric()
    }
}
