//! Embedding abstraction.
//!
//! An [`Embedder`] turns text into fixed-dimension vectors. The store calls
//! [`Embedder::embed_many`] once per ingested batch and [`Embedder::embed_one`]
//! once per query.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during embedding generation.
#[derive(Debug, Error)]
pub enum EmbedderError {
    /// The HTTP request to the embedding provider failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider response could not be decoded.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider API returned an error.
    #[error("API error: {0}")]
    Api(String),

    /// The API response contained no embeddings.
    #[error("No embeddings returned")]
    NoEmbeddings,

    /// A batch call returned a different number of vectors than inputs.
    #[error("Expected {expected} embeddings, got {got}")]
    CountMismatch { expected: usize, got: usize },

    #[error("Embedder error: {0}")]
    Other(String),
}

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, EmbedderError>;

/// Converts text into vector embeddings.
///
/// Implementations must return vectors of the same dimension from both
/// methods for the lifetime of the embedder. Calls may block on network I/O.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a single text, typically a query.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds a batch of texts, preserving input order.
    ///
    /// The default implementation calls [`embed_one`](Embedder::embed_one)
    /// sequentially. Providers with a native batch endpoint should override it.
    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_one(text).await?);
        }
        Ok(embeddings)
    }

    /// Short label used in logs.
    fn name(&self) -> &str {
        "embedder"
    }
}
