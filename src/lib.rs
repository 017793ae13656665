//! polaris-rag - Embedding-backed vector store for retrieval pipelines
//!
//! This is the convenience wrapper crate that re-exports the polaris-rag core.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! polaris-rag = "0.1"
//! ```
//!
//! ```no_run
//! use polaris_rag::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), RagError> {
//! let embedder = Arc::new(OllamaProvider::default());
//! let store = VectorStore::from_texts(
//!     ["Rust is a systems language", "Paris is in France"],
//!     embedder,
//!     None,
//!     StoreOptions::new(),
//! )
//! .await?;
//!
//! let docs = store.similarity_search("Which language?", 1).await?;
//! # Ok(())
//! # }
//! ```

// Re-export core
pub use polaris_rag_core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use polaris_rag_core::rag::{
        Document, Embedder, Filter, Metadata, Metric, RagError, SearchReport, StoreOptions, VectorStore,
    };
    pub use polaris_rag_core::{Config, OllamaProvider};
}
