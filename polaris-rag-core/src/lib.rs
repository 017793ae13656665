//! polaris-rag-core - Vector store adapter for retrieval pipelines
//!
//! Provides the building blocks for retrieval-augmented generation:
//! - An embedding-backed vector store with ephemeral or durable backends
//! - Embedding provider abstraction (Ollama)
//! - Configuration management
//!
//! ## Primary API
//!
//! Users should interact with polaris-rag via [`VectorStore`].

// Public modules
pub mod config;
pub mod provider;
pub mod rag;

// Public exports
pub use config::{Config, ConfigError, StorageMode};
pub use rag::{
    Document, Embedder, EmbedderError, Filter, Metadata, Metric, RagError, SearchReport, StoreOptions,
    VectorStore,
};

// Provider exports
pub use provider::OllamaProvider;
