//! Embedding provider implementations.
//!
//! Providers implement [`Embedder`](crate::rag::Embedder) against a concrete
//! embedding backend.

mod types;
pub mod ollama;

pub use types::{EmbedInput, EmbedRequest, EmbedResponse};

pub use ollama::OllamaProvider;
