use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arbitrary key-value metadata attached to a [`Document`].
pub type Metadata = HashMap<String, serde_json::Value>;

/// Identifier shared between the document store and the vector backend.
pub type DocumentId = u64;

/// A piece of text and its metadata as seen by a retrieval pipeline.
///
/// Documents are immutable once stored. The embedding is not kept here; it
/// lives only in the vector backend under the same [`DocumentId`].
///
/// # Example
///
/// ```
/// # use polaris_rag_core::rag::Document;
/// let doc = Document::new("Hello world")
///     .with_metadata("source", "user_input")
///     .with_metadata("page", 3);
/// assert_eq!(doc.metadata["page"], 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Outcome of a similarity search, before and after joining with stored documents.
///
/// `hits` holds what the backend returned, in backend order. `matches` holds
/// the subset whose ids have a stored document. The two differ when the
/// document store is cold, for example after reopening a durable collection
/// in a fresh process.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    /// Raw `(id, score)` pairs from the backend. Lower scores are closer.
    pub hits: Vec<(DocumentId, f32)>,
    /// Joined `(document, score)` pairs, in the same relative order as `hits`.
    pub matches: Vec<(Document, f32)>,
    /// Ids the backend matched but for which no document is stored.
    pub dropped: Vec<DocumentId>,
}

impl SearchReport {
    /// Whether every backend hit was joined with a stored document.
    pub fn is_complete(&self) -> bool {
        self.dropped.is_empty()
    }
}
