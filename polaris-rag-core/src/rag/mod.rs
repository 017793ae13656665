//! Embedding-backed vector store for retrieval pipelines.
//!
//! This module exposes a vector index through the interface a
//! retrieval-augmented generation pipeline expects: add texts, get back the
//! most similar texts for a query.
//!
//! # Architecture
//!
//! - [`VectorStore`]: orchestrates embedding, id allocation, backend dispatch and
//!   joining search hits back to documents
//! - [`Embedder`]: converts text to vectors (see [`crate::provider`] for Ollama)
//! - [`Backend`]: either an ephemeral [`MemoryIndex`] or a reopenable
//!   [`DurableCollection`], chosen once at construction
//! - [`DocumentStore`]: in-process id → [`Document`] table owned by the store
//!
//! # How It Works
//!
//! 1. **Ingest**: texts are embedded in one batch call. Each text gets the next
//!    id, is stored in the document store, and its vector is inserted into the
//!    backend under the same id. Durable backends are flushed once per batch.
//! 2. **Query**: the query is embedded with a single call, the backend returns
//!    `(id, score)` pairs, and each id is joined with its stored document.
//!    A [`Filter`] narrows the candidates to documents whose metadata matches.
//!
//! # Document persistence
//!
//! Only vectors are durable. Documents live in memory, so a store reopened on
//! an existing collection finds hits whose documents it does not know. Those
//! hits are dropped from joined results and reported in
//! [`SearchReport::dropped`].

mod document_store;
mod durable_store;
mod embedder;
mod filter;
mod memory_store;
mod metric;
mod options;
mod store;
mod types;

pub use document_store::DocumentStore;
pub use durable_store::DurableCollection;
pub use embedder::{Embedder, EmbedderError};
pub use filter::{FieldFilter, Filter};
pub use memory_store::MemoryIndex;
pub use metric::{Metric, ParseMetricError};
pub use options::StoreOptions;
pub use store::{Backend, IndexError, VectorIndex};
pub use types::{Document, DocumentId, Metadata, SearchReport};

use crate::config::Config;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Text embedded once at construction to discover the vector dimension.
const PROBE_TEXT: &str = "test";

#[derive(Debug, Error)]
pub enum RagError {
    /// Stored and requested configuration disagree, or parallel inputs differ in length.
    #[error("Configuration mismatch: {0}")]
    ConfigMismatch(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbedderError),

    #[error("Backend failed: {0}")]
    Backend(IndexError),
}

impl From<IndexError> for RagError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::ConfigMismatch(message) => RagError::ConfigMismatch(message),
            err @ (IndexError::EmptyVector
            | IndexError::DimensionMismatch { .. }
            | IndexError::NonFinite { .. }) => {
                RagError::InvalidArgument(err.to_string())
            }
            other => RagError::Backend(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, RagError>;

struct StoreState {
    documents: DocumentStore,
    backend: Backend,
}

impl StoreState {
    /// Joins backend hits with stored documents, keeping backend order.
    fn join(&self, hits: Vec<(DocumentId, f32)>) -> SearchReport {
        let mut matches = Vec::with_capacity(hits.len());
        let mut dropped = Vec::new();
        for &(id, score) in &hits {
            match self.documents.get(id) {
                Some(document) => matches.push((document.clone(), score)),
                None => dropped.push(id),
            }
        }
        SearchReport {
            hits,
            matches,
            dropped,
        }
    }
}

/// A vector store that keeps texts and their embeddings consistent.
///
/// Each store exclusively owns one [`Backend`] and one [`DocumentStore`]. The
/// dimension and metric are fixed at construction.
///
/// # Concurrency
///
/// Ids, documents and backend vectors change together under one write lock,
/// so a search never sees an id in the backend without its document. Searches
/// share a read lock and run concurrently. Embedder calls happen before any
/// lock is taken.
///
/// # Partial failures
///
/// Failures are propagated, never retried. If an [`add_texts`](Self::add_texts)
/// call fails partway, the documents and vectors already committed for earlier
/// texts of that call stay in place.
pub struct VectorStore {
    embedder: Arc<dyn Embedder>,
    metric: Metric,
    dimension: usize,
    collection_path: Option<PathBuf>,
    state: RwLock<StoreState>,
}

impl VectorStore {
    /// Creates a store, opening or creating its backend.
    ///
    /// When `options.dimension` is `None`, the embedder is called once on a
    /// probe string and the resulting vector length is used.
    ///
    /// # Errors
    ///
    /// - [`RagError::Embedding`] if the dimension probe fails
    /// - [`RagError::InvalidArgument`] if the dimension resolves to zero
    /// - [`RagError::ConfigMismatch`] if an existing collection was created with
    ///   a different dimension or metric
    /// - [`RagError::Backend`] if the collection cannot be opened
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use polaris_rag_core::{config::Config, provider::OllamaProvider};
    /// # use polaris_rag_core::rag::{StoreOptions, VectorStore};
    /// # use std::sync::Arc;
    /// # async fn example() {
    /// let embedder = Arc::new(OllamaProvider::new(&Config::default()));
    /// let options = StoreOptions::new().with_collection_path("./data/vectors");
    /// let store = VectorStore::new(embedder, options).await.unwrap();
    /// # }
    /// ```
    pub async fn new(embedder: Arc<dyn Embedder>, options: StoreOptions) -> Result<Self> {
        let dimension = match options.dimension {
            Some(dimension) => dimension,
            None => {
                let probe = embedder.embed_one(PROBE_TEXT).await?;
                debug!(embedder = embedder.name(), dimension = probe.len(), "Probed embedding dimension");
                probe.len()
            }
        };

        if dimension == 0 {
            return Err(RagError::InvalidArgument(
                "vector dimension must be positive".to_string(),
            ));
        }

        let metric = options.metric;
        let backend = match options.collection_path.clone() {
            None => Backend::open(metric, dimension, None)?,
            // Replaying a collection log is blocking file I/O.
            Some(path) => tokio::task::spawn_blocking(move || {
                Backend::open(metric, dimension, Some(path.as_path()))
            })
            .await
            .map_err(|e| RagError::Backend(IndexError::Io(std::io::Error::other(e))))??,
        };

        info!(
            backend = backend.kind(),
            dimension,
            metric = %options.metric,
            embedder = embedder.name(),
            "Vector store ready"
        );

        Ok(Self {
            embedder,
            metric: options.metric,
            dimension,
            collection_path: options.collection_path,
            state: RwLock::new(StoreState {
                documents: DocumentStore::new(),
                backend,
            }),
        })
    }

    /// Creates a store using the storage and embedding settings of `config`.
    pub async fn from_config(embedder: Arc<dyn Embedder>, config: &Config) -> Result<Self> {
        Self::new(embedder, StoreOptions::from(config)).await
    }

    /// Creates a store and ingests `texts` in a single batch.
    pub async fn from_texts<I, S>(
        texts: I,
        embedder: Arc<dyn Embedder>,
        metadatas: Option<Vec<Metadata>>,
        options: StoreOptions,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new(embedder, options).await?;
        store.add_texts(texts, metadatas).await?;
        Ok(store)
    }

    /// Creates a store and ingests `documents` in a single batch.
    pub async fn from_documents(
        documents: Vec<Document>,
        embedder: Arc<dyn Embedder>,
        options: StoreOptions,
    ) -> Result<Self> {
        let (texts, metadatas) = split_documents(documents);
        Self::from_texts(texts, embedder, Some(metadatas), options).await
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn is_durable(&self) -> bool {
        self.collection_path.is_some()
    }

    pub fn collection_path(&self) -> Option<&Path> {
        self.collection_path.as_deref()
    }

    /// Number of documents known to this store instance.
    pub async fn len(&self) -> usize {
        self.state.read().await.documents.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of vectors held by the backend, including any that survived a restart.
    pub async fn backend_len(&self) -> usize {
        self.state.read().await.backend.len()
    }

    /// Backend inserts not yet persisted. Zero after every successful
    /// [`add_texts`](Self::add_texts).
    pub async fn pending_writes(&self) -> usize {
        self.state.read().await.backend.pending()
    }

    /// Returns the document stored under `id` by this store instance.
    pub async fn get_document(&self, id: DocumentId) -> Option<Document> {
        self.state.read().await.documents.get(id).cloned()
    }

    /// Embeds and stores `texts`, returning their ids in input order.
    ///
    /// `metadatas`, when given, must have one entry per text; otherwise each
    /// text gets empty metadata. For durable backends the batch is flushed
    /// once before returning.
    ///
    /// # Errors
    ///
    /// - [`RagError::ConfigMismatch`] if `metadatas` has the wrong length; no ids
    ///   are allocated
    /// - [`RagError::Embedding`] if the embedder fails or returns the wrong
    ///   number of vectors; no ids are allocated
    /// - [`RagError::InvalidArgument`] if a vector is empty or has the wrong
    ///   dimension
    /// - [`RagError::Backend`] if an insert or the flush fails
    pub async fn add_texts<I, S>(
        &self,
        texts: I,
        metadatas: Option<Vec<Metadata>>,
    ) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let texts: Vec<String> = texts.into_iter().map(Into::into).collect();

        let metadatas = match metadatas {
            Some(metadatas) if metadatas.len() != texts.len() => {
                return Err(RagError::ConfigMismatch(format!(
                    "{} metadata entries for {} texts",
                    metadatas.len(),
                    texts.len()
                )));
            }
            Some(metadatas) => metadatas,
            None => vec![Metadata::new(); texts.len()],
        };

        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_many(&text_refs).await?;
        if embeddings.len() != texts.len() {
            return Err(EmbedderError::CountMismatch {
                expected: texts.len(),
                got: embeddings.len(),
            }
            .into());
        }

        let mut state = self.state.write().await;
        let StoreState { documents, backend } = &mut *state;

        let mut ids = Vec::with_capacity(texts.len());
        for ((content, embedding), metadata) in texts.into_iter().zip(embeddings).zip(metadatas) {
            self.check_vector(&embedding)?;
            let id = documents.insert(Document { content, metadata });
            backend.insert(id, &embedding)?;
            ids.push(id);
        }

        if backend.is_durable() {
            backend.flush()?;
        }

        debug!(
            count = ids.len(),
            first_id = ids.first().copied(),
            last_id = ids.last().copied(),
            flushed = backend.is_durable(),
            "Ingested batch"
        );

        Ok(ids.into_iter().map(|id| id.to_string()).collect())
    }

    /// Stores `documents`, preserving their content and metadata.
    pub async fn add_documents(&self, documents: Vec<Document>) -> Result<Vec<String>> {
        let (texts, metadatas) = split_documents(documents);
        self.add_texts(texts, Some(metadatas)).await
    }

    /// Searches for the `k` nearest vectors and joins them with stored documents.
    ///
    /// Scores and ordering come straight from the backend: scores are
    /// distances, lower is closer. Hits without a stored document are
    /// excluded from [`SearchReport::matches`] and listed in
    /// [`SearchReport::dropped`].
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidArgument`] if `k == 0` or the query vector is
    ///   empty, non-finite or has the wrong dimension
    /// - [`RagError::Embedding`] if the query cannot be embedded
    /// - [`RagError::Backend`] if the backend search fails
    pub async fn similarity_search_with_report(&self, query: &str, k: usize) -> Result<SearchReport> {
        self.search_report(query, k, None).await
    }

    /// Returns up to `k` `(document, score)` pairs whose metadata matches `filter`.
    ///
    /// Only documents known to this store instance can match, so a filtered
    /// search never drops hits.
    pub async fn similarity_search_with_filter(
        &self,
        query: &str,
        k: usize,
        filter: &Filter,
    ) -> Result<Vec<(Document, f32)>> {
        Ok(self.search_report(query, k, Some(filter)).await?.matches)
    }

    /// Runs one search per query, embedding all queries in a single batch call.
    ///
    /// Results are in query order. Hits without a stored document are dropped
    /// as in [`similarity_search_with_score`](Self::similarity_search_with_score).
    pub async fn similarity_search_batch(
        &self,
        queries: &[&str],
        k: usize,
    ) -> Result<Vec<Vec<(Document, f32)>>> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be at least 1".to_string()));
        }
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed_many(queries).await?;
        if embeddings.len() != queries.len() {
            return Err(EmbedderError::CountMismatch {
                expected: queries.len(),
                got: embeddings.len(),
            }
            .into());
        }
        for embedding in &embeddings {
            self.check_vector(embedding)?;
        }

        let state = self.state.read().await;
        let mut results = Vec::with_capacity(embeddings.len());
        for embedding in &embeddings {
            let hits = state.backend.search(embedding, k)?;
            results.push(state.join(hits).matches);
        }
        drop(state);

        debug!(queries = queries.len(), k, "Batch similarity search");
        Ok(results)
    }

    async fn search_report(&self, query: &str, k: usize, filter: Option<&Filter>) -> Result<SearchReport> {
        if k == 0 {
            return Err(RagError::InvalidArgument("k must be at least 1".to_string()));
        }

        let query_embedding = self.embedder.embed_one(query).await?;
        self.check_vector(&query_embedding)?;

        let state = self.state.read().await;
        let hits = match filter {
            None => state.backend.search(&query_embedding, k)?,
            Some(filter) => {
                let documents = &state.documents;
                state.backend.search_where(&query_embedding, k, &|id: DocumentId| {
                    documents
                        .get(id)
                        .is_some_and(|document| filter.matches(&document.metadata))
                })?
            }
        };
        let report = state.join(hits);
        drop(state);

        if !report.is_complete() {
            warn!(
                hits = report.hits.len(),
                dropped = report.dropped.len(),
                "Backend returned ids with no stored document"
            );
        }
        debug!(
            k,
            filtered = filter.is_some(),
            hits = report.hits.len(),
            matches = report.matches.len(),
            "Similarity search"
        );

        Ok(report)
    }

    /// Returns up to `k` `(document, score)` pairs, closest first.
    pub async fn similarity_search_with_score(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(Document, f32)>> {
        Ok(self.similarity_search_with_report(query, k).await?.matches)
    }

    /// Returns up to `k` documents, closest first.
    pub async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        Ok(self
            .similarity_search_with_score(query, k)
            .await?
            .into_iter()
            .map(|(document, _)| document)
            .collect())
    }

    fn check_vector(&self, vector: &[f32]) -> Result<()> {
        Ok(store::validate_vector(vector, self.dimension)?)
    }
}

fn split_documents(documents: Vec<Document>) -> (Vec<String>, Vec<Metadata>) {
    documents
        .into_iter()
        .map(|document| (document.content, document.metadata))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Maps each distinct character count to a one-hot vector.
    struct OneHotEmbedder {
        dimension: usize,
        batch_calls: AtomicUsize,
        single_calls: AtomicUsize,
    }

    impl OneHotEmbedder {
        fn new(dimension: usize) -> Self {
            Self {
                dimension,
                batch_calls: AtomicUsize::new(0),
                single_calls: AtomicUsize::new(0),
            }
        }

        fn vector(&self, text: &str) -> Vec<f32> {
            let mut vector = vec![0.0; self.dimension];
            vector[text.len() % self.dimension] = 1.0;
            vector
        }
    }

    #[async_trait]
    impl Embedder for OneHotEmbedder {
        async fn embed_one(&self, text: &str) -> std::result::Result<Vec<f32>, EmbedderError> {
            self.single_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector(text))
        }

        async fn embed_many(&self, texts: &[&str]) -> std::result::Result<Vec<Vec<f32>>, EmbedderError> {
            self.batch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|text| self.vector(text)).collect())
        }
    }

    #[tokio::test]
    async fn test_dimension_is_probed_once() {
        let embedder = Arc::new(OneHotEmbedder::new(5));
        let store = VectorStore::new(embedder.clone(), StoreOptions::new()).await.unwrap();

        assert_eq!(store.dimension(), 5);
        assert_eq!(embedder.single_calls.load(Ordering::SeqCst), 1);
        assert!(!store.is_durable());
    }

    #[tokio::test]
    async fn test_explicit_dimension_skips_probe() {
        let embedder = Arc::new(OneHotEmbedder::new(5));
        let store = VectorStore::new(embedder.clone(), StoreOptions::new().with_dimension(5))
            .await
            .unwrap();

        assert_eq!(store.dimension(), 5);
        assert_eq!(embedder.single_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_zero_dimension_rejected() {
        let embedder = Arc::new(OneHotEmbedder::new(5));
        let result = VectorStore::new(embedder, StoreOptions::new().with_dimension(0)).await;
        assert!(matches!(result, Err(RagError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_add_texts_embeds_in_one_batch() {
        let embedder = Arc::new(OneHotEmbedder::new(8));
        let store = VectorStore::new(embedder.clone(), StoreOptions::new().with_dimension(8))
            .await
            .unwrap();

        let ids = store.add_texts(["a", "bb", "ccc"], None).await.unwrap();

        assert_eq!(ids, vec!["0", "1", "2"]);
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.len().await, 3);
        assert_eq!(store.backend_len().await, 3);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let embedder = Arc::new(OneHotEmbedder::new(4));
        let store = VectorStore::new(embedder.clone(), StoreOptions::new().with_dimension(4))
            .await
            .unwrap();

        let ids = store.add_texts(Vec::<String>::new(), None).await.unwrap();

        assert!(ids.is_empty());
        assert_eq!(embedder.batch_calls.load(Ordering::SeqCst), 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_search_uses_single_embed_and_joins() {
        let embedder = Arc::new(OneHotEmbedder::new(8));
        let store = VectorStore::new(embedder.clone(), StoreOptions::new().with_dimension(8))
            .await
            .unwrap();
        store.add_texts(["a", "bb", "ccc"], None).await.unwrap();

        let report = store.similarity_search_with_report("xx", 2).await.unwrap();

        assert_eq!(embedder.single_calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.hits.len(), 2);
        assert_eq!(report.hits[0], (1, 0.0));
        assert_eq!(report.matches[0].0.content, "bb");
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn test_zero_k_rejected() {
        let embedder = Arc::new(OneHotEmbedder::new(4));
        let store = VectorStore::new(embedder, StoreOptions::new().with_dimension(4))
            .await
            .unwrap();

        let result = store.similarity_search("query", 0).await;
        assert!(matches!(result, Err(RagError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_invalid_argument() {
        let embedder = Arc::new(OneHotEmbedder::new(4));
        let store = VectorStore::new(embedder, StoreOptions::new().with_dimension(6))
            .await
            .unwrap();

        let result = store.add_texts(["a"], None).await;
        assert!(matches!(result, Err(RagError::InvalidArgument(_))));
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_index_error_mapping() {
        assert!(matches!(
            RagError::from(IndexError::ConfigMismatch("dim".to_string())),
            RagError::ConfigMismatch(_)
        ));
        assert!(matches!(
            RagError::from(IndexError::EmptyVector),
            RagError::InvalidArgument(_)
        ));
        assert!(matches!(
            RagError::from(IndexError::NonFinite { index: 2 }),
            RagError::InvalidArgument(_)
        ));
        assert!(matches!(
            RagError::from(IndexError::Corrupt("bad".to_string())),
            RagError::Backend(IndexError::Corrupt(_))
        ));
    }

    #[test]
    fn test_split_documents_preserves_order() {
        let (texts, metadatas) = split_documents(vec![
            Document::new("first").with_metadata("n", 1),
            Document::new("second"),
        ]);

        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(metadatas[0]["n"], 1);
        assert!(metadatas[1].is_empty());
    }
}
