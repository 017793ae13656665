//! Shared embedders for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use polaris_rag_core::rag::{Embedder, EmbedderError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

type Result<T> = std::result::Result<T, EmbedderError>;

/// Returns fixed vectors for known texts and fails on anything else.
pub struct LookupEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    pub batch_calls: AtomicUsize,
    pub single_calls: AtomicUsize,
}

impl LookupEmbedder {
    pub fn new<'a>(entries: impl IntoIterator<Item = (&'a str, Vec<f32>)>) -> Self {
        Self {
            vectors: entries
                .into_iter()
                .map(|(text, vector)| (text.to_string(), vector))
                .collect(),
            batch_calls: AtomicUsize::new(0),
            single_calls: AtomicUsize::new(0),
        }
    }

    /// The cosine scenario corpus: three axes and one diagonal.
    pub fn axes() -> Self {
        Self::new([
            ("x", vec![1.0, 0.0, 0.0]),
            ("y", vec![0.0, 1.0, 0.0]),
            ("z", vec![0.0, 0.0, 1.0]),
            ("xy", vec![1.0, 1.0, 0.0]),
            ("near x", vec![1.0, 0.1, 0.0]),
            ("test", vec![0.5, 0.5, 0.5]),
        ])
    }

    fn lookup(&self, text: &str) -> Result<Vec<f32>> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| EmbedderError::Other(format!("no vector for '{text}'")))
    }
}

#[async_trait]
impl Embedder for LookupEmbedder {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        self.lookup(text)
    }

    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        texts.iter().map(|text| self.lookup(text)).collect()
    }

    fn name(&self) -> &str {
        "lookup"
    }
}

/// Deterministic embedder giving distinct texts distinct unit vectors.
///
/// The vector is derived from an FNV-1a hash of the text, so identical texts
/// always map to identical vectors.
pub struct HashEmbedder {
    pub dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        let mut vector = Vec::with_capacity(self.dimension);
        for i in 0..self.dimension {
            for byte in text.bytes().chain(std::iter::once(i as u8)) {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
            vector.push(((hash >> 40) as f32 / (1u64 << 24) as f32) - 0.5);
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        vector.iter().map(|x| x / norm).collect()
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector(text))
    }
}

/// Fails every call.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed_one(&self, _text: &str) -> Result<Vec<f32>> {
        Err(EmbedderError::Api("model not loaded".to_string()))
    }
}
