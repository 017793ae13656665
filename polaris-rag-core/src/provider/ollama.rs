//! Ollama embedding provider.
//!
//! This module provides an Ollama HTTP API client that implements the Embedder trait.

use super::types::*;
use crate::config::Config;
use crate::rag::{Embedder, EmbedderError};
use async_trait::async_trait;

type Result<T> = std::result::Result<T, EmbedderError>;

/// Ollama HTTP API provider.
///
/// Uses the `/api/embed` endpoint, which accepts either a single string or an
/// array of strings, so batch embedding is one HTTP round trip.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl OllamaProvider {
    /// Creates a new Ollama provider with the specified config.
    pub fn new(config: &Config) -> Self {
        Self::with_model(&config.embedding.base_url, &config.embedding.model)
    }

    pub fn with_model(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn embed_url(&self) -> String {
        format!("{}/api/embed", self.base_url)
    }

    async fn request(&self, input: EmbedInput) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let embed_request = EmbedRequest {
            model: self.model.clone(),
            input,
        };

        let response = self.http_client
            .post(self.embed_url())
            .json(&embed_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(EmbedderError::Api(error_text));
        }

        let embed_response = response.json::<EmbedResponse>().await?;
        check_embeddings(embed_response.embeddings, expected)
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        let config = Config::default();
        Self::new(&config)
    }
}

fn check_embeddings(embeddings: Vec<Vec<f32>>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if embeddings.is_empty() {
        return Err(EmbedderError::NoEmbeddings);
    }
    if embeddings.len() != expected {
        return Err(EmbedderError::CountMismatch {
            expected,
            got: embeddings.len(),
        });
    }
    Ok(embeddings)
}

#[async_trait]
impl Embedder for OllamaProvider {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.request(EmbedInput::One(text.to_string()))
            .await?
            .into_iter()
            .next()
            .ok_or(EmbedderError::NoEmbeddings)
    }

    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let input = EmbedInput::Many(texts.iter().map(|text| text.to_string()).collect());
        self.request(input).await
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_embedding_config() {
        let mut config = Config::default();
        config.embedding.base_url = "http://embedder:11434/".to_string();
        config.embedding.model = "mxbai-embed-large".to_string();

        let provider = OllamaProvider::new(&config);
        assert_eq!(provider.model(), "mxbai-embed-large");
        assert_eq!(provider.embed_url(), "http://embedder:11434/api/embed");
    }

    #[test]
    fn test_check_embeddings() {
        assert!(matches!(
            check_embeddings(Vec::new(), 1),
            Err(EmbedderError::NoEmbeddings)
        ));
        assert!(matches!(
            check_embeddings(vec![vec![1.0]], 2),
            Err(EmbedderError::CountMismatch { expected: 2, got: 1 })
        ));
        assert_eq!(check_embeddings(vec![vec![1.0]], 1).unwrap(), vec![vec![1.0]]);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let provider = OllamaProvider::with_model("http://127.0.0.1:9", "unused");
        assert!(provider.embed_many(&[]).await.unwrap().is_empty());
    }
}
