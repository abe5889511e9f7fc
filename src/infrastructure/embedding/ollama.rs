//! Ollama embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use super::HttpClientTrait;
use crate::domain::DomainError;
use crate::domain::embedding::EmbeddingProvider;
use crate::infrastructure::llm::DEFAULT_OLLAMA_BASE_URL;

/// Embedding provider backed by Ollama's `/api/embeddings` endpoint
#[derive(Debug)]
pub struct OllamaEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    base_url: String,
    model: String,
}

impl<C: HttpClientTrait> OllamaEmbeddingProvider<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self::with_base_url(client, model, DEFAULT_OLLAMA_BASE_URL)
    }

    pub fn with_base_url(client: C, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        }
    }

    fn embeddings_url(&self) -> String {
        format!("{}/api/embeddings", self.base_url)
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for OllamaEmbeddingProvider<C> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": text,
        });

        let json = self
            .client
            .post_json(&self.embeddings_url(), vec![("Content-Type", "application/json")], &body)
            .await
            .map_err(|e| DomainError::embedding(format!("Ollama embedding request failed: {}", e)))?;

        let response: OllamaEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        if response.embedding.is_empty() {
            return Err(DomainError::embedding(format!(
                "Model '{}' returned an empty embedding",
                self.model
            )));
        }

        Ok(response.embedding)
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn dimensions(&self) -> Option<usize> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::llm::{HttpClient, HttpError, MockHttpClient};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_URL: &str = "http://localhost:11434/api/embeddings";

    #[tokio::test]
    async fn test_ollama_embed() {
        let client = MockHttpClient::new()
            .with_response(TEST_URL, serde_json::json!({ "embedding": [0.1, 0.2, 0.3] }));
        let provider = OllamaEmbeddingProvider::new(client, "nomic-embed-text");

        let vector = provider.embed("hello").await.unwrap();

        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        assert_eq!(provider.provider_name(), "ollama");
    }

    #[tokio::test]
    async fn test_ollama_embed_errors_are_embedding_errors() {
        let client = MockHttpClient::new()
            .with_error(TEST_URL, HttpError::Transport("connection refused".into()));
        let provider = OllamaEmbeddingProvider::new(client, "nomic-embed-text");

        let result = provider.embed("hello").await;

        assert!(matches!(result, Err(DomainError::Embedding { .. })));
    }

    #[tokio::test]
    async fn test_ollama_empty_embedding_rejected() {
        let client =
            MockHttpClient::new().with_response(TEST_URL, serde_json::json!({ "embedding": [] }));
        let provider = OllamaEmbeddingProvider::new(client, "nomic-embed-text");

        let result = provider.embed("hello").await;

        assert!(matches!(result, Err(DomainError::Embedding { .. })));
    }

    #[tokio::test]
    async fn test_ollama_embed_against_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_json(serde_json::json!({ "model": "nomic-embed-text", "prompt": "sky" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "embedding": [1.0, 0.0] })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let provider =
            OllamaEmbeddingProvider::with_base_url(HttpClient::new(), "nomic-embed-text", server.uri());

        assert_eq!(provider.embed("sky").await.unwrap(), vec![1.0, 0.0]);
    }
}
