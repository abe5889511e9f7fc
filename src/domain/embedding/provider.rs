//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use crate::domain::DomainError;

/// Trait for text-to-vector embedding collaborators
///
/// Failures are reported as `DomainError::Embedding`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Embed several texts, preserving input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());

        for text in texts {
            vectors.push(self.embed(text).await?);
        }

        Ok(vectors)
    }

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the embedding dimensions, when known up front
    fn dimensions(&self) -> Option<usize>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        dimensions: usize,
        vectors: HashMap<String, Vec<f32>>,
        error: Option<String>,
        calls: AtomicUsize,
    }

    impl MockEmbeddingProvider {
        pub fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                vectors: HashMap::new(),
                error: None,
                calls: AtomicUsize::new(0),
            }
        }

        /// Return a fixed vector for an exact input text
        pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
            self.vectors.insert(text.into(), vector);
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.error {
                return Err(DomainError::embedding(error));
            }

            if let Some(vector) = self.vectors.get(text) {
                return Ok(vector.clone());
            }

            // Deterministic mock embedding based on text hash
            let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_add(b as u64));
            Ok((0..self.dimensions)
                .map(|i| ((hash.wrapping_add(i as u64) % 1000) as f32 / 1000.0) - 0.5)
                .collect())
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }

        fn dimensions(&self) -> Option<usize> {
            Some(self.dimensions)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_provider_fixed_vector() {
            let provider = MockEmbeddingProvider::new(2).with_vector("hello", vec![1.0, 0.0]);

            let vector = provider.embed("hello").await.unwrap();

            assert_eq!(vector, vec![1.0, 0.0]);
            assert_eq!(provider.calls(), 1);
        }

        #[tokio::test]
        async fn test_mock_provider_batch_preserves_order() {
            let provider = MockEmbeddingProvider::new(2)
                .with_vector("a", vec![1.0, 0.0])
                .with_vector("b", vec![0.0, 1.0]);

            let vectors = provider
                .embed_batch(&["b".to_string(), "a".to_string()])
                .await
                .unwrap();

            assert_eq!(vectors, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
        }

        #[tokio::test]
        async fn test_mock_provider_error() {
            let provider = MockEmbeddingProvider::new(8).with_error("model not loaded");

            let result = provider.embed("Hello").await;

            assert!(matches!(result, Err(DomainError::Embedding { .. })));
        }

        #[tokio::test]
        async fn test_deterministic_embeddings() {
            let provider = MockEmbeddingProvider::new(16);

            let first = provider.embed("Hello").await.unwrap();
            let second = provider.embed("Hello").await.unwrap();

            assert_eq!(first, second);
            assert_eq!(first.len(), 16);
        }
    }
}
