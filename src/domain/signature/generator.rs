//! Prompt signature generation

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{DefaultNormalizer, TextNormalizer};
use crate::domain::DomainError;
use crate::domain::embedding::EmbeddingProvider;

/// Identity of a prompt: exact-match token plus similarity fingerprint
///
/// Computed fresh for every request and never stored on its own. Fingerprint
/// equality is probabilistic; only `identity_token` identifies a prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptSignature {
    identity_token: String,
    fingerprint: Vec<f32>,
    source_text: String,
}

impl PromptSignature {
    /// Create a signature from already computed parts
    pub fn new(
        identity_token: impl Into<String>,
        fingerprint: Vec<f32>,
        source_text: impl Into<String>,
    ) -> Self {
        Self {
            identity_token: identity_token.into(),
            fingerprint,
            source_text: source_text.into(),
        }
    }

    pub fn identity_token(&self) -> &str {
        &self.identity_token
    }

    pub fn fingerprint(&self) -> &[f32] {
        &self.fingerprint
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }
}

/// Turns raw prompt text into a `PromptSignature`
#[derive(Debug, Clone)]
pub struct SignatureGenerator {
    normalizer: Arc<dyn TextNormalizer>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
}

impl SignatureGenerator {
    /// Create a generator using the default normalizer
    pub fn new(embedding_provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_normalizer(embedding_provider, Arc::new(DefaultNormalizer::new()))
    }

    /// Create a generator with a custom normalizer
    pub fn with_normalizer(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        normalizer: Arc<dyn TextNormalizer>,
    ) -> Self {
        Self {
            normalizer,
            embedding_provider,
        }
    }

    /// Compute the full signature (identity token and fingerprint)
    pub async fn generate(&self, text: &str) -> Result<PromptSignature, DomainError> {
        let identity_token = self.identity_token(text)?;
        let fingerprint = self.embedding_provider.embed(text.trim()).await?;

        if fingerprint.is_empty() {
            return Err(DomainError::embedding("embedding provider returned an empty vector"));
        }

        Ok(PromptSignature::new(identity_token, fingerprint, text))
    }

    /// Compute only the identity token, without calling the embedding provider
    pub fn identity_token(&self, text: &str) -> Result<String, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::invalid_input("prompt text must not be empty"));
        }

        let mut tokens = self.normalizer.normalize(text);

        if tokens.is_empty() {
            return Err(DomainError::invalid_input(
                "prompt text contains no words after normalization",
            ));
        }

        tokens.sort_unstable();

        let digest = Sha256::digest(tokens.join(" ").as_bytes());
        Ok(hex::encode(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;

    fn create_generator() -> SignatureGenerator {
        SignatureGenerator::new(Arc::new(MockEmbeddingProvider::new(8)))
    }

    #[tokio::test]
    async fn test_identity_token_is_deterministic() {
        let generator = create_generator();

        let first = generator.generate("Tell me about Rust").await.unwrap();
        let second = generator.generate("Tell me about Rust").await.unwrap();

        assert_eq!(first.identity_token(), second.identity_token());
        assert_eq!(first.identity_token().len(), 64);
    }

    #[tokio::test]
    async fn test_whitespace_and_case_variants_share_token() {
        let generator = create_generator();

        let first = generator.generate("Hello world").await.unwrap();
        let second = generator.generate("hello   world").await.unwrap();

        assert_eq!(first.identity_token(), second.identity_token());
        assert_eq!(second.source_text(), "hello   world");
    }

    #[test]
    fn test_token_ignores_word_order() {
        let generator = create_generator();

        assert_eq!(
            generator.identity_token("blue sky").unwrap(),
            generator.identity_token("sky blue").unwrap()
        );
    }

    #[test]
    fn test_different_text_different_token() {
        let generator = create_generator();

        assert_ne!(
            generator.identity_token("hello world").unwrap(),
            generator.identity_token("goodbye world").unwrap()
        );
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let generator = create_generator();

        let result = generator.generate("   ").await;
        assert!(matches!(result, Err(DomainError::InvalidInput { .. })));

        let result = generator.identity_token("...");
        assert!(matches!(result, Err(DomainError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_embedding_failure_surfaces() {
        let provider = MockEmbeddingProvider::new(8).with_error("offline");
        let generator = SignatureGenerator::new(Arc::new(provider));

        let result = generator.generate("hello").await;

        assert!(matches!(result, Err(DomainError::Embedding { .. })));
    }

    #[test]
    fn test_identity_token_skips_embedding() {
        let provider = Arc::new(MockEmbeddingProvider::new(8));
        let generator = SignatureGenerator::new(provider.clone());

        generator.identity_token("hello world").unwrap();

        assert_eq!(provider.calls(), 0);
    }
}
