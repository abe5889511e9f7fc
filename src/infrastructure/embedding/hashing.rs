//! Offline feature-hashing embedder

use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::domain::DomainError;
use crate::domain::embedding::{EmbeddingProvider, l2_normalize};
use crate::domain::signature::{DefaultNormalizer, TextNormalizer};

pub const DEFAULT_HASHING_DIMENSIONS: usize = 256;

/// Deterministic embedder hashing normalized tokens into a fixed-size vector
///
/// Each token adds +1 or -1 to one bucket chosen by its SHA-256 digest; the
/// result is L2-normalized. Texts sharing tokens get a positive cosine
/// similarity, so near-duplicate prompts land close together without any
/// model server.
#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimensions: usize,
    normalizer: Arc<dyn TextNormalizer>,
}

impl HashingEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            normalizer: Arc::new(DefaultNormalizer::new()),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn TextNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn bucket(&self, token: &str) -> (usize, f32) {
        let digest = Sha256::digest(token.as_bytes());
        let raw = u64::from_be_bytes([
            digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
        ]);
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };

        ((raw % self.dimensions as u64) as usize, sign)
    }
}

impl Default for HashingEmbeddingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSIONS)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in self.normalizer.normalize(text) {
            let (index, sign) = self.bucket(&token);
            vector[index] += sign;
        }

        l2_normalize(&mut vector);
        Ok(vector)
    }

    fn provider_name(&self) -> &'static str {
        "hashing"
    }

    fn dimensions(&self) -> Option<usize> {
        Some(self.dimensions)
    }
}
