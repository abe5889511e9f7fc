//! Embedding provider implementations

mod hashing;
mod ollama;

pub use hashing::{DEFAULT_HASHING_DIMENSIONS, HashingEmbeddingProvider};
pub use ollama::OllamaEmbeddingProvider;

// Re-export HTTP client for use by embedding providers
pub use super::llm::{HttpClient, HttpClientTrait};
