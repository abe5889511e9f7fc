//! Domain layer - Core business logic and entities

pub mod cache;
pub mod embedding;
pub mod error;
pub mod heuristics;
pub mod retrieval;
pub mod semantic_cache;
pub mod signature;
pub mod similarity;

pub use cache::{CacheEntry, CacheStore};
pub use embedding::EmbeddingProvider;
pub use error::DomainError;
pub use heuristics::{
    Eligibility, EligibilityPolicy, GenerationOutcome, HeuristicRecord, HeuristicsTracker,
    SignatureSummary,
};
pub use retrieval::{
    ChunkRepository, ChunkingConfig, ChunkingStrategy, DocumentChunk, DocumentInfo,
    RetrievedChunk, TextChunk,
};
pub use semantic_cache::{
    CacheStats, FnGenerator, GeneratedResponse, Resolution, ResolutionSource, ResponseGenerator,
    SemanticCacheConfig, SweepSummary,
};
pub use signature::{DefaultNormalizer, PromptSignature, SignatureGenerator, TextNormalizer};
pub use similarity::{
    SearchParams, SimilarityIndex, SimilarityMatch, SimilarityMatches, VectorKind, VectorRecord,
    VectorRef,
};
