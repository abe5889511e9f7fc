//! Semantic cache domain models and traits
//!
//! Resolves prompts from an exact-match store first, then from near-duplicate
//! prompts in the similarity index, and only then from the generation backend.

mod config;
mod generator;
mod resolution;

pub use config::SemanticCacheConfig;
pub use generator::{FnGenerator, GeneratedResponse, ResponseGenerator};
pub use resolution::{CacheStats, Resolution, ResolutionSource, SweepSummary};

#[cfg(test)]
pub use generator::mock::MockResponseGenerator;
