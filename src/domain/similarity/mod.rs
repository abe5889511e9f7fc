//! Similarity index domain models and traits
//!
//! The index is shared infrastructure: it holds fingerprints of cached
//! responses and of ingested document chunks side by side.

mod index;
mod record;

pub use index::{IndexedReference, SearchParams, SimilarityIndex, SimilarityMatch, SimilarityMatches};
pub use record::{VectorKind, VectorRecord, VectorRef};
