//! Similarity index implementations

mod flat;

pub use flat::FlatSimilarityIndex;
