//! Similarity index trait and search types

use async_trait::async_trait;

use super::{VectorKind, VectorRef};
use crate::domain::DomainError;

/// Search parameters for a nearest-neighbour query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Maximum number of matches to return
    pub top_k: usize,
    /// Minimum score (inclusive) in [0, 1]
    pub min_score: f32,
    /// Restrict matches to one kind of owner
    pub kind: Option<VectorKind>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            top_k: 1,
            min_score: 0.0,
            kind: None,
        }
    }
}

impl SearchParams {
    /// Create search params with a result limit and minimum score
    pub fn new(top_k: usize, min_score: f32) -> Self {
        Self {
            top_k,
            min_score,
            kind: None,
        }
    }

    /// Only match vectors of the given kind
    pub fn with_kind(mut self, kind: VectorKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// A single search hit
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatch {
    pub reference: VectorRef,
    /// Similarity score in [0, 1]
    pub score: f32,
    /// Insertion sequence of the matched vector
    pub sequence: u64,
}

impl SimilarityMatch {
    pub fn new(reference: VectorRef, score: f32) -> Self {
        Self {
            reference,
            score,
            sequence: 0,
        }
    }

    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// A stored reference and the insertion sequence of its current vector
///
/// Re-inserting a reference gives it a new sequence, so a sequence observed
/// earlier identifies that exact vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedReference {
    pub reference: VectorRef,
    pub sequence: u64,
}

/// Matches of one search call, best first
///
/// Finite and consumed once; a new search re-scans the current index state.
#[derive(Debug)]
pub struct SimilarityMatches {
    inner: std::vec::IntoIter<SimilarityMatch>,
}

impl SimilarityMatches {
    pub fn new(matches: Vec<SimilarityMatch>) -> Self {
        Self {
            inner: matches.into_iter(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl Iterator for SimilarityMatches {
    type Item = SimilarityMatch;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for SimilarityMatches {}

/// Approximate nearest-neighbour index over fingerprints
///
/// Supports incremental insertion; ties on score are ordered by insertion
/// time, oldest first.
#[async_trait]
pub trait SimilarityIndex: Send + Sync + std::fmt::Debug {
    /// Insert (or replace) the fingerprint for a reference
    async fn insert(&self, fingerprint: Vec<f32>, reference: VectorRef) -> Result<(), DomainError>;

    /// Search for the best matches scoring at least `params.min_score`
    async fn search(
        &self,
        fingerprint: &[f32],
        params: &SearchParams,
    ) -> Result<SimilarityMatches, DomainError>;

    /// Remove a reference, returning whether it was present
    async fn remove(&self, reference: &VectorRef) -> Result<bool, DomainError>;

    /// Remove a reference only if its vector still has the given insertion sequence
    ///
    /// A vector re-inserted after `sequence` was observed is kept.
    async fn remove_if_sequence(
        &self,
        reference: &VectorRef,
        sequence: u64,
    ) -> Result<bool, DomainError>;

    /// Remove every chunk vector of a document, returning how many were removed
    async fn remove_document(&self, document_id: &str) -> Result<usize, DomainError>;

    /// All references currently stored, oldest first, optionally restricted to one kind
    async fn references(
        &self,
        kind: Option<VectorKind>,
    ) -> Result<Vec<IndexedReference>, DomainError>;

    /// Number of stored vectors
    async fn size(&self) -> Result<usize, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_params_builder() {
        let params = SearchParams::new(5, 0.8).with_kind(VectorKind::DocumentChunk);

        assert_eq!(params.top_k, 5);
        assert!((params.min_score - 0.8).abs() < f32::EPSILON);
        assert_eq!(params.kind, Some(VectorKind::DocumentChunk));
    }

    #[test]
    fn test_matches_are_consumed_once() {
        let mut matches = SimilarityMatches::new(vec![
            SimilarityMatch::new(VectorRef::cache_entry("a"), 0.9),
            SimilarityMatch::new(VectorRef::cache_entry("b"), 0.8),
        ]);

        assert_eq!(matches.len(), 2);
        assert_eq!(matches.next().unwrap().reference, VectorRef::cache_entry("a"));
        assert_eq!(matches.next().unwrap().reference, VectorRef::cache_entry("b"));
        assert!(matches.next().is_none());
        assert_eq!(matches.len(), 0);
    }
}
