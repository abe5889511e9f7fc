//! Flat-scan similarity index

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::DomainError;
use crate::domain::embedding::similarity_score;
use crate::domain::similarity::{
    IndexedReference, SearchParams, SimilarityIndex, SimilarityMatch, SimilarityMatches,
    VectorKind, VectorRecord, VectorRef,
};

#[derive(Debug, Default)]
struct FlatState {
    records: HashMap<VectorRef, VectorRecord>,
    next_sequence: u64,
    dimensions: Option<usize>,
}

/// Exact nearest-neighbour index scanning every stored vector
///
/// Suitable for development and small-scale deployments. Insertion is
/// incremental; a search scans the state current at call time.
#[derive(Debug, Default)]
pub struct FlatSimilarityIndex {
    state: RwLock<FlatState>,
}

impl FlatSimilarityIndex {
    /// Create an empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Dimensionality fixed by the first insert
    pub fn dimensions(&self) -> Option<usize> {
        self.state.read().ok().and_then(|state| state.dimensions)
    }
}

fn lock_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::internal(format!("Failed to acquire similarity index lock: {}", e))
}

#[async_trait]
impl SimilarityIndex for FlatSimilarityIndex {
    async fn insert(&self, fingerprint: Vec<f32>, reference: VectorRef) -> Result<(), DomainError> {
        if fingerprint.is_empty() {
            return Err(DomainError::invalid_input("fingerprint must not be empty"));
        }

        let mut state = self.state.write().map_err(lock_error)?;

        match state.dimensions {
            Some(dimensions) if dimensions != fingerprint.len() => {
                return Err(DomainError::invalid_input(format!(
                    "fingerprint has {} dimensions, index expects {}",
                    fingerprint.len(),
                    dimensions
                )));
            }
            Some(_) => {}
            None => state.dimensions = Some(fingerprint.len()),
        }

        let sequence = state.next_sequence;
        state.next_sequence += 1;
        state
            .records
            .insert(reference.clone(), VectorRecord::new(fingerprint, reference, sequence));

        Ok(())
    }

    async fn search(
        &self,
        fingerprint: &[f32],
        params: &SearchParams,
    ) -> Result<SimilarityMatches, DomainError> {
        if params.top_k == 0 {
            return Ok(SimilarityMatches::empty());
        }

        let state = self.state.read().map_err(lock_error)?;

        if let Some(dimensions) = state.dimensions {
            if dimensions != fingerprint.len() {
                return Err(DomainError::invalid_input(format!(
                    "query has {} dimensions, index expects {}",
                    fingerprint.len(),
                    dimensions
                )));
            }
        }

        let mut scored: Vec<(f32, u64, &VectorRef)> = state
            .records
            .values()
            .filter(|record| params.kind.is_none_or(|kind| record.reference.kind() == kind))
            .map(|record| {
                (
                    similarity_score(fingerprint, &record.fingerprint),
                    record.sequence,
                    &record.reference,
                )
            })
            .filter(|(score, _, _)| *score >= params.min_score)
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(&b.1))
        });
        scored.truncate(params.top_k);

        Ok(SimilarityMatches::new(
            scored
                .into_iter()
                .map(|(score, sequence, reference)| {
                    SimilarityMatch::new(reference.clone(), score).with_sequence(sequence)
                })
                .collect(),
        ))
    }

    async fn remove(&self, reference: &VectorRef) -> Result<bool, DomainError> {
        let mut state = self.state.write().map_err(lock_error)?;

        Ok(state.records.remove(reference).is_some())
    }

    async fn remove_if_sequence(
        &self,
        reference: &VectorRef,
        sequence: u64,
    ) -> Result<bool, DomainError> {
        let mut state = self.state.write().map_err(lock_error)?;

        if state
            .records
            .get(reference)
            .is_some_and(|record| record.sequence == sequence)
        {
            state.records.remove(reference);
            return Ok(true);
        }

        Ok(false)
    }

    async fn remove_document(&self, document_id: &str) -> Result<usize, DomainError> {
        let mut state = self.state.write().map_err(lock_error)?;
        let before = state.records.len();

        state
            .records
            .retain(|reference, _| reference.document_id() != Some(document_id));

        Ok(before - state.records.len())
    }

    async fn references(
        &self,
        kind: Option<VectorKind>,
    ) -> Result<Vec<IndexedReference>, DomainError> {
        let state = self.state.read().map_err(lock_error)?;

        let mut records: Vec<&VectorRecord> = state
            .records
            .values()
            .filter(|record| kind.is_none_or(|kind| record.reference.kind() == kind))
            .collect();
        records.sort_by_key(|record| record.sequence);

        Ok(records
            .into_iter()
            .map(|record| IndexedReference {
                reference: record.reference.clone(),
                sequence: record.sequence,
            })
            .collect())
    }

    async fn size(&self) -> Result<usize, DomainError> {
        let state = self.state.read().map_err(lock_error)?;

        Ok(state.records.len())
    }
}
