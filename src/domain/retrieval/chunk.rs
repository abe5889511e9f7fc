//! Document chunk entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Unit of ingested retrievable text; immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    chunk_id: String,
    source_document_id: String,
    chunk_index: usize,
    text: String,
    #[serde(skip_serializing)]
    #[serde(default)]
    fingerprint: Vec<f32>,
    ingested_at: DateTime<Utc>,
}

impl DocumentChunk {
    pub fn new(
        source_document_id: impl Into<String>,
        chunk_index: usize,
        text: impl Into<String>,
        fingerprint: Vec<f32>,
        ingested_at: DateTime<Utc>,
    ) -> Self {
        let source_document_id = source_document_id.into();

        Self {
            chunk_id: Self::chunk_id_for(&source_document_id, chunk_index),
            source_document_id,
            chunk_index,
            text: text.into(),
            fingerprint,
            ingested_at,
        }
    }

    /// Identifier of the `index`-th chunk of a document
    pub fn chunk_id_for(document_id: &str, index: usize) -> String {
        format!("{}_chunk_{}", document_id, index)
    }

    pub fn chunk_id(&self) -> &str {
        &self.chunk_id
    }

    pub fn source_document_id(&self) -> &str {
        &self.source_document_id
    }

    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn fingerprint(&self) -> &[f32] {
        &self.fingerprint
    }

    pub fn ingested_at(&self) -> DateTime<Utc> {
        self.ingested_at
    }
}

/// A chunk returned by retrieval with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Summary of one ingested document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub document_id: String,
    pub chunk_count: usize,
    pub ingested_at: DateTime<Utc>,
}

/// Validate document ID format
pub fn validate_document_id(id: &str) -> Result<(), DomainError> {
    if id.trim().is_empty() {
        return Err(DomainError::invalid_input("document_id cannot be empty"));
    }

    if id.len() > 255 {
        return Err(DomainError::invalid_input(
            "document_id cannot exceed 255 characters",
        ));
    }

    Ok(())
}
