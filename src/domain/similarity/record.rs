//! Vector records and their back-references

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of owner a vector belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorKind {
    CacheEntry,
    DocumentChunk,
}

/// Back-reference from a vector to its owner
///
/// A lookup relation only: the owner's lifecycle drives removal from the index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VectorRef {
    CacheEntry {
        identity_token: String,
    },
    DocumentChunk {
        chunk_id: String,
        document_id: String,
    },
}

impl VectorRef {
    pub fn cache_entry(identity_token: impl Into<String>) -> Self {
        Self::CacheEntry {
            identity_token: identity_token.into(),
        }
    }

    pub fn document_chunk(chunk_id: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self::DocumentChunk {
            chunk_id: chunk_id.into(),
            document_id: document_id.into(),
        }
    }

    pub fn kind(&self) -> VectorKind {
        match self {
            Self::CacheEntry { .. } => VectorKind::CacheEntry,
            Self::DocumentChunk { .. } => VectorKind::DocumentChunk,
        }
    }

    /// The identity token (cache entries) or chunk id (document chunks)
    pub fn identity_token(&self) -> &str {
        match self {
            Self::CacheEntry { identity_token } => identity_token,
            Self::DocumentChunk { chunk_id, .. } => chunk_id,
        }
    }

    pub fn document_id(&self) -> Option<&str> {
        match self {
            Self::CacheEntry { .. } => None,
            Self::DocumentChunk { document_id, .. } => Some(document_id),
        }
    }
}

impl fmt::Display for VectorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheEntry { identity_token } => write!(f, "cache:{}", identity_token),
            Self::DocumentChunk { chunk_id, .. } => write!(f, "chunk:{}", chunk_id),
        }
    }
}

/// A fingerprint stored in the index
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRecord {
    pub fingerprint: Vec<f32>,
    pub reference: VectorRef,
    /// Insertion sequence, used to break score ties (oldest first)
    pub sequence: u64,
}

impl VectorRecord {
    pub fn new(fingerprint: Vec<f32>, reference: VectorRef, sequence: u64) -> Self {
        Self {
            fingerprint,
            reference,
            sequence,
        }
    }

    pub fn identity_token(&self) -> &str {
        self.reference.identity_token()
    }
}
