//! Chunk repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::{DocumentChunk, DocumentInfo};
use crate::domain::DomainError;

/// Storage of ingested chunks, grouped by source document
#[async_trait]
pub trait ChunkRepository: Send + Sync + Debug {
    /// Atomically replace every chunk of a document, returning the old chunks
    async fn replace_document(
        &self,
        document_id: &str,
        chunks: Vec<DocumentChunk>,
    ) -> Result<Vec<DocumentChunk>, DomainError>;

    /// Get a chunk by id
    async fn get(&self, chunk_id: &str) -> Result<Option<DocumentChunk>, DomainError>;

    /// Chunks of one document, in chunk order
    async fn document_chunks(&self, document_id: &str) -> Result<Vec<DocumentChunk>, DomainError>;

    /// Delete a document, returning how many chunks were removed
    async fn delete_document(&self, document_id: &str) -> Result<usize, DomainError>;

    /// All stored documents, ordered by id
    async fn list_documents(&self) -> Result<Vec<DocumentInfo>, DomainError>;
}
