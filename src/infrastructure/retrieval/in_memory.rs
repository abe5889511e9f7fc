//! In-memory chunk repository

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::DomainError;
use crate::domain::retrieval::{ChunkRepository, DocumentChunk, DocumentInfo};

#[derive(Debug, Default)]
struct ChunkState {
    chunks: HashMap<String, DocumentChunk>,
    /// Chunk ids per document, in chunk order
    documents: BTreeMap<String, Vec<String>>,
}

impl ChunkState {
    fn remove_document(&mut self, document_id: &str) -> Vec<DocumentChunk> {
        self.documents
            .remove(document_id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|chunk_id| self.chunks.remove(&chunk_id))
            .collect()
    }
}

/// Chunk repository kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryChunkRepository {
    state: RwLock<ChunkState>,
}

impl InMemoryChunkRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> DomainError {
    DomainError::internal(format!("Failed to acquire chunk repository lock: {}", e))
}

#[async_trait]
impl ChunkRepository for InMemoryChunkRepository {
    async fn replace_document(
        &self,
        document_id: &str,
        mut chunks: Vec<DocumentChunk>,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        if let Some(foreign) = chunks
            .iter()
            .find(|chunk| chunk.source_document_id() != document_id)
        {
            return Err(DomainError::invalid_input(format!(
                "chunk '{}' does not belong to document '{}'",
                foreign.chunk_id(),
                document_id
            )));
        }

        chunks.sort_by_key(|chunk| chunk.chunk_index());

        let mut state = self.state.write().map_err(lock_error)?;
        let previous = state.remove_document(document_id);

        if !chunks.is_empty() {
            let ids = chunks.iter().map(|chunk| chunk.chunk_id().to_string()).collect();
            state.documents.insert(document_id.to_string(), ids);

            for chunk in chunks {
                state.chunks.insert(chunk.chunk_id().to_string(), chunk);
            }
        }

        Ok(previous)
    }

    async fn get(&self, chunk_id: &str) -> Result<Option<DocumentChunk>, DomainError> {
        let state = self.state.read().map_err(lock_error)?;

        Ok(state.chunks.get(chunk_id).cloned())
    }

    async fn document_chunks(&self, document_id: &str) -> Result<Vec<DocumentChunk>, DomainError> {
        let state = self.state.read().map_err(lock_error)?;

        Ok(state
            .documents
            .get(document_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.chunks.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_document(&self, document_id: &str) -> Result<usize, DomainError> {
        let mut state = self.state.write().map_err(lock_error)?;

        Ok(state.remove_document(document_id).len())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentInfo>, DomainError> {
        let state = self.state.read().map_err(lock_error)?;

        Ok(state
            .documents
            .iter()
            .filter_map(|(document_id, ids)| {
                let ingested_at = ids
                    .first()
                    .and_then(|id| state.chunks.get(id))
                    .map(|chunk| chunk.ingested_at())?;

                Some(DocumentInfo {
                    document_id: document_id.clone(),
                    chunk_count: ids.len(),
                    ingested_at,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn chunk(document_id: &str, index: usize, text: &str) -> DocumentChunk {
        DocumentChunk::new(document_id, index, text, vec![1.0, 0.0], Utc::now())
    }

    #[tokio::test]
    async fn test_replace_and_get() {
        let repo = InMemoryChunkRepository::new();

        let previous = repo
            .replace_document("doc1", vec![chunk("doc1", 1, "b"), chunk("doc1", 0, "a")])
            .await
            .unwrap();

        assert!(previous.is_empty());
        assert_eq!(repo.get("doc1_chunk_0").await.unwrap().unwrap().text(), "a");

        let texts: Vec<_> = repo
            .document_chunks("doc1")
            .await
            .unwrap()
            .iter()
            .map(|c| c.text().to_string())
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_replace_returns_previous_chunks() {
        let repo = InMemoryChunkRepository::new();

        repo.replace_document("doc1", vec![chunk("doc1", 0, "a"), chunk("doc1", 1, "b")])
            .await
            .unwrap();

        let previous = repo
            .replace_document("doc1", vec![chunk("doc1", 0, "new")])
            .await
            .unwrap();

        assert_eq!(previous.len(), 2);
        assert!(repo.get("doc1_chunk_1").await.unwrap().is_none());
        assert_eq!(repo.get("doc1_chunk_0").await.unwrap().unwrap().text(), "new");
    }

    #[tokio::test]
    async fn test_foreign_chunk_rejected() {
        let repo = InMemoryChunkRepository::new();

        let result = repo.replace_document("doc1", vec![chunk("doc2", 0, "a")]).await;

        assert!(matches!(result, Err(DomainError::InvalidInput { .. })));
    }

    #[tokio::test]
    async fn test_delete_and_list() {
        let repo = InMemoryChunkRepository::new();

        repo.replace_document("b-doc", vec![chunk("b-doc", 0, "x")]).await.unwrap();
        repo.replace_document("a-doc", vec![chunk("a-doc", 0, "y"), chunk("a-doc", 1, "z")])
            .await
            .unwrap();

        let documents = repo.list_documents().await.unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].document_id, "a-doc");
        assert_eq!(documents[0].chunk_count, 2);

        assert_eq!(repo.delete_document("a-doc").await.unwrap(), 2);
        assert_eq!(repo.delete_document("a-doc").await.unwrap(), 0);
        assert_eq!(repo.list_documents().await.unwrap().len(), 1);
    }
}
