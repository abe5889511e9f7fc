//! Retrieval pipeline: document ingestion and query-time context retrieval

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::DomainError;
use crate::domain::embedding::EmbeddingProvider;
use crate::domain::retrieval::{
    ChunkRepository, ChunkingConfig, ChunkingStrategy, DocumentChunk, DocumentInfo,
    RetrievedChunk, validate_document_id,
};
use crate::domain::similarity::{SearchParams, SimilarityIndex, VectorKind, VectorRef};
use crate::infrastructure::observability::record_ingested_chunks;

/// Separator placed between chunk texts in an assembled context
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Chunking and search settings for the retrieval pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,
    /// Chunks returned when the caller does not ask for a specific count
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub min_score: f32,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_min_chunk_size() -> usize {
    1
}

fn default_top_k() -> usize {
    4
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_size: default_min_chunk_size(),
            top_k: default_top_k(),
            min_score: 0.0,
        }
    }
}

impl RetrievalSettings {
    pub fn chunking(&self) -> ChunkingConfig {
        ChunkingConfig::new(self.chunk_size, self.chunk_overlap)
            .with_min_chunk_size(self.min_chunk_size)
    }

    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score.clamp(0.0, 1.0);
        self
    }
}

/// Chunks, embeds and indexes documents, and retrieves the chunks closest to a query
///
/// Chunk vectors live in the shared similarity index under
/// `VectorKind::DocumentChunk`, so cache entries stored in the same index never
/// show up in retrieval results.
pub struct RetrievalPipeline {
    chunker: Arc<dyn ChunkingStrategy>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn SimilarityIndex>,
    repository: Arc<dyn ChunkRepository>,
    settings: RetrievalSettings,
    /// Serializes the mutation phase of ingestion and deletion
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for RetrievalPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalPipeline")
            .field("chunker", &self.chunker.name())
            .field("embedding_provider", &self.embedding_provider.provider_name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl RetrievalPipeline {
    pub fn new(
        chunker: Arc<dyn ChunkingStrategy>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn SimilarityIndex>,
        repository: Arc<dyn ChunkRepository>,
    ) -> Self {
        Self {
            chunker,
            embedding_provider,
            index,
            repository,
            settings: RetrievalSettings::default(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_settings(mut self, settings: RetrievalSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Ingest a document, replacing any document with the same id
    ///
    /// Every chunk is embedded before anything is mutated, so an embedding
    /// failure leaves the previously ingested version untouched.
    pub async fn ingest(&self, document_id: &str, text: &str) -> Result<usize, DomainError> {
        validate_document_id(document_id)?;

        if text.trim().is_empty() {
            return Err(DomainError::invalid_input("document text must not be empty"));
        }

        let pieces = self.chunker.chunk(text, &self.settings.chunking())?;
        let texts: Vec<String> = pieces.iter().map(|piece| piece.content.clone()).collect();
        let fingerprints = self.embedding_provider.embed_batch(&texts).await?;

        if fingerprints.len() != texts.len() {
            return Err(DomainError::embedding(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                fingerprints.len()
            )));
        }

        let ingested_at = Utc::now();
        let chunks: Vec<DocumentChunk> = pieces
            .into_iter()
            .zip(fingerprints)
            .map(|(piece, fingerprint)| {
                DocumentChunk::new(document_id, piece.index, piece.content, fingerprint, ingested_at)
            })
            .collect();
        let chunk_count = chunks.len();

        let _guard = self.write_lock.lock().await;

        let previous = self
            .repository
            .replace_document(document_id, chunks.clone())
            .await?;
        self.index.remove_document(document_id).await?;

        if let Err(e) = self.index_chunks(&chunks).await {
            warn!(
                document_id = %document_id,
                error = %e,
                "Failed to index chunks, restoring previous document"
            );
            self.restore(document_id, previous).await;
            return Err(e);
        }

        record_ingested_chunks(chunk_count);
        info!(
            document_id = %document_id,
            chunk_count = chunk_count,
            chunker = self.chunker.name(),
            "Ingested document"
        );

        Ok(chunk_count)
    }

    async fn index_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), DomainError> {
        for chunk in chunks {
            self.index
                .insert(
                    chunk.fingerprint().to_vec(),
                    VectorRef::document_chunk(chunk.chunk_id(), chunk.source_document_id()),
                )
                .await?;
        }

        Ok(())
    }

    /// Best-effort rollback to the chunks that were stored before a failed ingest
    async fn restore(&self, document_id: &str, previous: Vec<DocumentChunk>) {
        if let Err(e) = self.index.remove_document(document_id).await {
            warn!(document_id = %document_id, error = %e, "Rollback: failed to clear vectors");
        }

        if let Err(e) = self.index_chunks(&previous).await {
            warn!(document_id = %document_id, error = %e, "Rollback: failed to re-index chunks");
        }

        if let Err(e) = self.repository.replace_document(document_id, previous).await {
            warn!(document_id = %document_id, error = %e, "Rollback: failed to restore chunks");
        }
    }

    /// Retrieve the chunks closest to a query, best first
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        Ok(self
            .retrieve_scored(query, top_k)
            .await?
            .into_iter()
            .map(|retrieved| retrieved.chunk)
            .collect())
    }

    /// Retrieve the closest chunks together with their similarity scores
    pub async fn retrieve_scored(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedChunk>, DomainError> {
        if query.trim().is_empty() {
            return Err(DomainError::invalid_input("query text must not be empty"));
        }

        if top_k == 0 {
            return Ok(vec![]);
        }

        let fingerprint = self.embedding_provider.embed(query.trim()).await?;
        let params =
            SearchParams::new(top_k, self.settings.min_score).with_kind(VectorKind::DocumentChunk);
        let matches = self.index.search(&fingerprint, &params).await?;

        let mut retrieved = Vec::with_capacity(matches.len());

        for found in matches {
            match self.repository.get(found.reference.identity_token()).await? {
                Some(chunk) => retrieved.push(RetrievedChunk {
                    chunk,
                    score: found.score,
                }),
                None => debug!(reference = %found.reference, "Skipping vector without a stored chunk"),
            }
        }

        debug!(top_k = top_k, returned = retrieved.len(), "Retrieved chunks");

        Ok(retrieved)
    }

    /// Retrieve and join the closest chunk texts for prompt augmentation
    pub async fn assemble_context(&self, query: &str, top_k: usize) -> Result<String, DomainError> {
        let chunks = self.retrieve(query, top_k).await?;

        Ok(join_context(&chunks))
    }

    /// Delete a document and its vectors, returning the number of removed chunks
    pub async fn delete_document(&self, document_id: &str) -> Result<usize, DomainError> {
        validate_document_id(document_id)?;

        let _guard = self.write_lock.lock().await;

        let removed = self.repository.delete_document(document_id).await?;
        self.index.remove_document(document_id).await?;

        if removed > 0 {
            info!(document_id = %document_id, chunk_count = removed, "Deleted document");
        }

        Ok(removed)
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentInfo>, DomainError> {
        self.repository.list_documents().await
    }
}

/// Join chunk texts in order with a blank line between them
pub fn join_context(chunks: &[DocumentChunk]) -> String {
    chunks
        .iter()
        .map(DocumentChunk::text)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
