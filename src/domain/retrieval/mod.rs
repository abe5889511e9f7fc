//! Retrieval domain types and traits
//!
//! Documents are split by a `ChunkingStrategy`, embedded, stored in a
//! `ChunkRepository` and indexed in the shared similarity index.

mod chunk;
mod chunker;
mod repository;

pub use chunk::{DocumentChunk, DocumentInfo, RetrievedChunk, validate_document_id};
pub use chunker::{ChunkingConfig, ChunkingStrategy, TextChunk};
pub use repository::ChunkRepository;

#[cfg(test)]
pub use chunker::mock::MockChunkingStrategy;
