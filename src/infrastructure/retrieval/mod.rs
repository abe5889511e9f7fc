//! Retrieval infrastructure - chunking, chunk storage and the retrieval pipeline

mod in_memory;
mod pipeline;
mod sentence;

pub use in_memory::InMemoryChunkRepository;
pub use pipeline::{RetrievalPipeline, RetrievalSettings, join_context};
pub use sentence::SentenceChunker;
