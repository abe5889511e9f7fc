//! Document ingestion and retrieval types

use serde::{Deserialize, Serialize};

use crate::domain::retrieval::{DocumentInfo, RetrievedChunk};

#[derive(Debug, Clone, Deserialize)]
pub struct IngestDocumentRequest {
    pub document_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestDocumentResponse {
    pub document_id: String,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDocumentResponse {
    pub document_id: String,
    pub deleted: bool,
    pub chunks_removed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentListResponse {
    pub object: String,
    pub data: Vec<DocumentInfo>,
}

impl DocumentListResponse {
    pub fn new(data: Vec<DocumentInfo>) -> Self {
        Self {
            object: "list".to_string(),
            data,
        }
    }
}

/// `top_k` falls back to the configured retrieval default
#[derive(Debug, Clone, Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrieveResponse {
    pub chunks: Vec<RetrievedChunk>,
    pub context: String,
}
