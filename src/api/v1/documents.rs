//! Document ingestion and retrieval endpoints

use axum::extract::{Path, State};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, DeleteDocumentResponse, DocumentListResponse, IngestDocumentRequest,
    IngestDocumentResponse, Json, RetrieveRequest, RetrieveResponse,
};
use crate::infrastructure::retrieval::join_context;

/// POST /v1/documents
///
/// Re-ingesting an existing document id replaces its chunks.
pub async fn ingest_document(
    State(state): State<AppState>,
    Json(request): Json<IngestDocumentRequest>,
) -> Result<Json<IngestDocumentResponse>, ApiError> {
    let chunk_count = state
        .retrieval
        .ingest(&request.document_id, &request.text)
        .await?;

    Ok(Json(IngestDocumentResponse {
        document_id: request.document_id,
        chunk_count,
    }))
}

/// GET /v1/documents
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, ApiError> {
    let documents = state.retrieval.list_documents().await?;

    Ok(Json(DocumentListResponse::new(documents)))
}

/// DELETE /v1/documents/{document_id}
pub async fn delete_document(
    State(state): State<AppState>,
    Path(document_id): Path<String>,
) -> Result<Json<DeleteDocumentResponse>, ApiError> {
    debug!(document_id = %document_id, "Deleting document");

    let chunks_removed = state.retrieval.delete_document(&document_id).await?;

    if chunks_removed == 0 {
        return Err(ApiError::not_found(format!(
            "Document '{}' not found",
            document_id
        )));
    }

    Ok(Json(DeleteDocumentResponse {
        document_id,
        deleted: true,
        chunks_removed,
    }))
}

/// POST /v1/retrieve
pub async fn retrieve(
    State(state): State<AppState>,
    Json(request): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    let top_k = request
        .top_k
        .unwrap_or_else(|| state.retrieval.settings().top_k);

    let chunks = state.retrieval.retrieve_scored(&request.query, top_k).await?;
    let context = join_context(
        &chunks
            .iter()
            .map(|retrieved| retrieved.chunk.clone())
            .collect::<Vec<_>>(),
    );

    Ok(Json(RetrieveResponse { chunks, context }))
}
