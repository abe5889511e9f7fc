//! Versioned API endpoints

pub mod cache;
pub mod documents;
pub mod resolve;

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::state::AppState;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/resolve", post(resolve::resolve_prompt))
        .route(
            "/documents",
            get(documents::list_documents).post(documents::ingest_document),
        )
        .route("/documents/{document_id}", delete(documents::delete_document))
        .route("/retrieve", post(documents::retrieve))
        .route("/cache/stats", get(cache::cache_stats))
        .route("/cache/sweep", post(cache::sweep_cache))
        .route("/cache/{identity_token}", delete(cache::invalidate_entry))
        .route(
            "/heuristics/{identity_token}",
            get(cache::signature_heuristics),
        )
}
