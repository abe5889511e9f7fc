//! Request and response types for the HTTP API

pub mod cache;
pub mod documents;
pub mod error;
pub mod json;
pub mod resolve;

pub use cache::{
    CacheStatsResponse, HeuristicsResponse, InvalidateResponse, SweepResponse,
};
pub use documents::{
    DeleteDocumentResponse, DocumentListResponse, IngestDocumentRequest, IngestDocumentResponse,
    RetrieveRequest, RetrieveResponse,
};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
pub use resolve::{ResolveRequest, ResolveResponse};
