//! Prompt resolution endpoint

use axum::extract::State;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, ResolveRequest, ResolveResponse};

/// POST /v1/resolve
pub async fn resolve_prompt(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, ApiError> {
    debug!(prompt_len = request.prompt.len(), "Resolving prompt");

    let resolution = state
        .coordinator
        .resolve_text(&request.prompt, state.generator.clone())
        .await?;

    Ok(Json(resolution.into()))
}
