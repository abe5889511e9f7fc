//! Cache administration and heuristics endpoints

use axum::extract::{Path, State};
use tracing::info;

use crate::api::state::AppState;
use crate::api::types::{
    ApiError, CacheStatsResponse, HeuristicsResponse, InvalidateResponse, Json, SweepResponse,
};

/// GET /v1/cache/stats
pub async fn cache_stats(
    State(state): State<AppState>,
) -> Result<Json<CacheStatsResponse>, ApiError> {
    let stats = state.coordinator.stats().await?;

    Ok(Json(stats.into()))
}

/// POST /v1/cache/sweep
pub async fn sweep_cache(State(state): State<AppState>) -> Result<Json<SweepResponse>, ApiError> {
    let summary = state.coordinator.sweep_expired().await?;

    Ok(Json(SweepResponse { summary }))
}

/// DELETE /v1/cache/{identity_token}
pub async fn invalidate_entry(
    State(state): State<AppState>,
    Path(identity_token): Path<String>,
) -> Result<Json<InvalidateResponse>, ApiError> {
    if !state.coordinator.invalidate(&identity_token).await? {
        return Err(ApiError::not_found(format!(
            "No cache entry for '{}'",
            identity_token
        )));
    }

    info!(identity_token = %identity_token, "Invalidated cache entry");

    Ok(Json(InvalidateResponse {
        identity_token,
        invalidated: true,
    }))
}

/// GET /v1/heuristics/{identity_token}
pub async fn signature_heuristics(
    State(state): State<AppState>,
    Path(identity_token): Path<String>,
) -> Result<Json<HeuristicsResponse>, ApiError> {
    let heuristics = state.coordinator.heuristics();

    let summary = heuristics.summary(&identity_token).ok_or_else(|| {
        ApiError::not_found(format!("No generation history for '{}'", identity_token))
    })?;

    Ok(Json(HeuristicsResponse {
        eligibility: heuristics.eligibility(&identity_token),
        identity_token,
        summary,
    }))
}
