//! Prompt resolution types

use serde::{Deserialize, Serialize};

use crate::domain::semantic_cache::{Resolution, ResolutionSource};

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolveResponse {
    pub response: String,
    pub identity_token: String,
    pub source: ResolutionSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    pub hit_count: u64,
    pub shared: bool,
}

impl From<Resolution> for ResolveResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            response: resolution.response,
            identity_token: resolution.identity_token,
            source: resolution.source,
            model_id: resolution.model_id,
            hit_count: resolution.hit_count,
            shared: resolution.shared,
        }
    }
}
