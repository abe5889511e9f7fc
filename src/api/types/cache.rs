//! Cache administration and heuristics types

use serde::Serialize;

use crate::domain::heuristics::{Eligibility, SignatureSummary};
use crate::domain::semantic_cache::{CacheStats, SweepSummary};

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResponse {
    #[serde(flatten)]
    pub summary: SweepSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub identity_token: String,
    pub invalidated: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeuristicsResponse {
    pub identity_token: String,
    pub eligibility: Eligibility,
    pub summary: SignatureSummary,
}
