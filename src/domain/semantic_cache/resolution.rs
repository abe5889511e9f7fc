//! Resolution results and coordinator statistics

use serde::{Deserialize, Serialize};

/// Where a resolved response came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResolutionSource {
    /// Served from the store by identity token
    ExactHit,
    /// Served from a near-duplicate prompt's entry
    FuzzyHit { similarity: f32, matched_token: String },
    /// Produced by the generation backend
    Generated { persisted: bool },
}

impl ResolutionSource {
    pub fn is_hit(&self) -> bool {
        !matches!(self, Self::Generated { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ExactHit => "exact_hit",
            Self::FuzzyHit { .. } => "fuzzy_hit",
            Self::Generated { .. } => "generated",
        }
    }
}

/// Outcome of `SemanticCacheCoordinator::resolve`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub response: String,
    pub identity_token: String,
    pub source: ResolutionSource,
    pub model_id: Option<String>,
    /// Hit count of the serving entry after this resolution (0 when generated)
    pub hit_count: u64,
    /// Whether this caller waited on another caller's in-flight generation
    pub shared: bool,
}

impl Resolution {
    pub(crate) fn shared(mut self) -> Self {
        self.shared = true;
        self
    }
}

/// Result of a sweep over the store and the index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    pub entries_removed: usize,
    pub vectors_removed: usize,
}

/// Point-in-time coordinator statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub exact_hits: u64,
    pub fuzzy_hits: u64,
    pub misses: u64,
    pub generations: u64,
    pub generation_failures: u64,
    pub coalesced_waiters: u64,
    pub unpersisted_responses: u64,
    pub store_errors: u64,
    pub entries: usize,
    pub vectors: usize,
}

impl CacheStats {
    /// Fraction of lookups served from the cache
    pub fn hit_rate(&self) -> f64 {
        let hits = self.exact_hits + self.fuzzy_hits;
        let total = hits + self.misses;

        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}
