//! Semantic cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::heuristics::EligibilityPolicy;

/// Configuration for the semantic cache coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticCacheConfig {
    /// Whether cache reads and writes happen at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Lifetime of a cached entry in seconds
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Minimum similarity score (0.0 to 1.0) for a fuzzy hit
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    /// Fuzzy search breadth
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Number of recent attempts considered for eligibility
    #[serde(default = "default_eligibility_window")]
    pub eligibility_window: usize,

    /// Minimum success rate required to persist a response
    #[serde(default = "default_eligibility_threshold")]
    pub eligibility_threshold: f64,

    /// How strongly failing signatures raise their fuzzy threshold (0 disables)
    #[serde(default)]
    pub similarity_adaptivity: f32,
}

fn default_enabled() -> bool {
    true
}

fn default_ttl_seconds() -> u64 {
    3600
}

fn default_similarity_threshold() -> f32 {
    0.95
}

fn default_top_k() -> usize {
    1
}

fn default_eligibility_window() -> usize {
    10
}

fn default_eligibility_threshold() -> f64 {
    0.5
}

impl Default for SemanticCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            ttl_seconds: default_ttl_seconds(),
            similarity_threshold: default_similarity_threshold(),
            top_k: default_top_k(),
            eligibility_window: default_eligibility_window(),
            eligibility_threshold: default_eligibility_threshold(),
            similarity_adaptivity: 0.0,
        }
    }
}

impl SemanticCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get TTL as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    /// Eligibility policy derived from the window and threshold
    pub fn eligibility_policy(&self) -> EligibilityPolicy {
        EligibilityPolicy::new(self.eligibility_window, self.eligibility_threshold)
    }

    /// Set whether caching is enabled
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_seconds = ttl.as_secs();
        self
    }

    /// Set the similarity threshold
    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the fuzzy search breadth
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Set the eligibility window and threshold
    pub fn with_eligibility(mut self, window: usize, threshold: f64) -> Self {
        self.eligibility_window = window.max(1);
        self.eligibility_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the similarity adaptivity
    pub fn with_similarity_adaptivity(mut self, adaptivity: f32) -> Self {
        self.similarity_adaptivity = adaptivity.clamp(0.0, 1.0);
        self
    }
}
