//! Heuristic records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one generation attempt, as reported by the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub success: bool,
    pub latency_ms: u64,
    pub token_count: Option<u64>,
    pub error_kind: Option<String>,
}

impl GenerationOutcome {
    /// A successful attempt
    pub fn success(latency_ms: u64, token_count: Option<u64>) -> Self {
        Self {
            success: true,
            latency_ms,
            token_count,
            error_kind: None,
        }
    }

    /// A failed attempt
    pub fn failure(latency_ms: u64, error_kind: impl Into<String>) -> Self {
        Self {
            success: false,
            latency_ms,
            token_count: None,
            error_kind: Some(error_kind.into()),
        }
    }
}

/// Append-only record of one generation attempt; never mutated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeuristicRecord {
    identity_token: String,
    success: bool,
    latency_ms: u64,
    token_count: Option<u64>,
    error_kind: Option<String>,
    timestamp: DateTime<Utc>,
}

impl HeuristicRecord {
    pub fn new(
        identity_token: impl Into<String>,
        outcome: GenerationOutcome,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            identity_token: identity_token.into(),
            success: outcome.success,
            latency_ms: outcome.latency_ms,
            token_count: outcome.token_count,
            error_kind: outcome.error_kind,
            timestamp,
        }
    }

    pub fn identity_token(&self) -> &str {
        &self.identity_token
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency_ms
    }

    pub fn token_count(&self) -> Option<u64> {
        self.token_count
    }

    pub fn error_kind(&self) -> Option<&str> {
        self.error_kind.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Aggregated view over a signature's retained records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureSummary {
    pub attempts: usize,
    pub successes: usize,
    pub failures: usize,
    pub success_rate: f64,
    pub avg_latency_ms: f64,
    /// Mean over attempts that reported a token count
    pub avg_token_count: Option<f64>,
    pub last_error_kind: Option<String>,
    pub last_attempt_at: DateTime<Utc>,
}

impl SignatureSummary {
    /// Aggregate records in timestamp order; `None` for an empty slice
    pub fn from_records<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a HeuristicRecord>,
    {
        let mut attempts = 0usize;
        let mut successes = 0usize;
        let mut total_latency = 0u64;
        let mut total_tokens = 0u64;
        let mut counted_tokens = 0usize;
        let mut last_error_kind = None;
        let mut last_attempt_at = None;

        for record in records {
            attempts += 1;
            total_latency = total_latency.saturating_add(record.latency_ms);

            if record.success {
                successes += 1;
            }

            if let Some(tokens) = record.token_count {
                total_tokens = total_tokens.saturating_add(tokens);
                counted_tokens += 1;
            }

            if let Some(kind) = &record.error_kind {
                last_error_kind = Some(kind.clone());
            }

            last_attempt_at = Some(record.timestamp);
        }

        let last_attempt_at = last_attempt_at?;

        Some(Self {
            attempts,
            successes,
            failures: attempts - successes,
            success_rate: successes as f64 / attempts as f64,
            avg_latency_ms: total_latency as f64 / attempts as f64,
            avg_token_count: (counted_tokens > 0)
                .then(|| total_tokens as f64 / counted_tokens as f64),
            last_error_kind,
            last_attempt_at,
        })
    }
}
