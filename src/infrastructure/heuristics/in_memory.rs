//! In-memory heuristics tracker

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use chrono::Utc;
use tracing::warn;

use crate::domain::heuristics::{
    EligibilityPolicy, GenerationOutcome, HeuristicRecord, HeuristicsTracker,
};

const DEFAULT_MAX_RECORDS: usize = 256;

/// Behavioral log kept in process memory
///
/// Each signature keeps a bounded ring of its most recent records; older
/// records are dropped once `max_records_per_signature` is reached.
#[derive(Debug)]
pub struct InMemoryHeuristicsTracker {
    records: RwLock<HashMap<String, VecDeque<HeuristicRecord>>>,
    policy: EligibilityPolicy,
    max_records_per_signature: usize,
}

impl InMemoryHeuristicsTracker {
    pub fn new(policy: EligibilityPolicy) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            policy,
            max_records_per_signature: DEFAULT_MAX_RECORDS.max(policy.window),
        }
    }

    /// Bound the retained history per signature (never below the policy window)
    pub fn with_max_records_per_signature(mut self, max: usize) -> Self {
        self.max_records_per_signature = max.max(self.policy.window).max(1);
        self
    }

    /// Number of signatures with at least one record
    pub fn tracked_signatures(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }
}

#[cfg(test)]
impl InMemoryHeuristicsTracker {
    /// A tracker whose lock was poisoned by a panicking writer
    pub(crate) fn poisoned(policy: EligibilityPolicy) -> Self {
        let tracker = Self::new(policy);

        std::thread::scope(|scope| {
            let _ = scope
                .spawn(|| {
                    let _guard = tracker.records.write();
                    panic!("writer panicked while holding the records lock");
                })
                .join();
        });

        tracker
    }
}

impl Default for InMemoryHeuristicsTracker {
    fn default() -> Self {
        Self::new(EligibilityPolicy::default())
    }
}

impl HeuristicsTracker for InMemoryHeuristicsTracker {
    fn record(&self, identity_token: &str, outcome: GenerationOutcome) {
        let mut records = match self.records.write() {
            Ok(records) => records,
            Err(e) => {
                warn!(identity_token = %identity_token, error = %e, "Dropping heuristic record");
                return;
            }
        };

        let history = records.entry(identity_token.to_string()).or_default();

        // Keep per-signature timestamps non-decreasing even if the clock steps back
        let now = Utc::now();
        let timestamp = history
            .back()
            .map(|last| last.timestamp().max(now))
            .unwrap_or(now);

        if history.len() >= self.max_records_per_signature {
            history.pop_front();
        }

        history.push_back(HeuristicRecord::new(identity_token, outcome, timestamp));
    }

    fn success_rate(&self, identity_token: &str, window: usize) -> Option<f64> {
        let records = self.records.read().ok()?;
        let history = records.get(identity_token)?;

        let considered = history.len().min(window.max(1));
        if considered == 0 {
            return None;
        }

        let successes = history
            .iter()
            .rev()
            .take(considered)
            .filter(|record| record.success())
            .count();

        Some(successes as f64 / considered as f64)
    }

    fn history(&self, identity_token: &str) -> Vec<HeuristicRecord> {
        self.records
            .read()
            .ok()
            .and_then(|records| {
                records
                    .get(identity_token)
                    .map(|history| history.iter().cloned().collect())
            })
            .unwrap_or_default()
    }

    fn policy(&self) -> EligibilityPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::heuristics::Eligibility;

    fn tracker(window: usize, threshold: f64) -> InMemoryHeuristicsTracker {
        InMemoryHeuristicsTracker::new(EligibilityPolicy::new(window, threshold))
    }

    #[test]
    fn test_no_history_is_undecided() {
        let tracker = tracker(4, 0.75);

        assert_eq!(tracker.success_rate("tok", 4), None);
        assert_eq!(tracker.eligibility("tok"), Eligibility::Undecided);
        assert!(!tracker.is_cache_eligible("tok"));
        assert!(tracker.summary("tok").is_none());
    }

    #[test]
    fn test_success_rate_over_recent_window() {
        let tracker = tracker(4, 0.75);

        tracker.record("tok", GenerationOutcome::success(10, None));
        tracker.record("tok", GenerationOutcome::failure(10, "timeout"));
        tracker.record("tok", GenerationOutcome::failure(10, "timeout"));
        tracker.record("tok", GenerationOutcome::failure(10, "timeout"));
        tracker.record("tok", GenerationOutcome::success(10, None));

        assert_eq!(tracker.success_rate("tok", 4), Some(0.25));
        assert_eq!(tracker.success_rate("tok", 1), Some(1.0));
        assert_eq!(tracker.success_rate("tok", 100), Some(0.4));
        assert_eq!(tracker.eligibility("tok"), Eligibility::Ineligible);
    }

    #[test]
    fn test_fewer_attempts_than_window_uses_all() {
        let tracker = tracker(10, 0.5);

        tracker.record("tok", GenerationOutcome::success(10, Some(5)));

        assert_eq!(tracker.success_rate("tok", 10), Some(1.0));
        assert!(tracker.is_cache_eligible("tok"));
    }

    #[test]
    fn test_history_is_bounded_and_ordered() {
        let tracker = tracker(2, 0.5).with_max_records_per_signature(3);

        for latency in 0..5 {
            tracker.record("tok", GenerationOutcome::success(latency, None));
        }

        let history = tracker.history("tok");
        let latencies: Vec<_> = history.iter().map(|r| r.latency_ms()).collect();

        assert_eq!(latencies, vec![2, 3, 4]);
        assert!(history.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
    }

    #[test]
    fn test_signatures_are_independent() {
        let tracker = tracker(4, 0.5);

        tracker.record("a", GenerationOutcome::failure(10, "http_500"));
        tracker.record("b", GenerationOutcome::success(10, None));

        assert!(!tracker.is_cache_eligible("a"));
        assert!(tracker.is_cache_eligible("b"));
        assert_eq!(tracker.tracked_signatures(), 2);
    }

    #[test]
    fn test_adjusted_threshold() {
        let tracker = tracker(4, 0.5);

        assert_eq!(tracker.adjusted_threshold("tok", 0.9, 1.0), 0.9);

        tracker.record("tok", GenerationOutcome::success(10, None));
        tracker.record("tok", GenerationOutcome::failure(10, "timeout"));

        assert_eq!(tracker.adjusted_threshold("tok", 0.9, 0.0), 0.9);

        let adjusted = tracker.adjusted_threshold("tok", 0.9, 1.0);
        assert!((adjusted - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_poisoned_lock_drops_records_without_failing() {
        let tracker = InMemoryHeuristicsTracker::poisoned(EligibilityPolicy::new(4, 0.5));

        assert!(tracker.records.is_poisoned());

        tracker.record("tok", GenerationOutcome::success(10, None));
        tracker.record("tok", GenerationOutcome::failure(10, "timeout"));

        assert!(tracker.history("tok").is_empty());
        assert_eq!(tracker.success_rate("tok", 4), None);
        assert_eq!(tracker.eligibility("tok"), Eligibility::Undecided);
        assert_eq!(tracker.tracked_signatures(), 0);
    }

    #[test]
    fn test_summary() {
        let tracker = tracker(4, 0.5);

        tracker.record("tok", GenerationOutcome::success(100, Some(20)));
        tracker.record("tok", GenerationOutcome::failure(300, "decode"));

        let summary = tracker.summary("tok").unwrap();

        assert_eq!(summary.attempts, 2);
        assert_eq!(summary.successes, 1);
        assert_eq!(summary.last_error_kind.as_deref(), Some("decode"));
    }
}
