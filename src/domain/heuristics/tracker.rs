//! Heuristics tracker trait

use super::{Eligibility, EligibilityPolicy, GenerationOutcome, HeuristicRecord, SignatureSummary};

/// Append-only behavioral log keyed by identity token
///
/// Recording never fails from the caller's point of view: implementations
/// log and drop records they cannot store.
pub trait HeuristicsTracker: Send + Sync + std::fmt::Debug {
    /// Append one generation outcome
    fn record(&self, identity_token: &str, outcome: GenerationOutcome);

    /// Success rate over the most recent `window` attempts, `None` without data
    fn success_rate(&self, identity_token: &str, window: usize) -> Option<f64>;

    /// Retained records for a signature, oldest first
    fn history(&self, identity_token: &str) -> Vec<HeuristicRecord>;

    /// Eligibility policy applied by `eligibility`
    fn policy(&self) -> EligibilityPolicy;

    /// Aggregate over all retained records
    fn summary(&self, identity_token: &str) -> Option<SignatureSummary> {
        SignatureSummary::from_records(&self.history(identity_token))
    }

    fn eligibility(&self, identity_token: &str) -> Eligibility {
        let policy = self.policy();
        policy.decide(self.success_rate(identity_token, policy.window))
    }

    /// `true` only once enough successful history exists
    fn is_cache_eligible(&self, identity_token: &str) -> bool {
        self.eligibility(identity_token).is_eligible()
    }

    /// Fuzzy-match threshold tightened for signatures that often fail
    ///
    /// `base + (1 - base) * (1 - success_rate) * adaptivity`, equal to `base`
    /// without history or with zero adaptivity.
    fn adjusted_threshold(&self, identity_token: &str, base: f32, adaptivity: f32) -> f32 {
        if adaptivity <= 0.0 {
            return base;
        }

        match self.success_rate(identity_token, self.policy().window) {
            Some(rate) => {
                let failure = (1.0 - rate as f32).clamp(0.0, 1.0);
                (base + (1.0 - base) * failure * adaptivity.min(1.0)).clamp(0.0, 1.0)
            }
            None => base,
        }
    }
}
