//! Cache eligibility policy

use serde::{Deserialize, Serialize};

/// Whether a signature's responses may be persisted to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    Eligible,
    Ineligible,
    /// No history yet; callers must still attempt generation
    Undecided,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Rolling success-rate gate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EligibilityPolicy {
    /// Number of most recent attempts considered
    pub window: usize,
    /// Minimum success rate (inclusive) in [0, 1]
    pub threshold: f64,
}

impl Default for EligibilityPolicy {
    fn default() -> Self {
        Self {
            window: 10,
            threshold: 0.5,
        }
    }
}

impl EligibilityPolicy {
    pub fn new(window: usize, threshold: f64) -> Self {
        Self {
            window: window.max(1),
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Decide from a windowed success rate, `None` meaning no history
    pub fn decide(&self, success_rate: Option<f64>) -> Eligibility {
        match success_rate {
            None => Eligibility::Undecided,
            Some(rate) if rate >= self.threshold => Eligibility::Eligible,
            Some(_) => Eligibility::Ineligible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_history_is_undecided() {
        let policy = EligibilityPolicy::new(4, 0.75);

        assert_eq!(policy.decide(None), Eligibility::Undecided);
        assert!(!Eligibility::Undecided.is_eligible());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let policy = EligibilityPolicy::new(4, 0.75);

        assert_eq!(policy.decide(Some(0.75)), Eligibility::Eligible);
        assert_eq!(policy.decide(Some(0.5)), Eligibility::Ineligible);
    }

    #[test]
    fn test_new_clamps_parameters() {
        let policy = EligibilityPolicy::new(0, 1.5);

        assert_eq!(policy.window, 1);
        assert!((policy.threshold - 1.0).abs() < f64::EPSILON);
    }
}
