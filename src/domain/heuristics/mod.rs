//! Behavioral telemetry about past generations, used to gate caching

mod policy;
mod record;
mod tracker;

pub use policy::{Eligibility, EligibilityPolicy};
pub use record::{GenerationOutcome, HeuristicRecord, SignatureSummary};
pub use tracker::HeuristicsTracker;
