//! Infrastructure services

mod expiry_sweeper;
mod semantic_cache_coordinator;
mod single_flight;

pub use expiry_sweeper::ExpirySweeper;
pub use semantic_cache_coordinator::SemanticCacheCoordinator;
pub use single_flight::{Flight, SingleFlight};
