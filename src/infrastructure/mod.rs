//! Infrastructure layer - External service implementations

pub mod cache;
pub mod embedding;
pub mod heuristics;
pub mod llm;
pub mod logging;
pub mod observability;
pub mod retrieval;
pub mod services;
pub mod similarity;
