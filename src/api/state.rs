//! Application state for shared services

use std::sync::Arc;

use crate::domain::semantic_cache::ResponseGenerator;
use crate::infrastructure::retrieval::RetrievalPipeline;
use crate::infrastructure::services::SemanticCacheCoordinator;

/// Services shared by all handlers; cloning is cheap
#[derive(Clone, Debug)]
pub struct AppState {
    pub coordinator: SemanticCacheCoordinator,
    pub retrieval: Arc<RetrievalPipeline>,
    pub generator: Arc<dyn ResponseGenerator>,
}

impl AppState {
    pub fn new(
        coordinator: SemanticCacheCoordinator,
        retrieval: Arc<RetrievalPipeline>,
        generator: Arc<dyn ResponseGenerator>,
    ) -> Self {
        Self {
            coordinator,
            retrieval,
            generator,
        }
    }
}
