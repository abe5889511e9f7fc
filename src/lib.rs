//! PMP Semantic Cache
//!
//! A semantic cache and retrieval layer in front of a local inference engine:
//! - Exact and near-duplicate prompt matching against cached responses
//! - Single-flight generation for concurrent identical prompts
//! - Generation telemetry gating what gets cached
//! - Document chunking and similarity retrieval for prompt augmentation

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use config::EmbeddingBackend;
use domain::embedding::EmbeddingProvider;
use domain::semantic_cache::ResponseGenerator;
use domain::signature::SignatureGenerator;
use infrastructure::{
    cache::CacheStoreFactory,
    embedding::{HashingEmbeddingProvider, OllamaEmbeddingProvider},
    heuristics::InMemoryHeuristicsTracker,
    llm::{HttpClient, OllamaGenerator},
    retrieval::{InMemoryChunkRepository, RetrievalPipeline, SentenceChunker},
    services::SemanticCacheCoordinator,
    similarity::FlatSimilarityIndex,
};
use tracing::info;

/// Create the application state with default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Wire the cache, retrieval and generation services from configuration
///
/// The semantic cache and the retrieval pipeline share one similarity index;
/// their vectors are kept apart by reference kind.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    config.validate()?;

    let cache_config = config.cache.coordinator();

    let store = CacheStoreFactory::create(&config.cache.store()).await?;
    info!(backend = %config.cache.backend, "Cache store ready");

    let index = Arc::new(FlatSimilarityIndex::new());
    let heuristics = Arc::new(
        InMemoryHeuristicsTracker::new(cache_config.eligibility_policy())
            .with_max_records_per_signature(config.cache.max_records_per_signature),
    );

    let client = HttpClient::with_timeout(Duration::from_secs(config.backend.timeout_seconds))?;
    let embedder = create_embedding_provider(config, client.clone());

    let coordinator = SemanticCacheCoordinator::with_config(
        store,
        index.clone(),
        heuristics,
        SignatureGenerator::new(embedder.clone()),
        cache_config,
    );

    let retrieval = RetrievalPipeline::new(
        Arc::new(SentenceChunker::new()),
        embedder,
        index,
        Arc::new(InMemoryChunkRepository::new()),
    )
    .with_settings(config.retrieval.clone());

    let generator: Arc<dyn ResponseGenerator> = Arc::new(OllamaGenerator::with_base_url(
        client,
        &config.backend.model,
        &config.backend.ollama_url,
    ));

    info!(
        model = %config.backend.model,
        ollama_url = %config.backend.ollama_url,
        "Generation backend configured"
    );

    Ok(AppState::new(coordinator, Arc::new(retrieval), generator))
}

fn create_embedding_provider(config: &AppConfig, client: HttpClient) -> Arc<dyn EmbeddingProvider> {
    match config.backend.embedding {
        EmbeddingBackend::Hashing => {
            info!(
                dimensions = config.backend.embedding_dimensions,
                "Using hashing embeddings"
            );
            Arc::new(HashingEmbeddingProvider::new(
                config.backend.embedding_dimensions,
            ))
        }
        EmbeddingBackend::Ollama => {
            info!(model = %config.backend.embedding_model, "Using Ollama embeddings");
            Arc::new(OllamaEmbeddingProvider::with_base_url(
                client,
                &config.backend.embedding_model,
                &config.backend.ollama_url,
            ))
        }
    }
}
