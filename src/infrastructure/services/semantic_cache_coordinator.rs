//! Semantic cache coordinator
//!
//! Resolves a prompt from the exact-match store, then from a near-duplicate
//! prompt's entry found through the similarity index, and only then by running
//! the generation backend, at most once per identity token at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use super::single_flight::SingleFlight;
use crate::domain::DomainError;
use crate::domain::cache::{CacheEntry, CacheStore};
use crate::domain::heuristics::{Eligibility, GenerationOutcome, HeuristicsTracker};
use crate::domain::semantic_cache::{
    CacheStats, GeneratedResponse, Resolution, ResolutionSource, ResponseGenerator,
    SemanticCacheConfig, SweepSummary,
};
use crate::domain::signature::{PromptSignature, SignatureGenerator};
use crate::domain::similarity::{SearchParams, SimilarityIndex, VectorKind, VectorRef};
use crate::infrastructure::observability::{
    record_cache_lookup, record_coalesced_waiter, record_generation, record_unpersisted_response,
};

#[derive(Debug, Default)]
struct Counters {
    exact_hits: AtomicU64,
    fuzzy_hits: AtomicU64,
    misses: AtomicU64,
    generations: AtomicU64,
    generation_failures: AtomicU64,
    coalesced_waiters: AtomicU64,
    unpersisted_responses: AtomicU64,
    store_errors: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> CacheStats {
        CacheStats {
            exact_hits: self.exact_hits.load(Ordering::Relaxed),
            fuzzy_hits: self.fuzzy_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            generations: self.generations.load(Ordering::Relaxed),
            generation_failures: self.generation_failures.load(Ordering::Relaxed),
            coalesced_waiters: self.coalesced_waiters.load(Ordering::Relaxed),
            unpersisted_responses: self.unpersisted_responses.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            entries: 0,
            vectors: 0,
        }
    }
}

struct CoordinatorInner {
    store: Arc<dyn CacheStore>,
    index: Arc<dyn SimilarityIndex>,
    heuristics: Arc<dyn HeuristicsTracker>,
    signatures: SignatureGenerator,
    config: SemanticCacheConfig,
    flights: SingleFlight<Result<Resolution, DomainError>>,
    counters: Counters,
}

/// Top-level facade over the cache store, similarity index and heuristics tracker
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct SemanticCacheCoordinator {
    inner: Arc<CoordinatorInner>,
}

impl std::fmt::Debug for SemanticCacheCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticCacheCoordinator")
            .field("store", &self.inner.store.backend_name())
            .field("index", &self.inner.index)
            .field("config", &self.inner.config)
            .field("in_flight", &self.inner.flights.in_flight())
            .finish()
    }
}

impl SemanticCacheCoordinator {
    pub fn new(
        store: Arc<dyn CacheStore>,
        index: Arc<dyn SimilarityIndex>,
        heuristics: Arc<dyn HeuristicsTracker>,
        signatures: SignatureGenerator,
    ) -> Self {
        Self::with_config(store, index, heuristics, signatures, SemanticCacheConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn CacheStore>,
        index: Arc<dyn SimilarityIndex>,
        heuristics: Arc<dyn HeuristicsTracker>,
        signatures: SignatureGenerator,
        config: SemanticCacheConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                store,
                index,
                heuristics,
                signatures,
                config,
                flights: SingleFlight::new(),
                counters: Counters::default(),
            }),
        }
    }

    pub fn config(&self) -> &SemanticCacheConfig {
        &self.inner.config
    }

    pub fn signatures(&self) -> &SignatureGenerator {
        &self.inner.signatures
    }

    pub fn heuristics(&self) -> &Arc<dyn HeuristicsTracker> {
        &self.inner.heuristics
    }

    /// Compute the signature of `text` and resolve it
    pub async fn resolve_text(
        &self,
        text: &str,
        generator: Arc<dyn ResponseGenerator>,
    ) -> Result<Resolution, DomainError> {
        let signature = self.inner.signatures.generate(text).await?;

        self.resolve(&signature, generator).await
    }

    /// Resolve a signature from the cache, or by generating it once
    ///
    /// Concurrent calls for the same identity token share one generation and
    /// observe the same outcome. Dropping the returned future never aborts a
    /// generation other callers may be waiting on.
    #[instrument(skip(self, signature, generator), fields(token = %signature.identity_token()))]
    pub async fn resolve(
        &self,
        signature: &PromptSignature,
        generator: Arc<dyn ResponseGenerator>,
    ) -> Result<Resolution, DomainError> {
        let inner = &self.inner;
        let mut use_cache = inner.config.enabled;

        if use_cache {
            match inner.lookup(signature).await {
                Ok(Some(resolution)) => return Ok(resolution),
                Ok(None) => {
                    Counters::bump(&inner.counters.misses);
                    record_cache_lookup("miss");
                    debug!("Cache miss");
                }
                // Lookup only touches the store and the index; their faults never fail the caller
                Err(e) => {
                    Counters::bump(&inner.counters.store_errors);
                    warn!(
                        error = %e,
                        unavailable = e.is_store_unavailable(),
                        "Cache lookup failed, resolving without it"
                    );
                    use_cache = false;
                }
            }
        }

        let slot_inner = inner.clone();
        let slot_signature = signature.clone();

        let flight = inner
            .flights
            .run(signature.identity_token(), move || async move {
                slot_inner
                    .resolve_in_slot(slot_signature, generator, use_cache)
                    .await
            })
            .await?;

        if flight.shared {
            Counters::bump(&inner.counters.coalesced_waiters);
            record_coalesced_waiter();
            debug!("Joined in-flight resolution");

            return flight.value.map(Resolution::shared);
        }

        flight.value
    }

    /// Remove the entry for an identity token and its vector
    pub async fn invalidate(&self, identity_token: &str) -> Result<bool, DomainError> {
        let removed = self.inner.store.invalidate(identity_token).await?;
        self.inner
            .index
            .remove(&VectorRef::cache_entry(identity_token))
            .await?;

        if removed {
            info!(token = %identity_token, "Invalidated cache entry");
        }

        Ok(removed)
    }

    /// Invalidate the entry a prompt resolves to, without embedding it
    pub async fn invalidate_prompt(&self, text: &str) -> Result<bool, DomainError> {
        let identity_token = self.inner.signatures.identity_token(text)?;

        self.invalidate(&identity_token).await
    }

    /// Sweep expired entries, then drop cache vectors whose entry is gone
    pub async fn sweep_expired(&self) -> Result<SweepSummary, DomainError> {
        let inner = &self.inner;
        let entries_removed = inner.store.sweep_expired().await?;
        let mut vectors_removed = 0;

        for indexed in inner.index.references(Some(VectorKind::CacheEntry)).await? {
            // A resolution may re-insert the vector after our read; only drop the one seen as stale
            if inner.store.get(indexed.reference.identity_token()).await?.is_none()
                && inner
                    .index
                    .remove_if_sequence(&indexed.reference, indexed.sequence)
                    .await?
            {
                vectors_removed += 1;
            }
        }

        if entries_removed > 0 || vectors_removed > 0 {
            info!(
                entries_removed = entries_removed,
                vectors_removed = vectors_removed,
                "Swept expired cache entries"
            );
        }

        Ok(SweepSummary {
            entries_removed,
            vectors_removed,
        })
    }

    pub async fn stats(&self) -> Result<CacheStats, DomainError> {
        let mut stats = self.inner.counters.snapshot();

        stats.entries = self.inner.store.size().await?;
        stats.vectors = self
            .inner
            .index
            .references(Some(VectorKind::CacheEntry))
            .await?
            .len();

        Ok(stats)
    }

    /// Probe the store and the index
    pub async fn health_check(&self) -> Result<(), DomainError> {
        self.inner.store.size().await?;
        self.inner.index.size().await?;

        Ok(())
    }
}

impl CoordinatorInner {
    /// Exact lookup, then fuzzy lookup
    async fn lookup(&self, signature: &PromptSignature) -> Result<Option<Resolution>, DomainError> {
        if let Some(resolution) = self.exact_lookup(signature.identity_token()).await? {
            return Ok(Some(resolution));
        }

        self.fuzzy_lookup(signature).await
    }

    async fn exact_lookup(&self, identity_token: &str) -> Result<Option<Resolution>, DomainError> {
        let Some(entry) = self.store.get(identity_token).await? else {
            return Ok(None);
        };

        let hit_count = self
            .store
            .touch_hit(identity_token)
            .await?
            .unwrap_or(entry.hit_count());

        Counters::bump(&self.counters.exact_hits);
        record_cache_lookup("exact_hit");
        debug!(hit_count = hit_count, "Exact cache hit");

        Ok(Some(Resolution {
            response: entry.response_text().to_string(),
            identity_token: identity_token.to_string(),
            source: ResolutionSource::ExactHit,
            model_id: entry.model_id().map(str::to_string),
            hit_count,
            shared: false,
        }))
    }

    async fn fuzzy_lookup(
        &self,
        signature: &PromptSignature,
    ) -> Result<Option<Resolution>, DomainError> {
        let threshold = self.heuristics.adjusted_threshold(
            signature.identity_token(),
            self.config.similarity_threshold,
            self.config.similarity_adaptivity,
        );
        let params =
            SearchParams::new(self.config.top_k.max(1), threshold).with_kind(VectorKind::CacheEntry);

        let matches = self.index.search(signature.fingerprint(), &params).await?;

        for candidate in matches {
            let matched_token = candidate.reference.identity_token();

            let Some(entry) = self.store.get(matched_token).await? else {
                // The entry expired or was evicted; its vector is stale
                if let Err(e) = self
                    .index
                    .remove_if_sequence(&candidate.reference, candidate.sequence)
                    .await
                {
                    warn!(reference = %candidate.reference, error = %e, "Failed to drop stale vector");
                }
                continue;
            };

            let Some(hit_count) = self.store.touch_hit(matched_token).await? else {
                continue;
            };

            Counters::bump(&self.counters.fuzzy_hits);
            record_cache_lookup("fuzzy_hit");
            debug!(
                matched = %matched_token,
                similarity = candidate.score,
                threshold = threshold,
                "Fuzzy cache hit"
            );

            return Ok(Some(Resolution {
                response: entry.response_text().to_string(),
                identity_token: signature.identity_token().to_string(),
                source: ResolutionSource::FuzzyHit {
                    similarity: candidate.score,
                    matched_token: matched_token.to_string(),
                },
                model_id: entry.model_id().map(str::to_string),
                hit_count,
                shared: false,
            }));
        }

        Ok(None)
    }

    /// Work done by the slot holder; runs on its own task
    async fn resolve_in_slot(
        self: Arc<Self>,
        signature: PromptSignature,
        generator: Arc<dyn ResponseGenerator>,
        mut use_cache: bool,
    ) -> Result<Resolution, DomainError> {
        let identity_token = signature.identity_token();

        // A flight that finished between our miss and taking the slot
        if use_cache {
            match self.exact_lookup(identity_token).await {
                Ok(Some(resolution)) => return Ok(resolution),
                Ok(None) => {}
                Err(e) => {
                    Counters::bump(&self.counters.store_errors);
                    warn!(token = %identity_token, error = %e, "Cache re-check failed, bypassing cache");
                    use_cache = false;
                }
            }
        }

        let started = Instant::now();
        let outcome = generator.generate(&signature).await;
        let latency = started.elapsed();
        let latency_ms = latency.as_millis() as u64;

        Counters::bump(&self.counters.generations);

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                Counters::bump(&self.counters.generation_failures);
                record_generation(generator.model_id().unwrap_or("unknown"), false, latency);
                self.heuristics
                    .record(identity_token, GenerationOutcome::failure(latency_ms, e.kind()));
                warn!(token = %identity_token, error = %e, latency_ms = latency_ms, "Generation failed");

                return Err(e);
            }
        };

        let model_id = response
            .model_id
            .clone()
            .or_else(|| generator.model_id().map(str::to_string));

        record_generation(model_id.as_deref().unwrap_or("unknown"), true, latency);
        self.heuristics.record(
            identity_token,
            GenerationOutcome::success(latency_ms, response.token_count),
        );

        let persisted = use_cache && self.persist(&signature, &response, model_id.as_deref()).await;

        info!(
            token = %identity_token,
            latency_ms = latency_ms,
            persisted = persisted,
            "Generated response"
        );

        Ok(Resolution {
            response: response.text,
            identity_token: identity_token.to_string(),
            source: ResolutionSource::Generated { persisted },
            model_id,
            hit_count: 0,
            shared: false,
        })
    }

    /// Store a generated response and its vector unless the signature is ineligible
    async fn persist(
        &self,
        signature: &PromptSignature,
        response: &GeneratedResponse,
        model_id: Option<&str>,
    ) -> bool {
        let identity_token = signature.identity_token();

        if self.heuristics.eligibility(identity_token) == Eligibility::Ineligible {
            Counters::bump(&self.counters.unpersisted_responses);
            record_unpersisted_response("ineligible");
            debug!(token = %identity_token, "Signature not eligible for caching");
            return false;
        }

        let mut entry = CacheEntry::new(identity_token, response.text.clone());

        if let Some(model_id) = model_id {
            entry = entry.with_model_id(model_id);
        }

        if let Err(e) = self.store.put(entry, self.config.ttl()).await {
            Counters::bump(&self.counters.store_errors);
            Counters::bump(&self.counters.unpersisted_responses);
            record_unpersisted_response("store_error");
            warn!(token = %identity_token, error = %e, "Failed to store response");
            return false;
        }

        if let Err(e) = self
            .index
            .insert(
                signature.fingerprint().to_vec(),
                VectorRef::cache_entry(identity_token),
            )
            .await
        {
            // The entry still serves exact hits
            Counters::bump(&self.counters.store_errors);
            warn!(token = %identity_token, error = %e, "Failed to index response fingerprint");
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCacheStore;
    use crate::domain::embedding::{EmbeddingProvider, MockEmbeddingProvider, similarity_score};
    use crate::domain::heuristics::EligibilityPolicy;
    use crate::domain::semantic_cache::{FnGenerator, MockResponseGenerator};
    use crate::infrastructure::cache::InMemoryCacheStore;
    use crate::infrastructure::embedding::HashingEmbeddingProvider;
    use crate::infrastructure::heuristics::InMemoryHeuristicsTracker;
    use crate::infrastructure::similarity::FlatSimilarityIndex;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tokio::sync::Notify;

    const PROMPT_A: &str = "rust ownership rules";
    const PROMPT_B: &str = "explain rust ownership";
    const PROMPT_C: &str = "python packaging";

    struct Fixture {
        store: Arc<InMemoryCacheStore>,
        index: Arc<FlatSimilarityIndex>,
        heuristics: Arc<InMemoryHeuristicsTracker>,
        coordinator: SemanticCacheCoordinator,
    }

    fn fixed_embeddings() -> Arc<dyn EmbeddingProvider> {
        Arc::new(
            MockEmbeddingProvider::new(2)
                .with_vector(PROMPT_A, vec![1.0, 0.0])
                .with_vector(PROMPT_B, vec![0.96, 0.28])
                .with_vector(PROMPT_C, vec![0.0, 1.0]),
        )
    }

    fn fixture(config: SemanticCacheConfig, embeddings: Arc<dyn EmbeddingProvider>) -> Fixture {
        let store = Arc::new(InMemoryCacheStore::new());
        let index = Arc::new(FlatSimilarityIndex::new());
        let heuristics = Arc::new(InMemoryHeuristicsTracker::new(config.eligibility_policy()));
        let coordinator = SemanticCacheCoordinator::with_config(
            store.clone(),
            index.clone(),
            heuristics.clone(),
            SignatureGenerator::new(embeddings),
            config,
        );

        Fixture {
            store,
            index,
            heuristics,
            coordinator,
        }
    }

    /// In-memory store that can hold one `get` until released
    #[derive(Default)]
    struct PausingStore {
        inner: InMemoryCacheStore,
        pause_next_get: AtomicBool,
        paused: Notify,
        resume: Notify,
    }

    #[async_trait::async_trait]
    impl CacheStore for PausingStore {
        async fn get(&self, identity_token: &str) -> Result<Option<CacheEntry>, DomainError> {
            let entry = self.inner.get(identity_token).await?;

            if self.pause_next_get.swap(false, Ordering::SeqCst) {
                self.paused.notify_one();
                self.resume.notified().await;
            }

            Ok(entry)
        }

        async fn put(&self, entry: CacheEntry, ttl: Duration) -> Result<(), DomainError> {
            self.inner.put(entry, ttl).await
        }

        async fn touch_hit(&self, identity_token: &str) -> Result<Option<u64>, DomainError> {
            self.inner.touch_hit(identity_token).await
        }

        async fn invalidate(&self, identity_token: &str) -> Result<bool, DomainError> {
            self.inner.invalidate(identity_token).await
        }

        async fn sweep_expired(&self) -> Result<usize, DomainError> {
            self.inner.sweep_expired().await
        }

        async fn size(&self) -> Result<usize, DomainError> {
            self.inner.size().await
        }

        async fn clear(&self) -> Result<(), DomainError> {
            self.inner.clear().await
        }

        fn backend_name(&self) -> &'static str {
            "pausing"
        }
    }

    fn hashing_fixture() -> Fixture {
        fixture(
            SemanticCacheConfig::default(),
            Arc::new(HashingEmbeddingProvider::default()),
        )
    }

    #[tokio::test]
    async fn test_exact_hit_skips_second_generator() {
        let f = hashing_fixture();
        let first = Arc::new(MockResponseGenerator::new("first"));
        let second = Arc::new(MockResponseGenerator::new("second"));

        let generated = f.coordinator.resolve_text("What is Rust?", first.clone()).await.unwrap();
        let cached = f.coordinator.resolve_text("What is Rust?", second.clone()).await.unwrap();

        assert_eq!(generated.source, ResolutionSource::Generated { persisted: true });
        assert_eq!(cached.response, "first");
        assert_eq!(cached.source, ResolutionSource::ExactHit);
        assert_eq!(cached.hit_count, 1);
        assert_eq!(cached.model_id.as_deref(), Some("mock-model"));
        assert_eq!(first.calls(), 1);
        assert_eq!(second.calls(), 0);
    }

    #[tokio::test]
    async fn test_whitespace_and_case_variant_hits_cache() {
        let f = hashing_fixture();
        let generator = Arc::new(MockResponseGenerator::new("Hi!"));

        let first = f.coordinator.resolve_text("Hello world", generator.clone()).await.unwrap();
        let second = f
            .coordinator
            .resolve_text("hello   world", generator.clone())
            .await
            .unwrap();

        assert_eq!(first.identity_token, second.identity_token);
        assert_eq!(second.response, "Hi!");
        assert_eq!(second.source, ResolutionSource::ExactHit);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolutions_generate_once() {
        let f = hashing_fixture();
        let generator = Arc::new(
            MockResponseGenerator::new("shared answer").with_delay(Duration::from_millis(200)),
        );
        let signature = f.coordinator.signatures().generate("Tell me a joke").await.unwrap();

        let callers = (0..10).map(|_| {
            let coordinator = f.coordinator.clone();
            let signature = signature.clone();
            let generator: Arc<dyn ResponseGenerator> = generator.clone();

            tokio::spawn(async move { coordinator.resolve(&signature, generator).await })
        });

        let results: Vec<Resolution> = futures::future::join_all(callers)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        assert_eq!(generator.calls(), 1);
        assert!(results.iter().all(|r| r.response == "shared answer"));
        assert_eq!(results.iter().filter(|r| !r.shared).count(), 1);

        let stats = f.coordinator.stats().await.unwrap();
        assert_eq!(stats.generations, 1);
        assert_eq!(stats.coalesced_waiters, 9);
        assert_eq!(stats.entries, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_failure_reaches_every_waiter() {
        let f = hashing_fixture();
        let generator = Arc::new(
            MockResponseGenerator::new("unused")
                .with_delay(Duration::from_millis(200))
                .with_error("timeout", "backend too slow"),
        );
        let signature = f.coordinator.signatures().generate("Tell me a joke").await.unwrap();

        let callers = (0..10).map(|_| {
            let coordinator = f.coordinator.clone();
            let signature = signature.clone();
            let generator: Arc<dyn ResponseGenerator> = generator.clone();

            tokio::spawn(async move { coordinator.resolve(&signature, generator).await })
        });

        let results = futures::future::join_all(callers).await;

        assert_eq!(generator.calls(), 1);
        for result in results {
            let error = result.unwrap().unwrap_err();
            assert_eq!(error.kind(), "timeout");
        }

        let history = f.heuristics.history(signature.identity_token());
        assert_eq!(history.len(), 1);
        assert!(!history[0].success());
        assert_eq!(history[0].error_kind(), Some("timeout"));
        assert_eq!(f.store.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_generation_is_not_cached_and_retries() {
        let f = hashing_fixture();
        let generator = Arc::new(MockResponseGenerator::new("recovered").with_script(vec![Err(
            DomainError::generation("http_500", "boom"),
        )]));

        let failed = f.coordinator.resolve_text("flaky prompt", generator.clone()).await;
        let retried = f.coordinator.resolve_text("flaky prompt", generator.clone()).await.unwrap();

        assert!(matches!(failed, Err(DomainError::Generation { .. })));
        assert_eq!(retried.response, "recovered");
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_caller_does_not_abort_generation() {
        let f = hashing_fixture();
        let generator = Arc::new(
            MockResponseGenerator::new("finished").with_delay(Duration::from_millis(150)),
        );
        let signature = f.coordinator.signatures().generate("slow prompt").await.unwrap();

        let abandoned = {
            let coordinator = f.coordinator.clone();
            let signature = signature.clone();
            let generator: Arc<dyn ResponseGenerator> = generator.clone();
            tokio::spawn(async move { coordinator.resolve(&signature, generator).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        abandoned.abort();

        let waiter = f
            .coordinator
            .resolve(&signature, generator.clone())
            .await
            .unwrap();

        assert_eq!(waiter.response, "finished");
        assert!(waiter.shared);
        assert_eq!(generator.calls(), 1);
        assert!(f.store.get(signature.identity_token()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_fuzzy_hit_serves_near_duplicate() {
        let f = fixture(SemanticCacheConfig::default(), fixed_embeddings());
        let generator = Arc::new(MockResponseGenerator::new("ownership answer"));

        f.coordinator.resolve_text(PROMPT_A, generator.clone()).await.unwrap();
        let near = f.coordinator.resolve_text(PROMPT_B, generator.clone()).await.unwrap();
        let far = f.coordinator.resolve_text(PROMPT_C, generator.clone()).await.unwrap();

        match near.source {
            ResolutionSource::FuzzyHit {
                similarity,
                ref matched_token,
            } => {
                assert!(similarity >= 0.95);
                assert_ne!(matched_token, &near.identity_token);
            }
            ref other => panic!("expected fuzzy hit, got {:?}", other),
        }
        assert_eq!(near.response, "ownership answer");
        assert_eq!(near.hit_count, 1);
        assert!(!far.source.is_hit());
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_fuzzy_threshold_boundary() {
        let score = similarity_score(&[0.96, 0.28], &[1.0, 0.0]);

        let inclusive = fixture(
            SemanticCacheConfig::default().with_similarity_threshold(score),
            fixed_embeddings(),
        );
        let generator = Arc::new(MockResponseGenerator::new("answer"));
        inclusive.coordinator.resolve_text(PROMPT_A, generator.clone()).await.unwrap();
        let at_threshold = inclusive
            .coordinator
            .resolve_text(PROMPT_B, generator.clone())
            .await
            .unwrap();
        assert!(matches!(at_threshold.source, ResolutionSource::FuzzyHit { .. }));

        let exclusive = fixture(
            SemanticCacheConfig::default().with_similarity_threshold(score + f32::EPSILON),
            fixed_embeddings(),
        );
        let generator = Arc::new(MockResponseGenerator::new("answer"));
        exclusive.coordinator.resolve_text(PROMPT_A, generator.clone()).await.unwrap();
        let below = exclusive
            .coordinator
            .resolve_text(PROMPT_B, generator.clone())
            .await
            .unwrap();
        assert!(matches!(below.source, ResolutionSource::Generated { .. }));
    }

    #[tokio::test]
    async fn test_expired_entry_is_regenerated() {
        let f = fixture(
            SemanticCacheConfig::default().with_ttl(Duration::from_secs(1)),
            fixed_embeddings(),
        );
        let generator = Arc::new(MockResponseGenerator::new("fresh"));
        let signature = f.coordinator.signatures().generate(PROMPT_A).await.unwrap();

        f.coordinator.resolve(&signature, generator.clone()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(f.store.get(signature.identity_token()).await.unwrap().is_none());

        // A near duplicate must not be served from the expired entry either
        let near = f.coordinator.resolve_text(PROMPT_B, generator.clone()).await.unwrap();
        assert!(matches!(near.source, ResolutionSource::Generated { .. }));
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_declining_signature_is_not_persisted() {
        let config = SemanticCacheConfig::default().with_eligibility(4, 0.75);
        let f = fixture(config, Arc::new(HashingEmbeddingProvider::default()));
        let generator = Arc::new(MockResponseGenerator::new("finally").with_script(vec![
            Err(DomainError::generation("timeout", "1")),
            Err(DomainError::generation("timeout", "2")),
            Err(DomainError::generation("timeout", "3")),
        ]));

        for _ in 0..3 {
            assert!(f.coordinator.resolve_text("unstable prompt", generator.clone()).await.is_err());
        }

        let resolution = f
            .coordinator
            .resolve_text("unstable prompt", generator.clone())
            .await
            .unwrap();

        assert_eq!(resolution.response, "finally");
        assert_eq!(resolution.source, ResolutionSource::Generated { persisted: false });
        assert!(f.store.get(&resolution.identity_token).await.unwrap().is_none());
        assert_eq!(f.index.size().await.unwrap(), 0);
        assert_eq!(f.coordinator.stats().await.unwrap().unpersisted_responses, 1);
        assert_eq!(
            f.heuristics.eligibility(&resolution.identity_token),
            Eligibility::Ineligible
        );
    }

    #[tokio::test]
    async fn test_unavailable_store_falls_back_to_generation() {
        let mut store = MockCacheStore::new();
        store
            .expect_get()
            .returning(|_| Err(DomainError::store_unavailable("connection refused")));
        store.expect_put().never();
        store.expect_backend_name().return_const("mock");

        let coordinator = SemanticCacheCoordinator::new(
            Arc::new(store),
            Arc::new(FlatSimilarityIndex::new()),
            Arc::new(InMemoryHeuristicsTracker::new(EligibilityPolicy::default())),
            SignatureGenerator::new(Arc::new(HashingEmbeddingProvider::default())),
        );
        let generator = Arc::new(MockResponseGenerator::new("live answer"));

        let resolution = coordinator.resolve_text("any prompt", generator.clone()).await.unwrap();

        assert_eq!(resolution.response, "live answer");
        assert_eq!(resolution.source, ResolutionSource::Generated { persisted: false });
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_falls_back_to_generation() {
        let mut store = MockCacheStore::new();
        store
            .expect_get()
            .returning(|_| Err(DomainError::internal("Corrupt cache entry 'abc': expected value")));
        store.expect_put().never();
        store.expect_backend_name().return_const("mock");

        let coordinator = SemanticCacheCoordinator::new(
            Arc::new(store),
            Arc::new(FlatSimilarityIndex::new()),
            Arc::new(InMemoryHeuristicsTracker::new(EligibilityPolicy::default())),
            SignatureGenerator::new(Arc::new(HashingEmbeddingProvider::default())),
        );
        let generator = Arc::new(MockResponseGenerator::new("live answer"));

        for _ in 0..2 {
            let resolution = coordinator.resolve_text("any prompt", generator.clone()).await.unwrap();

            assert_eq!(resolution.response, "live answer");
            assert_eq!(resolution.source, ResolutionSource::Generated { persisted: false });
        }

        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_lost_telemetry_does_not_fail_resolution() {
        let store = Arc::new(InMemoryCacheStore::new());
        let heuristics = Arc::new(InMemoryHeuristicsTracker::poisoned(EligibilityPolicy::default()));
        let coordinator = SemanticCacheCoordinator::new(
            store.clone(),
            Arc::new(FlatSimilarityIndex::new()),
            heuristics.clone(),
            SignatureGenerator::new(Arc::new(HashingEmbeddingProvider::default())),
        );
        let generator = Arc::new(MockResponseGenerator::new("answer"));

        let resolution = coordinator.resolve_text("What is Rust?", generator.clone()).await.unwrap();

        assert_eq!(resolution.response, "answer");
        assert_eq!(resolution.source, ResolutionSource::Generated { persisted: true });
        assert!(heuristics.history(&resolution.identity_token).is_empty());
        assert_eq!(heuristics.eligibility(&resolution.identity_token), Eligibility::Undecided);
        assert!(store.get(&resolution.identity_token).await.unwrap().is_some());

        let cached = coordinator.resolve_text("What is Rust?", generator.clone()).await.unwrap();
        assert_eq!(cached.source, ResolutionSource::ExactHit);
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_sweep_keeps_vector_reinserted_during_sweep() {
        let store = Arc::new(PausingStore::default());
        let index = Arc::new(FlatSimilarityIndex::new());
        let coordinator = SemanticCacheCoordinator::new(
            store.clone(),
            index.clone(),
            Arc::new(InMemoryHeuristicsTracker::new(EligibilityPolicy::default())),
            SignatureGenerator::new(Arc::new(HashingEmbeddingProvider::default())),
        );
        let generator = Arc::new(MockResponseGenerator::new("answer"));

        let first = coordinator.resolve_text("Hello world", generator.clone()).await.unwrap();
        let token = first.identity_token.clone();

        // Leave the vector behind without its entry
        store.invalidate(&token).await.unwrap();
        assert_eq!(index.size().await.unwrap(), 1);

        store.pause_next_get.store(true, Ordering::SeqCst);
        let sweep = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.sweep_expired().await })
        };

        // The sweep has seen the entry missing; regenerate before it removes anything
        store.paused.notified().await;
        let regenerated = coordinator.resolve_text("Hello world", generator.clone()).await.unwrap();
        store.resume.notify_one();

        let summary = sweep.await.unwrap().unwrap();

        assert_eq!(regenerated.source, ResolutionSource::Generated { persisted: true });
        assert_eq!(summary.vectors_removed, 0);
        assert!(store.get(&token).await.unwrap().is_some());

        let references = index.references(Some(VectorKind::CacheEntry)).await.unwrap();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].reference, VectorRef::cache_entry(&token));
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_generates_but_records() {
        let f = fixture(
            SemanticCacheConfig::default().with_enabled(false),
            Arc::new(HashingEmbeddingProvider::default()),
        );
        let generator = Arc::new(MockResponseGenerator::new("uncached"));

        let first = f.coordinator.resolve_text("same prompt", generator.clone()).await.unwrap();
        f.coordinator.resolve_text("same prompt", generator.clone()).await.unwrap();

        assert_eq!(generator.calls(), 2);
        assert_eq!(f.store.size().await.unwrap(), 0);
        assert_eq!(f.heuristics.history(&first.identity_token).len(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_prompt_removes_entry_and_vector() {
        let f = hashing_fixture();
        let generator = Arc::new(MockResponseGenerator::new("answer"));

        f.coordinator.resolve_text("Hello world", generator.clone()).await.unwrap();
        assert_eq!(f.index.size().await.unwrap(), 1);

        assert!(f.coordinator.invalidate_prompt("HELLO world").await.unwrap());
        assert!(!f.coordinator.invalidate_prompt("hello world").await.unwrap());
        assert_eq!(f.index.size().await.unwrap(), 0);

        f.coordinator.resolve_text("Hello world", generator.clone()).await.unwrap();
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_sweep_removes_vectors_of_missing_entries() {
        let f = hashing_fixture();
        let generator = Arc::new(MockResponseGenerator::new("answer"));

        let resolution = f.coordinator.resolve_text("Hello world", generator).await.unwrap();
        f.store.invalidate(&resolution.identity_token).await.unwrap();

        let summary = f.coordinator.sweep_expired().await.unwrap();

        assert_eq!(summary.vectors_removed, 1);
        assert_eq!(f.index.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_fn_generator_with_closure() {
        let f = hashing_fixture();
        let generator = Arc::new(
            FnGenerator::new(|signature: PromptSignature| async move {
                Ok(GeneratedResponse::new(signature.source_text().to_uppercase()))
            })
            .with_model_id("echo"),
        );

        let resolution = f.coordinator.resolve_text("shout this", generator).await.unwrap();

        assert_eq!(resolution.response, "SHOUT THIS");
        assert_eq!(resolution.model_id.as_deref(), Some("echo"));
    }
}
