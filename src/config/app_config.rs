use serde::Deserialize;

use crate::domain::DomainError;
use crate::domain::semantic_cache::SemanticCacheConfig;
use crate::infrastructure::cache::{CacheBackend, CacheStoreConfig};
use crate::infrastructure::llm::DEFAULT_OLLAMA_BASE_URL;
use crate::infrastructure::observability::MetricsConfig;
use crate::infrastructure::retrieval::RetrievalSettings;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub retrieval: RetrievalSettings,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Cache store, coordinator and heuristics settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    #[serde(default = "default_cache_top_k")]
    pub top_k: usize,
    #[serde(default = "default_eligibility_window")]
    pub eligibility_window: usize,
    #[serde(default = "default_eligibility_threshold")]
    pub eligibility_threshold: f64,
    #[serde(default)]
    pub similarity_adaptivity: f32,
    /// Entry bound for the in-memory store; unbounded when absent
    #[serde(default)]
    pub max_entries: Option<u64>,
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_max_records_per_signature")]
    pub max_records_per_signature: usize,
}

/// Which embedder produces fingerprints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    Hashing,
    Ollama,
}

/// Inference backend settings
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub embedding: EmbeddingBackend,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Vector width of the hashing embedder
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Deployment environment variables recognised alongside the `APP__` ones
#[derive(Debug, Clone, Default)]
pub struct LegacyEnv {
    pub ollama_ip: Option<String>,
    pub model: Option<String>,
    pub redis_url: Option<String>,
    pub log_level: Option<String>,
}

impl LegacyEnv {
    pub fn from_env() -> Self {
        let read = |name: &str| std::env::var(name).ok().filter(|value| !value.trim().is_empty());

        Self {
            ollama_ip: read("OLLAMA_IP"),
            model: read("MODEL"),
            redis_url: read("REDIS_URL"),
            log_level: read("LOG_LEVEL"),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_ttl_seconds() -> u64 {
    3600
}

fn default_similarity_threshold() -> f32 {
    0.95
}

fn default_cache_top_k() -> usize {
    1
}

fn default_eligibility_window() -> usize {
    10
}

fn default_eligibility_threshold() -> f64 {
    0.5
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

fn default_namespace() -> String {
    "semcache".to_string()
}

fn default_max_records_per_signature() -> usize {
    256
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_BASE_URL.to_string()
}

fn default_model() -> String {
    "llama3:8b".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_dimensions() -> usize {
    256
}

fn default_timeout_seconds() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: default_ttl_seconds(),
            similarity_threshold: default_similarity_threshold(),
            top_k: default_cache_top_k(),
            eligibility_window: default_eligibility_window(),
            eligibility_threshold: default_eligibility_threshold(),
            similarity_adaptivity: 0.0,
            max_entries: None,
            sweep_interval_seconds: default_sweep_interval_seconds(),
            backend: CacheBackend::default(),
            redis_url: None,
            namespace: default_namespace(),
            max_records_per_signature: default_max_records_per_signature(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            model: default_model(),
            embedding: EmbeddingBackend::default(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: default_embedding_dimensions(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl CacheConfig {
    /// Coordinator settings derived from this section
    pub fn coordinator(&self) -> SemanticCacheConfig {
        SemanticCacheConfig {
            enabled: self.enabled,
            ttl_seconds: self.ttl_seconds,
            similarity_threshold: self.similarity_threshold.clamp(0.0, 1.0),
            top_k: self.top_k,
            eligibility_window: self.eligibility_window,
            eligibility_threshold: self.eligibility_threshold,
            similarity_adaptivity: self.similarity_adaptivity.clamp(0.0, 1.0),
        }
    }

    /// Store factory settings derived from this section
    pub fn store(&self) -> CacheStoreConfig {
        CacheStoreConfig {
            backend: self.backend,
            redis_url: self.redis_url.clone(),
            namespace: Some(self.namespace.clone()),
            max_entries: self.max_entries,
        }
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local`, `APP__*` and the legacy variables
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(LegacyEnv::from_env())
    }

    pub fn load_with(legacy: LegacyEnv) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // A bare REDIS_URL selects the durable store unless configured otherwise
        if legacy.redis_url.is_some() {
            builder = builder.set_default("cache.backend", "redis")?;
        }

        let config = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("backend.ollama_url", legacy.ollama_ip)?
            .set_override_option("backend.model", legacy.model)?
            .set_override_option("cache.redis_url", legacy.redis_url)?
            .set_override_option("logging.level", legacy.log_level)?
            .build()?;

        config.try_deserialize()
    }

    /// Reject settings the services cannot run with
    pub fn validate(&self) -> Result<(), DomainError> {
        let cache = &self.cache;

        if !(0.0..=1.0).contains(&cache.similarity_threshold) {
            return Err(DomainError::configuration(
                "cache.similarity_threshold must be between 0 and 1",
            ));
        }

        if !(0.0..=1.0).contains(&cache.eligibility_threshold) {
            return Err(DomainError::configuration(
                "cache.eligibility_threshold must be between 0 and 1",
            ));
        }

        if !(0.0..=1.0).contains(&cache.similarity_adaptivity) {
            return Err(DomainError::configuration(
                "cache.similarity_adaptivity must be between 0 and 1",
            ));
        }

        if cache.eligibility_window == 0 {
            return Err(DomainError::configuration("cache.eligibility_window must be at least 1"));
        }

        if cache.top_k == 0 || self.retrieval.top_k == 0 {
            return Err(DomainError::configuration("top_k must be at least 1"));
        }

        if cache.backend == CacheBackend::Redis && cache.redis_url.is_none() {
            return Err(DomainError::configuration(
                "cache.redis_url is required for the redis backend",
            ));
        }

        if !(0.0..=1.0).contains(&self.retrieval.min_score) {
            return Err(DomainError::configuration(
                "retrieval.min_score must be between 0 and 1",
            ));
        }

        self.retrieval.chunking().validate()?;

        if self.backend.embedding_dimensions == 0 {
            return Err(DomainError::configuration(
                "backend.embedding_dimensions must be at least 1",
            ));
        }

        Ok(())
    }
}
