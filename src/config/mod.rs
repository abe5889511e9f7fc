//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, BackendConfig, CacheConfig, EmbeddingBackend, LegacyEnv, LogFormat, LoggingConfig,
    ServerConfig,
};
