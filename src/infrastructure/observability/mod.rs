//! Observability infrastructure - Metrics

mod config;
mod metrics;

pub use config::MetricsConfig;
pub use metrics::{
    PrometheusMetrics, create_metrics_router, init_metrics, record_cache_lookup,
    record_coalesced_waiter, record_generation, record_http_request, record_ingested_chunks,
    record_unpersisted_response,
};
