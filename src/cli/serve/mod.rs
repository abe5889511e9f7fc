//! Serve command - runs the HTTP API and the expiry sweeper

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::create_router_with_state;
use crate::config::AppConfig;
use crate::infrastructure::observability::{create_metrics_router, init_metrics};
use crate::infrastructure::services::ExpirySweeper;

pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let metrics = init_metrics(&config.metrics);
    let state = crate::create_app_state_with_config(&config).await?;
    let sweeper = start_sweeper(&config, &state);

    let mut app: Router = create_router_with_state(state);
    if let Some(metrics) = metrics {
        app = app.merge(create_metrics_router(metrics, &config.metrics.path));
    }

    let addr = build_socket_addr(&config)?;
    info!("Starting semantic cache API on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    if let Some(sweeper) = sweeper {
        sweeper.stop().await;
    }

    served?;
    info!("Server shutdown complete");

    Ok(())
}

fn start_sweeper(config: &AppConfig, state: &crate::api::AppState) -> Option<ExpirySweeper> {
    if config.cache.sweep_interval_seconds == 0 {
        warn!("Expiry sweeper disabled; expired entries are reclaimed on lookup only");
        return None;
    }

    Some(ExpirySweeper::spawn(
        state.coordinator.clone(),
        Duration::from_secs(config.cache.sweep_interval_seconds),
    ))
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
