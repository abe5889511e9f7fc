//! Background task reclaiming expired cache entries

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::SemanticCacheCoordinator;

/// Runs `SemanticCacheCoordinator::sweep_expired` on a fixed interval
#[derive(Debug)]
pub struct ExpirySweeper {
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl ExpirySweeper {
    /// Spawn the sweeper; the first sweep happens one interval after start
    pub fn spawn(coordinator: SemanticCacheCoordinator, interval: Duration) -> Self {
        let (shutdown, mut stop) = oneshot::channel();
        let period = interval.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(interval_ms = period.as_millis() as u64, "Expiry sweeper started");

            loop {
                tokio::select! {
                    _ = &mut stop => break,
                    _ = ticker.tick() => match coordinator.sweep_expired().await {
                        Ok(summary) => debug!(
                            entries_removed = summary.entries_removed,
                            vectors_removed = summary.vectors_removed,
                            "Expiry sweep finished"
                        ),
                        Err(e) => warn!(error = %e, "Expiry sweep failed"),
                    },
                }
            }

            info!("Expiry sweeper stopped");
        });

        Self {
            shutdown: Some(shutdown),
            handle,
        }
    }

    /// Stop the sweeper and wait for an in-progress sweep to finish
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        if let Err(e) = (&mut self.handle).await {
            warn!(error = %e, "Expiry sweeper task ended abnormally");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
