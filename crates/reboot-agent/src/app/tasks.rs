use std::time::Duration;

use anyhow::Result;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::reconcile::EventConsumer;

/// Cancel `cancellation_token` on SIGTERM or SIGINT.
pub fn spawn_signal_handler(cancellation_token: CancellationToken) -> Result<JoinHandle<()>> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        Ok(tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, initiating graceful shutdown");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT, initiating graceful shutdown");
                }
            }
            cancellation_token.cancel();
        }))
    }
    #[cfg(not(unix))]
    {
        Ok(tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {e}");
                return;
            }
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
            cancellation_token.cancel();
        }))
    }
}

/// Wait for in-flight restarts, giving up after `timeout`.
pub async fn drain_with_timeout(consumer: &mut EventConsumer, timeout: Duration) {
    let in_flight = consumer.in_flight();
    if in_flight > 0 {
        tracing::info!("Waiting for {in_flight} in-flight restarts");
    }

    tokio::time::timeout(timeout, consumer.drain())
        .await
        .unwrap_or_else(|_| {
            tracing::warn!("Restart shutdown timed out after {:?}", timeout);
        });
}
