//! Network-context worker: owns the retrying client and serves the
//! bridge until shutdown.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dramasync_bridge::{bridge, serve, BridgeRequest, BridgeResponse};
use dramasync_client::{ClientConfig, DramaApi};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dramasync_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env();
    tracing::info!(base_url = %config.base_url, "Loaded client configuration");

    let api = Arc::new(DramaApi::new(config));
    let (handle, listener) = bridge();
    let cancel = CancellationToken::new();

    let serve_task = tokio::spawn(serve(listener, Arc::clone(&api), cancel.clone()));

    // Verify the wiring end to end before reporting ready.
    match handle.request(BridgeRequest::Up).await {
        Ok(BridgeResponse::Ack) => tracing::info!("Backend reachable, worker ready"),
        Ok(other) => tracing::warn!(?other, "Unexpected liveness response"),
        Err(error) => tracing::warn!(%error, "Liveness ping failed, continuing anyway"),
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    cancel.cancel();
    serve_task.await?;

    tracing::info!("Worker stopped");
    Ok(())
}
