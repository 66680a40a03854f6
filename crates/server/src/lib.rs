//! Reference REST surface over the record store.
//!
//! Exposes the wire contract the retrying client consumes: `GET /up`,
//! `GET /api/v1/dramas`, `GET /api/v1/dramas/{name}`, `POST /api/v1/dramas`
//! and `PATCH /api/v1/dramas/{name}`, with `{status, message}` envelopes
//! on success and error paths. Backed by any [`dramasync_store::RecordStore`];
//! production wiring wraps the store in a [`dramasync_store::CachedStore`]
//! so the cache-invalidation contract holds for every write.

pub mod handlers;
pub mod router;
pub mod state;

use std::net::SocketAddr;

pub use router::build_router;
pub use state::AppState;

/// Bind the server on an ephemeral localhost port and serve in a
/// background task. Returns the bound address.
///
/// Used by integration tests and local tooling; production deployments
/// bind an explicit address through [`build_router`].
pub async fn spawn_ephemeral(state: AppState) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = build_router(state);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "Record server exited");
        }
    });

    Ok(addr)
}
