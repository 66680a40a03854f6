//! Application router.

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the full application [`Router`].
///
/// The liveness probe lives at the root; record operations are nested
/// under `/api/v1`.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/dramas", get(handlers::list).post(handlers::create))
        .route(
            "/dramas/{name}",
            get(handlers::show).patch(handlers::update),
        );

    Router::new()
        .route("/up", get(handlers::up))
        .nest("/api/v1", api)
        .with_state(state)
}
