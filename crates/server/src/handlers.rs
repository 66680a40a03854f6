//! Record endpoint handlers.
//!
//! Response envelopes mirror the wire contract: success and error paths
//! both render `{"status": ..., "message": ...}`; show responses inline
//! the record fields next to a `"status": "success"` marker.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use dramasync_core::drama::{DramaDraft, DramaRecord};
use dramasync_store::StoreError;

use crate::state::AppState;

/// Request envelope for create/update: `{"drama": {...}}`.
#[derive(Debug, Deserialize)]
pub struct DramaEnvelope<T> {
    pub drama: T,
}

/// `{"status": ..., "message": ...}` body for success and error paths.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub status: &'static str,
    pub message: String,
}

/// Full record body with the `"status": "success"` marker inlined.
#[derive(Debug, Serialize)]
pub struct ShowBody {
    pub status: &'static str,
    #[serde(flatten)]
    pub drama: DramaRecord,
}

impl MessageBody {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

/// Map store failures onto the wire contract: 404 for missing records,
/// 422 with the validation sentence verbatim.
fn error_response(error: StoreError) -> Response {
    match error {
        StoreError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(MessageBody::error("Drama not found")),
        )
            .into_response(),
        StoreError::Validation(message) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(MessageBody::error(message)),
        )
            .into_response(),
    }
}

/// GET /up — liveness probe.
pub async fn up() -> StatusCode {
    StatusCode::OK
}

/// GET /api/v1/dramas — index records, ordered by id.
pub async fn list(State(state): State<AppState>) -> Response {
    match state.store.list().await {
        Ok(index) => Json(index).into_response(),
        Err(error) => error_response(error),
    }
}

/// GET /api/v1/dramas/{name} — full record or typed 404.
pub async fn show(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.store.get(&name).await {
        Ok(Some(drama)) => Json(ShowBody {
            status: "success",
            drama,
        })
        .into_response(),
        Ok(None) => error_response(StoreError::NotFound),
        Err(error) => error_response(error),
    }
}

/// POST /api/v1/dramas — create, resolving name conflicts to an update.
pub async fn create(
    State(state): State<AppState>,
    Json(envelope): Json<DramaEnvelope<DramaDraft>>,
) -> Response {
    let name = envelope.drama.name.clone();
    match state.store.create(envelope.drama).await {
        Ok(outcome) => {
            tracing::info!(name = %name, outcome = ?outcome, "Drama persisted");
            (
                StatusCode::CREATED,
                Json(MessageBody::success(outcome.message())),
            )
                .into_response()
        }
        Err(error) => error_response(error),
    }
}

/// PATCH /api/v1/dramas/{name} — apply a sparse update.
pub async fn update(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(envelope): Json<DramaEnvelope<serde_json::Value>>,
) -> Response {
    match state.store.update(&name, &envelope.drama).await {
        Ok(outcome) => {
            tracing::info!(name = %name, "Drama updated");
            Json(MessageBody::success(outcome.message())).into_response()
        }
        Err(error) => error_response(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::build_router;

    fn app() -> axum::Router {
        build_router(AppState::in_memory())
    }

    fn create_body(name: &str, last_watched: u32) -> String {
        serde_json::json!({
            "drama": {
                "name": name,
                "description": "",
                "total_episodes": 16,
                "last_watched_episode": last_watched,
                "country": "South Korea",
                "airing_status": "ongoing",
                "poster_url": null,
                "metadata": null,
            }
        })
        .to_string()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn up_returns_ok() {
        let response = app()
            .oneshot(Request::get("/up").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn create_then_show_round_trip() {
        let app = app();

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/v1/dramas")
                    .header("content-type", "application/json")
                    .body(Body::from(create_body("Show A", 4)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "Created!");

        let response = app
            .oneshot(
                Request::get("/api/v1/dramas/Show%20A")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["name"], "Show A");
        assert_eq!(body["watch_status"], "watching");
    }

    #[tokio::test]
    async fn show_missing_returns_typed_404() {
        let response = app()
            .oneshot(
                Request::get("/api/v1/dramas/Nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Drama not found");
    }

    #[tokio::test]
    async fn invalid_create_returns_422_with_message() {
        let body = serde_json::json!({
            "drama": {
                "name": "",
                "total_episodes": 16,
                "last_watched_episode": 0,
                "poster_url": null,
                "metadata": null,
            }
        })
        .to_string();

        let response = app()
            .oneshot(
                Request::post("/api/v1/dramas")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Name can't be blank");
    }

    #[tokio::test]
    async fn duplicate_create_reports_updated() {
        let app = app();

        for expected in ["Created!", "Updated!"] {
            let response = app
                .clone()
                .oneshot(
                    Request::post("/api/v1/dramas")
                        .header("content-type", "application/json")
                        .body(Body::from(create_body("Show A", 4)))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            assert_eq!(body_json(response).await["message"], expected);
        }
    }

    #[tokio::test]
    async fn patch_updates_and_missing_patch_404s() {
        let app = app();
        app.clone()
            .oneshot(
                Request::post("/api/v1/dramas")
                    .header("content-type", "application/json")
                    .body(Body::from(create_body("Show A", 4)))
                    .unwrap(),
            )
            .await
            .unwrap();

        let patch = serde_json::json!({"drama": {"last_watched_episode": 5}}).to_string();
        let response = app
            .clone()
            .oneshot(
                Request::patch("/api/v1/dramas/Show%20A")
                    .header("content-type", "application/json")
                    .body(Body::from(patch.clone()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["message"], "Updated!");

        let response = app
            .oneshot(
                Request::patch("/api/v1/dramas/Nope")
                    .header("content-type", "application/json")
                    .body(Body::from(patch))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
