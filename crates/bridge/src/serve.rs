//! Network-context dispatch loop.
//!
//! [`serve`] drains the [`BridgeListener`], forwards each request to the
//! retrying [`DramaApi`], and maps client errors into typed responses.
//! Requests are handled one at a time in arrival order; a caller that has
//! navigated away simply never reads its reply.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use dramasync_client::{ApiError, DramaApi};

use crate::channel::BridgeListener;
use crate::protocol::{BridgeRequest, BridgeResponse};

/// Run the dispatch loop until cancellation or until every handle is gone.
pub async fn serve(mut listener: BridgeListener, api: Arc<DramaApi>, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Bridge serve loop cancelled");
                return;
            }
            envelope = listener.recv() => {
                let Some(envelope) = envelope else {
                    tracing::info!("All bridge handles dropped, serve loop exiting");
                    return;
                };

                let response = dispatch(&api, envelope.request).await;
                // The caller may have torn down; its missing reply slot is
                // not an error.
                let _ = envelope.reply.send(response);
            }
        }
    }
}

/// Handle one request, translating client errors into response data.
pub async fn dispatch(api: &DramaApi, request: BridgeRequest) -> BridgeResponse {
    match request {
        BridgeRequest::Up => match api.up().await {
            Ok(()) => BridgeResponse::Ack,
            Err(error) => error_response(error),
        },

        BridgeRequest::GetDramas => match api.list().await {
            Ok(dramas) => BridgeResponse::Dramas(dramas),
            Err(error) => error_response(error),
        },

        BridgeRequest::GetDrama { name } => {
            if name.trim().is_empty() {
                return BridgeResponse::Error {
                    message: "Drama name cannot be empty.".to_string(),
                };
            }
            match api.get_by_name(&name).await {
                Ok(record) => BridgeResponse::Drama(record),
                Err(ApiError::NotFound) => BridgeResponse::NotFound {
                    message: "Drama not found".to_string(),
                },
                Err(error) => error_response(error),
            }
        }

        BridgeRequest::CreateDrama(draft) => match api.create(&draft).await {
            Ok(message) => BridgeResponse::Success {
                message: message.message,
            },
            Err(error) => error_response(error),
        },

        BridgeRequest::UpdateDrama(patch) => {
            if patch.get("id").is_none_or(serde_json::Value::is_null) {
                return BridgeResponse::Error {
                    message: "Drama ID is required.".to_string(),
                };
            }
            let Some(name) = patch.get("name").and_then(|v| v.as_str()).map(String::from) else {
                return BridgeResponse::Error {
                    message: "Drama name is required.".to_string(),
                };
            };
            match api.update(&name, &patch).await {
                Ok(message) => BridgeResponse::Success {
                    message: message.message,
                },
                Err(ApiError::NotFound) => BridgeResponse::NotFound {
                    message: "Drama not found".to_string(),
                },
                Err(error) => error_response(error),
            }
        }
    }
}

fn error_response(error: ApiError) -> BridgeResponse {
    BridgeResponse::Error {
        message: error.to_string(),
    }
}
