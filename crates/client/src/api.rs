//! REST API client for the drama record backend.
//!
//! Wraps the backend HTTP surface (list, show, create, update, liveness)
//! using [`reqwest`]. Transient failures (transport errors, 5xx, and
//! optionally 404 on lookups) are retried with the capped logarithmic
//! backoff; validation failures are terminal and surfaced verbatim.

use std::future::Future;

use serde::Deserialize;

use dramasync_core::backoff::delay_for_attempt;
use dramasync_core::drama::{DramaDraft, DramaIndex, DramaRecord};

use crate::config::ClientConfig;

/// HTTP client for the drama backend.
///
/// Created once per session from a [`ClientConfig`]; the inner
/// [`reqwest::Client`] pools connections across calls.
pub struct DramaApi {
    http: reqwest::Client,
    config: ClientConfig,
}

/// Success envelope returned by create/update calls (`{status, message}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMessage {
    pub status: String,
    pub message: String,
}

/// Error envelope the backend renders for 404/422 responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[allow(dead_code)]
    status: String,
    message: String,
}

/// Errors from the record API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.). Transient.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The record does not exist. A legitimate lookup result unless the
    /// client is configured to treat it as transient.
    #[error("Record not found")]
    NotFound,

    /// The backend rejected the payload (422). Never retried; the message
    /// is human-readable and surfaced to the caller verbatim.
    #[error("{message}")]
    Validation { message: String },

    /// Any other non-success response. Retried when the status is 5xx.
    #[error("Backend error ({status}): {body}")]
    Upstream { status: u16, body: String },
}

impl ApiError {
    /// Whether this failure may resolve on retry.
    fn is_transient(&self, retry_not_found: bool) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Upstream { status, .. } => *status >= 500,
            Self::NotFound => retry_not_found,
            Self::Validation { .. } => false,
        }
    }
}

impl DramaApi {
    /// Create a new API client from a session configuration.
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(http: reqwest::Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Liveness ping (`GET /up`).
    pub async fn up(&self) -> Result<(), ApiError> {
        let url = format!("{}/up", self.config.base_url);
        self.with_retry("up", false, || self.try_up(&url)).await
    }

    /// List all tracked dramas (`GET /dramas`).
    pub async fn list(&self) -> Result<Vec<DramaIndex>, ApiError> {
        let url = format!("{}/dramas", self.config.api_url());
        self.with_retry("list_dramas", false, || self.try_list(&url))
            .await
    }

    /// Fetch one record by display name (`GET /dramas/{name}`).
    ///
    /// Returns [`ApiError::NotFound`] for an absent record; that error is
    /// retried only when [`ClientConfig::retry_not_found`] is set.
    pub async fn get_by_name(&self, name: &str) -> Result<DramaRecord, ApiError> {
        let url = format!("{}/dramas/{}", self.config.api_url(), name);
        self.with_retry("get_drama", self.config.retry_not_found, || {
            self.try_get(&url)
        })
        .await
    }

    /// Create a new record (`POST /dramas` with `{"drama": {...}}`).
    ///
    /// The backend treats create as idempotent-on-conflict: a duplicated
    /// in-flight create after a transport failure resolves to an update
    /// of the existing record.
    pub async fn create(&self, draft: &DramaDraft) -> Result<ApiMessage, ApiError> {
        let url = format!("{}/dramas", self.config.api_url());
        self.with_retry("create_drama", false, || self.try_create(&url, draft))
            .await
    }

    /// Apply a sparse update (`PATCH /dramas/{name}` with `{"drama": {...}}`).
    ///
    /// `patch` carries only the changed leaves plus the `id`/`name`
    /// identity fields from the differ.
    pub async fn update(
        &self,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<ApiMessage, ApiError> {
        let url = format!("{}/dramas/{}", self.config.api_url(), name);
        self.with_retry("update_drama", false, || self.try_update(&url, patch))
            .await
    }

    // ---- single-attempt calls ----

    async fn try_up(&self, url: &str) -> Result<(), ApiError> {
        let response = self.http.get(url).send().await?;
        Self::check_status(response).await
    }

    async fn try_list(&self, url: &str) -> Result<Vec<DramaIndex>, ApiError> {
        let response = self.http.get(url).send().await?;
        Self::parse_response(response).await
    }

    async fn try_get(&self, url: &str) -> Result<DramaRecord, ApiError> {
        let response = self.http.get(url).send().await?;
        Self::parse_response(response).await
    }

    async fn try_create(&self, url: &str, draft: &DramaDraft) -> Result<ApiMessage, ApiError> {
        let body = serde_json::json!({ "drama": draft });
        let response = self.http.post(url).json(&body).send().await?;
        Self::parse_response(response).await
    }

    async fn try_update(
        &self,
        url: &str,
        patch: &serde_json::Value,
    ) -> Result<ApiMessage, ApiError> {
        let body = serde_json::json!({ "drama": patch });
        let response = self.http.patch(url).json(&body).send().await?;
        Self::parse_response(response).await
    }

    // ---- retry plumbing ----

    /// Run `call` until it succeeds, the failure is terminal, or the
    /// configured attempt ceiling is exhausted. The last error is
    /// surfaced unchanged.
    async fn with_retry<T, F, Fut>(
        &self,
        op: &'static str,
        retry_not_found: bool,
        mut call: F,
    ) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 0u32;

        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    attempt += 1;
                    if !error.is_transient(retry_not_found) || attempt > self.config.retry.attempts
                    {
                        return Err(error);
                    }

                    let delay = delay_for_attempt(attempt, &self.config.retry);
                    tracing::warn!(
                        op,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Transient failure, retrying",
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Map a non-success response to the error taxonomy, keeping the
    /// backend's human-readable message for 422s.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());

        Err(match status.as_u16() {
            404 => ApiError::NotFound,
            422 => ApiError::Validation {
                message: serde_json::from_str::<ErrorBody>(&body)
                    .map(|e| e.message)
                    .unwrap_or(body),
            },
            status => ApiError::Upstream { status, body },
        })
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
