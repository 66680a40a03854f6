//! Retrying REST client for the drama record backend.
//!
//! [`api::DramaApi`] wraps the four record operations (list, get-by-name,
//! create, update) plus the liveness ping, and retries transient failures
//! with the capped logarithmic backoff from `dramasync_core::backoff`.

pub mod api;
pub mod config;

pub use api::{ApiError, ApiMessage, DramaApi};
pub use config::ClientConfig;
