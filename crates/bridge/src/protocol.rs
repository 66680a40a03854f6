//! Typed message contract carried across the bridge.
//!
//! Requests and responses serialize with the shape
//! `{"op": "<kind>", "data": {...}}` so the contract survives a real
//! process boundary unchanged. Malformed text fails only the single call
//! it belonged to.

use serde::{Deserialize, Serialize};

use dramasync_core::drama::{DramaDraft, DramaIndex, DramaRecord};

/// Operations the observer context may request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum BridgeRequest {
    /// Liveness ping; carries no payload.
    Up,

    /// Fetch the ordered list of index records.
    GetDramas,

    /// Fetch one full record by display name.
    GetDrama { name: String },

    /// Create a new tracked drama.
    CreateDrama(DramaDraft),

    /// Apply a sparse update. The payload must carry `id` and `name`
    /// identity fields alongside the changed leaves.
    UpdateDrama(serde_json::Value),
}

/// Typed outcome of a bridge request.
///
/// Failures travel as data, not as faults, so the observer context can
/// branch on them and decide whether to retry the whole pass on the next
/// navigation or timer tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum BridgeResponse {
    /// Liveness acknowledged.
    Ack,

    /// Index records for `get_dramas`.
    Dramas(Vec<DramaIndex>),

    /// Full record for `get_drama`.
    Drama(DramaRecord),

    /// The requested record does not exist (drives the create decision).
    NotFound { message: String },

    /// A create/update was persisted.
    Success { message: String },

    /// The call failed: validation text verbatim, or a transport
    /// description after retries were exhausted.
    Error { message: String },
}

/// Parse a serialized bridge request.
///
/// Returns `Err` for malformed JSON or unknown `op` values; the error is
/// fatal to this call only.
pub fn parse_request(text: &str) -> Result<BridgeRequest, serde_json::Error> {
    serde_json::from_str(text)
}

/// Parse a serialized bridge response.
pub fn parse_response(text: &str) -> Result<BridgeResponse, serde_json::Error> {
    serde_json::from_str(text)
}
