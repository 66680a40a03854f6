//! Asynchronous request/response boundary between the page-observing
//! context and the network-performing context.
//!
//! The observer context holds a [`BridgeHandle`] and suspends on each
//! request; the network context runs [`serve`] over the paired
//! [`BridgeListener`], dispatching every request to the retrying REST
//! client. No shared mutable state crosses the boundary. The bridge
//! itself has no timeout layer; timeouts belong to the client beneath it.

pub mod channel;
pub mod protocol;
pub mod serve;

pub use channel::{bridge, BridgeError, BridgeHandle, BridgeListener};
pub use protocol::{BridgeRequest, BridgeResponse};
pub use serve::serve;
