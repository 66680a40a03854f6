//! In-process request/response channel pair.
//!
//! [`bridge`] returns an observer-side [`BridgeHandle`] and a
//! network-side [`BridgeListener`]. Each request carries its own oneshot
//! reply slot; the caller suspends until the response arrives or the
//! other side tears down. At-most-one-in-flight is not enforced here —
//! callers that need ordering await each request before the next.

use tokio::sync::{mpsc, oneshot};

use crate::protocol::{BridgeRequest, BridgeResponse};

/// Buffer capacity for pending requests.
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// One in-flight request plus its reply slot.
pub struct Envelope {
    pub request: BridgeRequest,
    pub reply: oneshot::Sender<BridgeResponse>,
}

/// Observer-side sender. Cheap to clone; one per page context.
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::Sender<Envelope>,
}

/// Network-side receiver, consumed by [`crate::serve`].
pub struct BridgeListener {
    rx: mpsc::Receiver<Envelope>,
}

/// Errors crossing the bridge itself (not the operations carried on it).
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The network context has shut down; no response will ever arrive.
    #[error("Bridge closed")]
    Closed,
}

/// Create a connected handle/listener pair.
pub fn bridge() -> (BridgeHandle, BridgeListener) {
    let (tx, rx) = mpsc::channel(REQUEST_CHANNEL_CAPACITY);
    (BridgeHandle { tx }, BridgeListener { rx })
}

impl BridgeHandle {
    /// Send a request and suspend until its response arrives.
    ///
    /// There is no timeout at this layer; the client beneath the listener
    /// bounds how long an operation can take.
    pub async fn request(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Envelope {
                request,
                reply: reply_tx,
            })
            .await
            .map_err(|_| BridgeError::Closed)?;

        reply_rx.await.map_err(|_| BridgeError::Closed)
    }
}

impl BridgeListener {
    /// Receive the next pending request.
    ///
    /// Returns `None` once every [`BridgeHandle`] has been dropped.
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}
