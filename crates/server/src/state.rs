use std::sync::Arc;

use dramasync_store::{CachedStore, MemoryStore, RecordStore};

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Cheaply cloneable; the store sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The record store serving every read and write.
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// In-memory store behind the caching layer — the default wiring.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(CachedStore::new(MemoryStore::new())))
    }
}
