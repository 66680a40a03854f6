//! In-memory reference implementation of [`RecordStore`].
//!
//! Enforces the record invariants on every write: field limits, the
//! `0 <= last_watched_episode <= total_episodes` bound, and derived
//! `watch_status`. Each write is atomic; a failed write leaves the
//! previous state unchanged.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dramasync_core::drama::{DramaDraft, DramaIndex, DramaRecord, WatchStatus};
use dramasync_core::types::RecordId;

use crate::{to_sentence, RecordStore, StoreError, WriteOutcome};

/// In-memory record store keyed by unique display name.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: RecordId,
    records: HashMap<String, DramaRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self) -> Result<Vec<DramaIndex>, StoreError> {
        let inner = self.inner.read().await;
        let mut index: Vec<DramaIndex> = inner.records.values().map(DramaIndex::from).collect();
        index.sort_by_key(|record| record.id);
        Ok(index)
    }

    async fn get(&self, name: &str) -> Result<Option<DramaRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.records.get(name).cloned())
    }

    async fn create(&self, draft: DramaDraft) -> Result<WriteOutcome, StoreError> {
        let errors = draft.validate();
        if !errors.is_empty() {
            return Err(StoreError::Validation(to_sentence(&errors)));
        }

        let mut inner = self.inner.write().await;

        if let Some(existing) = inner.records.get(&draft.name) {
            // Conflict resolves to an update of the existing record.
            let id = existing.id;
            let record = record_from_draft(id, draft);
            inner.records.insert(record.name.clone(), record);
            return Ok(WriteOutcome::Updated);
        }

        inner.next_id += 1;
        let record = record_from_draft(inner.next_id, draft);
        tracing::debug!(id = record.id, name = %record.name, "Record created");
        inner.records.insert(record.name.clone(), record);
        Ok(WriteOutcome::Created)
    }

    async fn update(
        &self,
        name: &str,
        patch: &serde_json::Value,
    ) -> Result<WriteOutcome, StoreError> {
        let mut inner = self.inner.write().await;

        let existing = inner.records.get(name).ok_or(StoreError::NotFound)?;
        let stored_id = existing.id;

        let mut merged = serde_json::to_value(existing)
            .map_err(|e| StoreError::Validation(e.to_string()))?;
        merge_patch(&mut merged, patch);

        let mut updated: DramaRecord = serde_json::from_value(merged)
            .map_err(|_| StoreError::Validation("Drama payload is malformed".to_string()))?;

        // The id is assigned by the store; identity fields in the patch
        // address the record but never reassign it.
        updated.id = stored_id;
        updated.watch_status =
            WatchStatus::derive(updated.last_watched_episode, updated.total_episodes);

        let errors = updated.validate();
        if !errors.is_empty() {
            return Err(StoreError::Validation(to_sentence(&errors)));
        }

        // A rename moves the record under its new unique name.
        if updated.name != name {
            inner.records.remove(name);
        }
        tracing::debug!(id = updated.id, name = %updated.name, "Record updated");
        inner.records.insert(updated.name.clone(), updated);
        Ok(WriteOutcome::Updated)
    }
}

/// Build a full record from a create draft.
fn record_from_draft(id: RecordId, draft: DramaDraft) -> DramaRecord {
    let watch_status = WatchStatus::derive(draft.last_watched_episode, draft.total_episodes);
    DramaRecord {
        id,
        name: draft.name,
        description: Some(draft.description),
        total_episodes: draft.total_episodes,
        last_watched_episode: draft.last_watched_episode,
        watch_status,
        airing_status: draft.airing_status,
        country: draft.country,
        poster_url: draft.poster_url,
        metadata: draft.metadata,
    }
}

/// Deep-merge `patch` into `target`: objects merge recursively, every
/// other value replaces.
fn merge_patch(target: &mut serde_json::Value, patch: &serde_json::Value) {
    match (target, patch) {
        (serde_json::Value::Object(target_map), serde_json::Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                match target_map.get_mut(key) {
                    Some(existing) if existing.is_object() && patch_value.is_object() => {
                        merge_patch(existing, patch_value);
                    }
                    _ => {
                        target_map.insert(key.clone(), patch_value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}
