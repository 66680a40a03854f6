//! The record store collaborator: a single-entity CRUD store with a
//! cache-consistency contract.
//!
//! [`RecordStore`] is the storage seam the REST server sits on.
//! [`MemoryStore`] is the reference implementation enforcing the record
//! invariants; [`CachedStore`] wraps any store with a read-through cache
//! that invalidates precisely the affected keys on every write, before
//! the write is considered complete.

pub mod cached;
pub mod memory;

use async_trait::async_trait;

use dramasync_core::drama::{DramaDraft, DramaIndex, DramaRecord};

pub use cached::CachedStore;
pub use memory::MemoryStore;

/// Result of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
}

impl WriteOutcome {
    /// Success message rendered to the client.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Created => "Created!",
            Self::Updated => "Updated!",
        }
    }
}

/// Errors from the record store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the given name.
    #[error("Drama not found")]
    NotFound,

    /// The payload violated the record invariants. The message is a
    /// human-readable sentence suitable for a 422 body.
    #[error("{0}")]
    Validation(String),
}

/// Storage backend for drama records.
///
/// `create` is idempotent-on-conflict: creating a name that already
/// exists resolves to an update of the existing record, so duplicated
/// in-flight create retries cannot corrupt state.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records as index projections, ordered by id.
    async fn list(&self) -> Result<Vec<DramaIndex>, StoreError>;

    /// Fetch one record by display name.
    async fn get(&self, name: &str) -> Result<Option<DramaRecord>, StoreError>;

    /// Create a record, or update the existing record with the same name.
    async fn create(&self, draft: DramaDraft) -> Result<WriteOutcome, StoreError>;

    /// Apply a sparse patch to the record with the given name.
    ///
    /// The patch's `id` field is ignored for addressing (the name is the
    /// lookup key) and cannot reassign the stored id. `watch_status` is
    /// re-derived after every update.
    async fn update(&self, name: &str, patch: &serde_json::Value)
        -> Result<WriteOutcome, StoreError>;
}

/// Join validation messages into one sentence ("A, B, and C").
pub(crate) fn to_sentence(errors: &[String]) -> String {
    match errors {
        [] => String::new(),
        [single] => single.clone(),
        [first, second] => format!("{first} and {second}"),
        [head @ .., last] => format!("{}, and {last}", head.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_outcome_messages() {
        assert_eq!(WriteOutcome::Created.message(), "Created!");
        assert_eq!(WriteOutcome::Updated.message(), "Updated!");
    }

    #[test]
    fn sentence_joins_like_the_original_backend() {
        let one = vec!["Name can't be blank".to_string()];
        let two = vec!["A".to_string(), "B".to_string()];
        let three = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        assert_eq!(to_sentence(&one), "Name can't be blank");
        assert_eq!(to_sentence(&two), "A and B");
        assert_eq!(to_sentence(&three), "A, B, and C");
    }
}
