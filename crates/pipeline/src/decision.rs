//! Pure sync decision engine.
//!
//! Given the persisted record (or its absence) and a fresh snapshot,
//! [`decide`] produces the writes a reconciliation pass should perform.
//! Metadata drift and progress advancement are decided independently:
//! drift is corrected on every visit, progress only when the viewer has
//! plausibly watched enough of an episode (the caller signals that via
//! `allow_progress`). The function performs no I/O and is deterministic
//! over its inputs.

use serde_json::{json, Map, Value};

use dramasync_core::diff;
use dramasync_core::drama::{AiringStatus, DramaDraft, DramaRecord, WatchStatus};
use dramasync_core::snapshot::DramaSnapshot;

/// Metadata key the page referral id is stored under.
pub const METADATA_REFERRAL_KEY: &str = "id";

/// Why a pass decided to write nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The title is not series-like; tracking it is intentionally
    /// excluded.
    NotTrackable,
    /// Persisted state already matches the snapshot.
    NoChanges,
}

/// Writes a reconciliation pass should perform, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// No persisted record exists; create one from the snapshot.
    Create(DramaDraft),
    /// Nothing to write.
    Skip(SkipReason),
    /// Record exists; send the sparse updates that are warranted.
    /// At least one of the two payloads is present.
    Update {
        /// Drift in descriptive fields, sent on every visit.
        metadata: Option<Value>,
        /// Progress advancement, gated by the viewing session.
        progress: Option<Value>,
    },
}

/// Decide what to write for one `(persisted, snapshot)` pair.
///
/// `referral_id` is the external reference captured from the page
/// address, carried into the record's metadata bag. `allow_progress` is
/// false once the session has already advanced progress; the metadata
/// branch is unaffected by it.
pub fn decide(
    persisted: Option<&DramaRecord>,
    snapshot: &DramaSnapshot,
    referral_id: Option<&str>,
    allow_progress: bool,
) -> Decision {
    let metadata_bag = referral_metadata(referral_id);

    let Some(persisted) = persisted else {
        if !snapshot.is_trackable() {
            return Decision::Skip(SkipReason::NotTrackable);
        }
        return Decision::Create(draft_from_snapshot(snapshot, metadata_bag));
    };

    let persisted_value = match serde_json::to_value(persisted) {
        Ok(value) => value,
        Err(error) => {
            // Map/Value serialization of a plain struct cannot fail in
            // practice; treat it as "nothing comparable" if it does.
            tracing::warn!(%error, "could not serialize persisted record for diffing");
            return Decision::Skip(SkipReason::NoChanges);
        }
    };
    let candidate = candidate_record(&persisted_value, snapshot, &metadata_bag);
    let drift = diff::diff(&persisted_value, &candidate);

    let metadata = (!diff::is_empty(&drift)).then(|| with_identity(drift.clone(), persisted));

    let progress = (allow_progress && progress_warranted(persisted, snapshot)).then(|| {
        let mut payload = with_identity(drift, persisted);
        if let Some(fields) = payload.as_object_mut() {
            fields.insert(
                "last_watched_episode".to_string(),
                json!(snapshot.current_episode_position),
            );
            fields.insert("metadata".to_string(), Value::Object(metadata_bag.clone()));
        }
        payload
    });

    if metadata.is_none() && progress.is_none() {
        return Decision::Skip(SkipReason::NoChanges);
    }
    Decision::Update { metadata, progress }
}

/// Progress advancement condition: the page still shows a trackable
/// series, the viewer is at a new position, and the record is not
/// already finished on a completed run.
fn progress_warranted(persisted: &DramaRecord, snapshot: &DramaSnapshot) -> bool {
    let position = snapshot.current_episode_position;
    snapshot.is_trackable()
        && position > 0
        && position != persisted.last_watched_episode
        && (persisted.watch_status != WatchStatus::Finished
            || snapshot.airing_status != AiringStatus::Completed)
}

fn referral_metadata(referral_id: Option<&str>) -> Map<String, Value> {
    let mut bag = Map::new();
    if let Some(id) = referral_id {
        bag.insert(METADATA_REFERRAL_KEY.to_string(), json!(id));
    }
    bag
}

fn draft_from_snapshot(snapshot: &DramaSnapshot, metadata: Map<String, Value>) -> DramaDraft {
    DramaDraft {
        name: snapshot.name.clone(),
        description: snapshot.description.clone(),
        total_episodes: snapshot.total_episodes,
        last_watched_episode: snapshot.current_episode_position,
        country: snapshot.country.clone(),
        airing_status: snapshot.airing_status,
        poster_url: snapshot.poster_url.clone(),
        metadata: Some(metadata),
    }
}

/// Candidate merged record: persisted fields overwritten by non-empty
/// snapshot fields, progress counters untouched, poster and metadata
/// refreshed from the page.
fn candidate_record(
    persisted: &Value,
    snapshot: &DramaSnapshot,
    metadata: &Map<String, Value>,
) -> Value {
    let mut candidate = persisted.clone();
    let Some(fields) = candidate.as_object_mut() else {
        return candidate;
    };

    fields.insert("name".to_string(), json!(snapshot.name));
    if !snapshot.description.is_empty() {
        fields.insert("description".to_string(), json!(snapshot.description));
    }
    if snapshot.total_episodes > 0 {
        fields.insert("total_episodes".to_string(), json!(snapshot.total_episodes));
    }
    if !snapshot.country.is_empty() {
        fields.insert("country".to_string(), json!(snapshot.country));
    }
    fields.insert("airing_status".to_string(), json!(snapshot.airing_status));
    if let Some(poster) = &snapshot.poster_url {
        fields.insert("poster_url".to_string(), json!(poster));
    }
    if !metadata.is_empty() {
        fields.insert("metadata".to_string(), Value::Object(metadata.clone()));
    }
    candidate
}

/// Attach the identity fields every sparse update must carry.
fn with_identity(mut payload: Value, persisted: &DramaRecord) -> Value {
    if !payload.is_object() {
        payload = Value::Object(Map::new());
    }
    if let Some(fields) = payload.as_object_mut() {
        fields.insert("id".to_string(), json!(persisted.id));
        fields
            .entry("name".to_string())
            .or_insert_with(|| json!(persisted.name));
    }
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn snapshot() -> DramaSnapshot {
        DramaSnapshot {
            name: "Signal".to_string(),
            description: "A walkie-talkie bridges decades.".to_string(),
            total_episodes: 16,
            country: "South Korea".to_string(),
            classification_tag: "TVSeries".to_string(),
            airing_status: AiringStatus::Completed,
            poster_url: Some("https://img.example/signal.jpg".to_string()),
            current_episode_position: 4,
        }
    }

    fn persisted() -> DramaRecord {
        DramaRecord {
            id: 7,
            name: "Signal".to_string(),
            description: Some("A walkie-talkie bridges decades.".to_string()),
            total_episodes: 16,
            last_watched_episode: 4,
            watch_status: WatchStatus::Watching,
            airing_status: AiringStatus::Completed,
            country: "South Korea".to_string(),
            poster_url: Some("https://img.example/signal.jpg".to_string()),
            metadata: None,
        }
    }

    #[test]
    fn missing_record_creates_with_current_position() {
        let decision = decide(None, &snapshot(), Some("ref-123"), true);
        let draft = assert_matches!(decision, Decision::Create(draft) => draft);
        assert_eq!(draft.name, "Signal");
        assert_eq!(draft.last_watched_episode, 4);
        assert_eq!(
            draft.metadata.unwrap().get(METADATA_REFERRAL_KEY),
            Some(&json!("ref-123"))
        );
    }

    #[test]
    fn non_series_titles_are_skipped_not_created() {
        let mut movie = snapshot();
        movie.classification_tag = "Movie".to_string();
        assert_eq!(
            decide(None, &movie, None, true),
            Decision::Skip(SkipReason::NotTrackable)
        );
    }

    #[test]
    fn identical_state_skips() {
        assert_eq!(
            decide(Some(&persisted()), &snapshot(), None, true),
            Decision::Skip(SkipReason::NoChanges)
        );
    }

    #[test]
    fn metadata_drift_updates_without_touching_progress() {
        let mut drifted = snapshot();
        drifted.description = "Upstream rewrote the synopsis.".to_string();
        let decision = decide(Some(&persisted()), &drifted, None, true);
        let (metadata, progress) = assert_matches!(
            decision,
            Decision::Update { metadata, progress } => (metadata, progress)
        );
        assert!(progress.is_none());
        let payload = metadata.unwrap();
        assert_eq!(payload["description"], json!("Upstream rewrote the synopsis."));
        assert_eq!(payload["id"], json!(7));
        assert_eq!(payload["name"], json!("Signal"));
        assert!(payload.get("last_watched_episode").is_none());
    }

    #[test]
    fn empty_snapshot_fields_do_not_clobber_persisted_values() {
        let mut sparse = snapshot();
        sparse.description = String::new();
        sparse.country = String::new();
        sparse.total_episodes = 0;
        assert_eq!(
            decide(Some(&persisted()), &sparse, None, true),
            Decision::Skip(SkipReason::NoChanges)
        );
    }

    #[test]
    fn new_position_advances_progress() {
        let mut record = persisted();
        let mut bag = Map::new();
        bag.insert(METADATA_REFERRAL_KEY.to_string(), json!("ref-123"));
        record.metadata = Some(bag);
        let mut advanced = snapshot();
        advanced.current_episode_position = 5;
        let decision = decide(Some(&record), &advanced, Some("ref-123"), true);
        let (metadata, progress) = assert_matches!(
            decision,
            Decision::Update { metadata, progress } => (metadata, progress)
        );
        // Position alone is not metadata drift.
        assert!(metadata.is_none());
        let payload = progress.unwrap();
        assert_eq!(payload["last_watched_episode"], json!(5));
        assert_eq!(payload["metadata"][METADATA_REFERRAL_KEY], json!("ref-123"));
        assert_eq!(payload["id"], json!(7));
    }

    #[test]
    fn unchanged_position_never_advances() {
        // Position 4 equals the persisted counter, so only the metadata
        // branch could fire, and the state is otherwise identical.
        assert_eq!(
            decide(Some(&persisted()), &snapshot(), None, true),
            Decision::Skip(SkipReason::NoChanges)
        );
    }

    #[test]
    fn finished_record_on_completed_run_is_frozen() {
        let mut record = persisted();
        record.last_watched_episode = 16;
        record.watch_status = WatchStatus::Finished;
        let mut stale = snapshot();
        stale.current_episode_position = 10;
        assert_eq!(
            decide(Some(&record), &stale, None, true),
            Decision::Skip(SkipReason::NoChanges)
        );
    }

    #[test]
    fn finished_record_on_ongoing_run_still_advances() {
        let mut record = persisted();
        record.last_watched_episode = 16;
        record.watch_status = WatchStatus::Finished;
        let mut grown = snapshot();
        grown.airing_status = AiringStatus::Ongoing;
        grown.current_episode_position = 17;
        grown.total_episodes = 20;
        let decision = decide(Some(&record), &grown, None, true);
        let progress = assert_matches!(
            decision,
            Decision::Update { progress: Some(p), .. } => p
        );
        assert_eq!(progress["last_watched_episode"], json!(17));
    }

    #[test]
    fn non_series_page_never_advances_progress() {
        // The record exists but the classification slot no longer reads
        // as a series; metadata drift is still corrected.
        let mut reclassified = snapshot();
        reclassified.classification_tag = "Movie".to_string();
        reclassified.current_episode_position = 5;
        assert_eq!(
            decide(Some(&persisted()), &reclassified, None, true),
            Decision::Skip(SkipReason::NoChanges)
        );

        reclassified.description = "New synopsis.".to_string();
        let decision = decide(Some(&persisted()), &reclassified, None, true);
        assert_matches!(
            decision,
            Decision::Update { metadata: Some(_), progress: None }
        );
    }

    #[test]
    fn disarmed_session_blocks_progress_only() {
        let mut advanced = snapshot();
        advanced.current_episode_position = 5;
        assert_eq!(
            decide(Some(&persisted()), &advanced, None, false),
            Decision::Skip(SkipReason::NoChanges)
        );

        advanced.description = "New synopsis.".to_string();
        let decision = decide(Some(&persisted()), &advanced, None, false);
        assert_matches!(
            decision,
            Decision::Update { metadata: Some(_), progress: None }
        );
    }

    #[test]
    fn decision_is_deterministic() {
        let mut drifted = snapshot();
        drifted.current_episode_position = 6;
        drifted.country = "Japan".to_string();
        let first = decide(Some(&persisted()), &drifted, Some("r"), true);
        let second = decide(Some(&persisted()), &drifted, Some("r"), true);
        assert_eq!(first, second);
    }
}
