//! One Lookup → Decide → Write reconciliation pass.
//!
//! The pass is driven from the observer context and performs all its
//! network work through the bridge, so this module never sees an HTTP
//! error directly. Failures arrive as response data and are folded into
//! the [`SyncReport`]; a failed write leaves persisted state unchanged
//! and the next navigation or timer tick retries the whole pass.

use dramasync_bridge::{BridgeHandle, BridgeRequest, BridgeResponse};
use dramasync_core::keys::slugify;
use dramasync_core::snapshot::DramaSnapshot;
use dramasync_core::types::Timestamp;

use crate::decision::{decide, Decision};
use crate::extract::{extract_with_retry, PageContent};
use crate::session::WatchSession;

/// Terminal state of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// A new record was created.
    Created,
    /// At least one sparse update was persisted.
    Updated,
    /// Nothing needed writing, or the page was not trackable yet.
    Skipped,
    /// A write or the lookup failed; carries the response message.
    Failed(String),
}

/// Outcome of a pass, stamped when the pass finished.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub finished_at: Timestamp,
    /// Whether this pass advanced the progress counter, which disarms
    /// the session's progress gate.
    pub progress_advanced: bool,
}

impl SyncReport {
    fn now(outcome: SyncOutcome, progress_advanced: bool) -> Self {
        Self {
            outcome,
            finished_at: chrono::Utc::now(),
            progress_advanced,
        }
    }
}

/// Run a full page pass: extract (with bounded retry), then reconcile.
///
/// An unrendered title or a title without episode affordances yields
/// `Skipped`; neither is an error.
pub async fn run_page_pass<P: PageContent>(
    page: &P,
    handle: &BridgeHandle,
    session: &mut WatchSession,
) -> SyncReport {
    let Some(snapshot) = extract_with_retry(page).await else {
        return SyncReport::now(SyncOutcome::Skipped, false);
    };

    if let Some(path_slug) = page.path_slug() {
        let canonical = slugify(&snapshot.name);
        if path_slug != canonical {
            tracing::debug!(%path_slug, %canonical, "page slug differs from canonical slug");
        }
    }

    reconcile(handle, &snapshot, page.referral_id().as_deref(), session).await
}

/// Reconcile one snapshot against the persisted record store.
pub async fn reconcile(
    handle: &BridgeHandle,
    snapshot: &DramaSnapshot,
    referral_id: Option<&str>,
    session: &mut WatchSession,
) -> SyncReport {
    if !snapshot.has_episodes() {
        tracing::debug!(name = %snapshot.name, "no episode affordances yet, pass aborted");
        return SyncReport::now(SyncOutcome::Skipped, false);
    }

    let lookup = handle
        .request(BridgeRequest::GetDrama {
            name: snapshot.name.clone(),
        })
        .await;
    let persisted = match lookup {
        Ok(BridgeResponse::Drama(record)) => Some(record),
        Ok(BridgeResponse::NotFound { .. }) => None,
        Ok(BridgeResponse::Error { message }) => {
            return SyncReport::now(SyncOutcome::Failed(message), false);
        }
        Ok(other) => {
            return SyncReport::now(
                SyncOutcome::Failed(format!("Unexpected lookup response: {other:?}")),
                false,
            );
        }
        Err(error) => return SyncReport::now(SyncOutcome::Failed(error.to_string()), false),
    };

    let decision = decide(
        persisted.as_ref(),
        snapshot,
        referral_id,
        session.progress_armed(),
    );

    match decision {
        Decision::Skip(reason) => {
            tracing::debug!(name = %snapshot.name, ?reason, "nothing to write");
            SyncReport::now(SyncOutcome::Skipped, false)
        }

        Decision::Create(draft) => {
            match handle.request(BridgeRequest::CreateDrama(draft)).await {
                Ok(BridgeResponse::Success { message }) => {
                    tracing::info!(name = %snapshot.name, %message, "drama created");
                    SyncReport::now(SyncOutcome::Created, false)
                }
                Ok(BridgeResponse::Error { message }) => {
                    SyncReport::now(SyncOutcome::Failed(message), false)
                }
                Ok(other) => SyncReport::now(
                    SyncOutcome::Failed(format!("Unexpected create response: {other:?}")),
                    false,
                ),
                Err(error) => SyncReport::now(SyncOutcome::Failed(error.to_string()), false),
            }
        }

        Decision::Update { metadata, progress } => {
            let mut failure = None;
            let mut wrote = false;

            if let Some(payload) = metadata {
                match send_update(handle, payload).await {
                    Ok(()) => wrote = true,
                    Err(message) => failure = Some(message),
                }
            }

            let mut progress_advanced = false;
            if let Some(payload) = progress {
                // Disarm on the attempt: a failed write leaves state
                // unchanged and the gate stays shut for this session.
                session.disarm_progress();
                progress_advanced = true;
                match send_update(handle, payload).await {
                    Ok(()) => wrote = true,
                    Err(message) => failure = failure.or(Some(message)),
                }
            }

            match failure {
                Some(message) => SyncReport::now(SyncOutcome::Failed(message), progress_advanced),
                None => {
                    debug_assert!(wrote);
                    tracing::info!(name = %snapshot.name, progress_advanced, "drama updated");
                    SyncReport::now(SyncOutcome::Updated, progress_advanced)
                }
            }
        }
    }
}

async fn send_update(handle: &BridgeHandle, payload: serde_json::Value) -> Result<(), String> {
    match handle.request(BridgeRequest::UpdateDrama(payload)).await {
        Ok(BridgeResponse::Success { .. }) => Ok(()),
        Ok(BridgeResponse::NotFound { message }) | Ok(BridgeResponse::Error { message }) => {
            Err(message)
        }
        Ok(other) => Err(format!("Unexpected update response: {other:?}")),
        Err(error) => Err(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    use dramasync_bridge::bridge;
    use dramasync_core::drama::{AiringStatus, DramaRecord, WatchStatus};

    fn snapshot(position: u32) -> DramaSnapshot {
        DramaSnapshot {
            name: "Signal".to_string(),
            description: "A walkie-talkie bridges decades.".to_string(),
            total_episodes: 16,
            country: "South Korea".to_string(),
            classification_tag: "TVSeries".to_string(),
            airing_status: AiringStatus::Ongoing,
            poster_url: None,
            current_episode_position: position,
        }
    }

    fn persisted(last_watched: u32) -> DramaRecord {
        DramaRecord {
            id: 1,
            name: "Signal".to_string(),
            description: Some("A walkie-talkie bridges decades.".to_string()),
            total_episodes: 16,
            last_watched_episode: last_watched,
            watch_status: WatchStatus::derive(last_watched, 16),
            airing_status: AiringStatus::Ongoing,
            country: "South Korea".to_string(),
            poster_url: None,
            metadata: Some(serde_json::Map::new()),
        }
    }

    /// Scripted network context: answers lookups from `record`, records
    /// every write it sees.
    fn spawn_scripted(
        record: Option<DramaRecord>,
    ) -> (
        BridgeHandle,
        tokio::sync::mpsc::UnboundedReceiver<BridgeRequest>,
    ) {
        let (handle, mut listener) = bridge();
        let (seen_tx, seen_rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(envelope) = listener.recv().await {
                let response = match &envelope.request {
                    BridgeRequest::GetDrama { .. } => match &record {
                        Some(record) => BridgeResponse::Drama(record.clone()),
                        None => BridgeResponse::NotFound {
                            message: "Drama not found".to_string(),
                        },
                    },
                    BridgeRequest::CreateDrama(_) => BridgeResponse::Success {
                        message: "Created!".to_string(),
                    },
                    BridgeRequest::UpdateDrama(_) => BridgeResponse::Success {
                        message: "Updated!".to_string(),
                    },
                    _ => BridgeResponse::Ack,
                };
                let _ = seen_tx.send(envelope.request.clone());
                let _ = envelope.reply.send(response);
            }
        });

        (handle, seen_rx)
    }

    #[tokio::test]
    async fn missing_record_is_created() {
        let (handle, mut seen) = spawn_scripted(None);
        let mut session = WatchSession::new();

        let report = reconcile(&handle, &snapshot(4), Some("ref-9"), &mut session).await;
        assert_eq!(report.outcome, SyncOutcome::Created);
        assert!(!report.progress_advanced);
        assert!(session.progress_armed());

        assert_matches!(seen.recv().await, Some(BridgeRequest::GetDrama { .. }));
        let draft = assert_matches!(
            seen.recv().await,
            Some(BridgeRequest::CreateDrama(draft)) => draft
        );
        assert_eq!(draft.last_watched_episode, 4);
    }

    #[tokio::test]
    async fn progress_update_disarms_session() {
        let (handle, mut seen) = spawn_scripted(Some(persisted(4)));
        let mut session = WatchSession::new();

        let report = reconcile(&handle, &snapshot(5), None, &mut session).await;
        assert_eq!(report.outcome, SyncOutcome::Updated);
        assert!(report.progress_advanced);
        assert!(!session.progress_armed());

        assert_matches!(seen.recv().await, Some(BridgeRequest::GetDrama { .. }));
        let payload = assert_matches!(
            seen.recv().await,
            Some(BridgeRequest::UpdateDrama(payload)) => payload
        );
        assert_eq!(payload["last_watched_episode"], json!(5));

        // The gate stays shut: an identical pass now skips.
        let report = reconcile(&handle, &snapshot(6), None, &mut session).await;
        assert_eq!(report.outcome, SyncOutcome::Skipped);
    }

    #[tokio::test]
    async fn unchanged_state_skips_without_writes() {
        let (handle, mut seen) = spawn_scripted(Some(persisted(4)));
        let mut session = WatchSession::new();

        let report = reconcile(&handle, &snapshot(4), None, &mut session).await;
        assert_eq!(report.outcome, SyncOutcome::Skipped);

        assert_matches!(seen.recv().await, Some(BridgeRequest::GetDrama { .. }));
        assert_matches!(seen.try_recv(), Err(_));
    }

    #[tokio::test]
    async fn zero_episode_snapshot_aborts_before_lookup() {
        let (handle, mut seen) = spawn_scripted(None);
        let mut session = WatchSession::new();

        // No episode affordances rendered yet: not trackable this pass.
        let mut unrendered = snapshot(0);
        unrendered.total_episodes = 0;

        let report = reconcile(&handle, &unrendered, None, &mut session).await;
        assert_eq!(report.outcome, SyncOutcome::Skipped);
        assert_matches!(seen.try_recv(), Err(_));
    }

    #[tokio::test]
    async fn closed_bridge_reports_failure() {
        let (handle, listener) = bridge();
        drop(listener);
        let mut session = WatchSession::new();

        let report = reconcile(&handle, &snapshot(4), None, &mut session).await;
        assert_matches!(report.outcome, SyncOutcome::Failed(_));
    }
}
