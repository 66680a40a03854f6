//! Per-page-view viewing session and the playback monitor.
//!
//! A session begins when a drama page becomes active and owns one
//! progress grant: the first time playback crosses the completion
//! threshold, one progress-advancement reconciliation runs and the grant
//! is spent. Rewinding and re-crossing the threshold within the same
//! view does not restore it; navigating to a new page starts a fresh
//! session.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use dramasync_bridge::{BridgeHandle, BridgeRequest};

use crate::extract::{extract, PageContent};
use crate::reconcile::{reconcile, SyncReport};

/// Playback percentage at which an episode counts as watched.
pub const COMPLETION_THRESHOLD_PERCENT: f64 = 75.0;

/// Default spacing between playback checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// State for one page view.
#[derive(Debug)]
pub struct WatchSession {
    id: Uuid,
    progress_armed: bool,
}

impl WatchSession {
    /// Start a session with its progress grant armed.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            progress_armed: true,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether this session may still advance progress.
    pub fn progress_armed(&self) -> bool {
        self.progress_armed
    }

    /// Spend the session's progress grant. Never re-arms.
    pub fn disarm_progress(&mut self) {
        self.progress_armed = false;
    }
}

impl Default for WatchSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Poll the page's playback position until the session's progress grant
/// is spent or the token is cancelled.
///
/// On the first tick at or past [`COMPLETION_THRESHOLD_PERCENT`], sends
/// a liveness ping, re-extracts, and runs one reconciliation pass; that
/// pass spends the grant and the monitor returns its report. Ticks with
/// no player or below the threshold are no-ops.
pub async fn run_playback_monitor<P: PageContent>(
    page: &P,
    handle: &BridgeHandle,
    session: &mut WatchSession,
    poll_interval: Duration,
    cancel: &CancellationToken,
) -> Option<SyncReport> {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first interval tick fires immediately; skip it so every check
    // is a full poll interval into the view.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(session = %session.id, "playback monitor cancelled");
                return None;
            }
            _ = ticker.tick() => {
                if !session.progress_armed() {
                    return None;
                }
                let Some(percent) = page.playback_percent() else { continue };
                if percent < COMPLETION_THRESHOLD_PERCENT {
                    continue;
                }

                tracing::debug!(
                    session = %session.id,
                    percent,
                    "completion threshold crossed"
                );
                let _ = handle.request(BridgeRequest::Up).await;

                let Some(snapshot) = extract(page) else { continue };
                let report =
                    reconcile(handle, &snapshot, page.referral_id().as_deref(), session).await;
                if !session.progress_armed() {
                    return Some(report);
                }
            }
        }
    }
}
