//! Snapshot extraction from observed page content.
//!
//! Pages render incrementally, so extraction is retried on a fixed
//! cadence until the title appears. Everything else degrades instead of
//! failing: missing metadata slots become empty strings, an unparsable
//! episode indicator becomes `0`, and zero episode affordances is a
//! valid "not yet trackable" signal handled by the caller.

use std::time::Duration;

use dramasync_core::drama::AiringStatus;
use dramasync_core::snapshot::DramaSnapshot;

/// Upper bound on extraction attempts for a single page view.
pub const MAX_EXTRACTION_ATTEMPTS: u32 = 10;

/// Spacing between extraction attempts.
pub const EXTRACTION_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Positional metadata slot carrying the production country.
pub const SLOT_COUNTRY: usize = 0;
/// Positional metadata slot carrying the airing-status text.
pub const SLOT_AIRING_STATUS: usize = 1;
/// Positional metadata slot carrying the media-type tag.
pub const SLOT_CLASSIFICATION: usize = 2;

/// Read access to the fields of an observed drama page.
///
/// Every accessor reflects the page as rendered right now; `None` means
/// the element has not rendered (or does not exist for this title), not
/// an error. Implementations must be cheap to call repeatedly.
pub trait PageContent {
    /// Display title. Extraction cannot proceed without it.
    fn title(&self) -> Option<String>;

    /// Synopsis text, if the panel has rendered.
    fn description(&self) -> Option<String>;

    /// Poster image address, if present.
    fn poster_url(&self) -> Option<String>;

    /// Number of episode affordances currently rendered. `0` is valid
    /// and means the title is not yet trackable.
    fn episode_count(&self) -> u32;

    /// Raw text of the current-episode indicator, if rendered.
    fn current_episode_text(&self) -> Option<String>;

    /// Positional metadata slot (see the `SLOT_*` indices). Absent
    /// slots yield `None`.
    fn metadata_slot(&self, index: usize) -> Option<String>;

    /// Playback position of the active player as a percentage, if a
    /// player is present on the page.
    fn playback_percent(&self) -> Option<f64>;

    /// Referral id carried in the page address query, if any.
    fn referral_id(&self) -> Option<String>;

    /// Path segment the page is addressed by, for canonical-slug
    /// comparison.
    fn path_slug(&self) -> Option<String>;
}

/// Extract a snapshot from the page as currently rendered.
///
/// Returns `None` until the title has rendered non-empty; every other
/// field falls back to its empty/zero value.
pub fn extract(page: &dyn PageContent) -> Option<DramaSnapshot> {
    let name = page.title().unwrap_or_default();
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let slot = |index: usize| page.metadata_slot(index).unwrap_or_default();
    let airing_status = AiringStatus::parse(&slot(SLOT_AIRING_STATUS)).unwrap_or_default();

    Some(DramaSnapshot {
        name: name.to_string(),
        description: page.description().unwrap_or_default(),
        total_episodes: page.episode_count(),
        country: slot(SLOT_COUNTRY),
        classification_tag: slot(SLOT_CLASSIFICATION),
        airing_status,
        poster_url: page.poster_url(),
        current_episode_position: parse_episode_position(page.current_episode_text().as_deref()),
    })
}

/// Extract with bounded retry, waiting out incremental rendering.
pub async fn extract_with_retry(page: &dyn PageContent) -> Option<DramaSnapshot> {
    for attempt in 1..=MAX_EXTRACTION_ATTEMPTS {
        if let Some(snapshot) = extract(page) {
            return Some(snapshot);
        }
        if attempt < MAX_EXTRACTION_ATTEMPTS {
            tokio::time::sleep(EXTRACTION_RETRY_DELAY).await;
        }
    }
    tracing::debug!(
        attempts = MAX_EXTRACTION_ATTEMPTS,
        "page title never rendered, giving up extraction"
    );
    None
}

/// Permissive parse of the current-episode indicator: leading decimal
/// digits are taken, anything else yields `0`.
fn parse_episode_position(text: Option<&str>) -> u32 {
    let Some(text) = text else { return 0 };
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}
