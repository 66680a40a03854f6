//! Ephemeral page snapshot produced by each extraction pass.
//!
//! A [`DramaSnapshot`] is owned by the extraction step until it is handed
//! to the decision engine, and is never persisted as-is.

use serde::{Deserialize, Serialize};

use crate::drama::AiringStatus;

/// Classification tag that marks a title as trackable.
pub const TRACKABLE_TAG: &str = "TVSeries";

/// Structured signals read from an observed drama page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DramaSnapshot {
    /// Page title; non-empty after trim (extraction returns `None` before
    /// the title has rendered).
    pub name: String,
    /// Synopsis text; empty when the panel is missing.
    pub description: String,
    /// Number of episode affordances on the page. `0` means the title is
    /// not yet trackable and the pass aborts without error.
    pub total_episodes: u32,
    pub country: String,
    /// Media-type tag, used only to gate trackability ("series" vs other
    /// media types).
    pub classification_tag: String,
    pub airing_status: AiringStatus,
    pub poster_url: Option<String>,
    /// Episode position parsed from the on-page indicator; `0` when
    /// missing or unparsable.
    pub current_episode_position: u32,
}

impl DramaSnapshot {
    /// Whether the classification tag marks this title as trackable.
    ///
    /// Non-series media (movies, specials) are intentionally excluded
    /// from tracking and reconcile to a skip, not an error.
    pub fn is_trackable(&self) -> bool {
        self.classification_tag == TRACKABLE_TAG
    }

    /// Whether the page has rendered any episode affordances yet.
    pub fn has_episodes(&self) -> bool {
        self.total_episodes > 0
    }
}
