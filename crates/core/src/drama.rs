//! Drama record types: the durable entity, its index projection, and the
//! create draft, plus the enums and validation limits the record store
//! enforces.
//!
//! `watch_status` is never written directly. It is derived from
//! `last_watched_episode` and `total_episodes` on every store write via
//! [`WatchStatus::derive`].

use serde::{Deserialize, Serialize};

use crate::types::RecordId;

/// Field limits enforced by the record store.
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_COUNTRY_LEN: usize = 50;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MIN_EPISODES: u32 = 1;
pub const MAX_EPISODES: u32 = 200;

/// Upstream airing state of a drama.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiringStatus {
    #[default]
    Upcoming,
    Ongoing,
    Completed,
}

impl AiringStatus {
    /// String representation for display, logging, and the wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
        }
    }

    /// Case-insensitive parse of on-page airing-status text.
    ///
    /// Returns `None` for unknown text; extraction falls back to
    /// [`AiringStatus::Upcoming`] in that case.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "upcoming" => Some(Self::Upcoming),
            "ongoing" => Some(Self::Ongoing),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for AiringStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Viewer progress state, derived from episode counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    #[default]
    NotStarted,
    Watching,
    Finished,
}

impl WatchStatus {
    /// String representation for display and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Watching => "watching",
            Self::Finished => "finished",
        }
    }

    /// Derive the watch status from episode counters.
    ///
    /// - `last == total` (and `total > 0`) -> finished
    /// - `0 < last < total`                -> watching
    /// - otherwise                         -> not started
    pub fn derive(last_watched_episode: u32, total_episodes: u32) -> Self {
        if total_episodes > 0 && last_watched_episode == total_episodes {
            Self::Finished
        } else if last_watched_episode > 0 && last_watched_episode < total_episodes {
            Self::Watching
        } else {
            Self::NotStarted
        }
    }
}

impl std::fmt::Display for WatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The durable tracked-drama entity.
///
/// Invariant after every store write:
/// `0 <= last_watched_episode <= total_episodes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DramaRecord {
    pub id: RecordId,
    /// Unique display title.
    pub name: String,
    pub description: Option<String>,
    pub total_episodes: u32,
    pub last_watched_episode: u32,
    pub watch_status: WatchStatus,
    pub airing_status: AiringStatus,
    pub country: String,
    pub poster_url: Option<String>,
    /// Open string-keyed bag for external references (e.g. referral id).
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Index projection of a record, returned by list operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DramaIndex {
    pub id: RecordId,
    pub last_watched_episode: u32,
    pub name: String,
    pub watch_status: WatchStatus,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub poster_url: Option<String>,
}

impl From<&DramaRecord> for DramaIndex {
    fn from(record: &DramaRecord) -> Self {
        Self {
            id: record.id,
            last_watched_episode: record.last_watched_episode,
            name: record.name.clone(),
            watch_status: record.watch_status,
            metadata: record.metadata.clone().unwrap_or_default(),
            poster_url: record.poster_url.clone(),
        }
    }
}

/// Payload for creating a new tracked drama.
///
/// Built by the decision engine from a snapshot plus the observed current
/// episode position. The store assigns the id and derives `watch_status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DramaDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub total_episodes: u32,
    pub last_watched_episode: u32,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub airing_status: AiringStatus,
    pub poster_url: Option<String>,
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl DramaDraft {
    /// Validate field limits and the episode-bounds invariant.
    ///
    /// Returns an empty `Vec` if valid; otherwise a list of human-readable
    /// errors suitable for a 422 response body.
    pub fn validate(&self) -> Vec<String> {
        validate_fields(
            &self.name,
            Some(&self.description),
            &self.country,
            self.total_episodes,
            self.last_watched_episode,
        )
    }
}

impl DramaRecord {
    /// Validate field limits and the episode-bounds invariant.
    pub fn validate(&self) -> Vec<String> {
        validate_fields(
            &self.name,
            self.description.as_deref(),
            &self.country,
            self.total_episodes,
            self.last_watched_episode,
        )
    }
}

/// Shared field validation for drafts and full records.
fn validate_fields(
    name: &str,
    description: Option<&str>,
    country: &str,
    total_episodes: u32,
    last_watched_episode: u32,
) -> Vec<String> {
    let mut errors = Vec::new();

    if name.trim().is_empty() {
        errors.push("Name can't be blank".to_string());
    } else if name.len() > MAX_NAME_LEN {
        errors.push(format!(
            "Name is too long (maximum is {MAX_NAME_LEN} characters)"
        ));
    }

    if country.len() > MAX_COUNTRY_LEN {
        errors.push(format!(
            "Country is too long (maximum is {MAX_COUNTRY_LEN} characters)"
        ));
    }

    if let Some(description) = description {
        if description.len() > MAX_DESCRIPTION_LEN {
            errors.push(format!(
                "Description is too long (maximum is {MAX_DESCRIPTION_LEN} characters)"
            ));
        }
    }

    if total_episodes < MIN_EPISODES || total_episodes > MAX_EPISODES {
        errors.push(format!(
            "Total episodes must be between {MIN_EPISODES} and {MAX_EPISODES}"
        ));
    }

    if last_watched_episode > total_episodes {
        errors.push(
            "Last watched episode must be between 0 and the total number of episodes".to_string(),
        );
    }

    errors
}
