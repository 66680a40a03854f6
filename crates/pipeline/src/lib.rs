//! Reconciliation pipeline: page content in, minimal record writes out.
//!
//! A pass flows extract → lookup → decide → write, with every network
//! step carried over the bridge. Extraction tolerates half-rendered
//! pages, the decision engine is pure, and the playback monitor advances
//! progress at most once per page view.

pub mod decision;
pub mod extract;
pub mod reconcile;
pub mod session;

pub use decision::{decide, Decision, SkipReason};
pub use extract::{extract, extract_with_retry, PageContent};
pub use reconcile::{reconcile, run_page_pass, SyncOutcome, SyncReport};
pub use session::{run_playback_monitor, WatchSession, COMPLETION_THRESHOLD_PERCENT};
