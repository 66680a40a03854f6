//! Domain types and pure leaf components for the dramasync pipeline.
//!
//! Everything in this crate is synchronous and side-effect free: record
//! and snapshot types, the structural differ, key normalization, and the
//! retry backoff policy. Network, storage, and scheduling live in the
//! crates layered on top.

pub mod backoff;
pub mod diff;
pub mod drama;
pub mod keys;
pub mod snapshot;
pub mod types;
