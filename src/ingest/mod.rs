//! Player resolution and ranked match ingestion on top of [`RiotClient`].
//!
//! [`RiotClient`]: crate::riot::RiotClient

pub mod identity;
pub mod matches;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod fixtures;

pub use identity::{IdentityResolver, parse_handle};
pub use matches::{MatchIngestor, project};
pub use pipeline::{IngestReport, IngestRequest, MatchFailure, MatchSink, ingest_player};
