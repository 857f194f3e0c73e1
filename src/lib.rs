//! Ranked match history ingestion from the Riot Games API into SQLite.
//!
//! A [`riot::RiotClient`] paces every call through a dual-window
//! [`riot::RateLimiter`] and absorbs `429` responses. [`ingest::ingest_player`]
//! resolves a player, fetches their recent ranked games and hands the
//! surviving records to a [`ingest::MatchSink`] such as [`db::Repository`].

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod menu;
pub mod models;
pub mod riot;
pub mod scraper;
pub mod shutdown;

pub use config::Config;
pub use error::AppError;
