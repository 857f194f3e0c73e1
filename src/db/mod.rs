mod migrations;
mod models;
mod repository;

pub use models::{MatchRow, SummonerRow};
pub use repository::Repository;
