use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::SummonerProfile;

#[derive(Debug, Clone, FromRow)]
pub struct SummonerRow {
    pub puuid: String,
    pub summoner_id: Option<String>,
    pub account_id: Option<String>,
    pub name: String,
    pub profile_icon_id: i32,
    pub summoner_level: i64,
    pub last_updated: DateTime<Utc>,
}

impl From<SummonerRow> for SummonerProfile {
    fn from(row: SummonerRow) -> Self {
        Self {
            puuid: row.puuid,
            summoner_id: row.summoner_id,
            account_id: row.account_id,
            name: row.name,
            profile_icon_id: row.profile_icon_id,
            summoner_level: row.summoner_level,
            last_updated: row.last_updated,
        }
    }
}

/// A stored match line. Doubles as the CSV export record.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MatchRow {
    pub match_id: String,
    pub puuid: String,
    pub player_name: String,
    pub region: String,
    pub timestamp: DateTime<Utc>,
    pub duration: i64,
    pub game_mode: String,
    pub win: bool,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
    pub cs: i32,
    pub gold: i64,
    /// JSON array of the six item ids.
    pub items: String,
}

impl MatchRow {
    pub fn item_ids(&self) -> Vec<i32> {
        serde_json::from_str(&self.items).unwrap_or_default()
    }

    pub fn kda(&self) -> String {
        format!("{}/{}/{}", self.kills, self.deaths, self.assists)
    }

    pub fn duration_formatted(&self) -> String {
        format!("{}:{:02}", self.duration / 60, self.duration % 60)
    }
}
