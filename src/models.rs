use chrono::{DateTime, Utc};

/// Account level identity of a player, as returned by Account-v1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
}

impl Identity {
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }
}

/// One row per player, keyed by `puuid`. Later fetches overwrite earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub struct SummonerProfile {
    pub puuid: String,
    pub summoner_id: Option<String>,
    pub account_id: Option<String>,
    pub name: String,
    pub profile_icon_id: i32,
    pub summoner_level: i64,
    pub last_updated: DateTime<Utc>,
}

/// A player's line in one ranked match, keyed by `(match_id, puuid)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
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
    pub items: [i32; 6],
}
