use serde::Deserialize;

// ============================================================================
// Account-v1
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub puuid: String,
    pub game_name: Option<String>,
    pub tag_line: Option<String>,
}

// ============================================================================
// Summoner-v4
// ============================================================================

/// Summoner profile. The legacy ids are no longer sent for every account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
    pub puuid: String,
    pub profile_icon_id: i32,
    pub summoner_level: i64,
}

// ============================================================================
// Match-v5
// ============================================================================

/// Queue id of Ranked Solo/Duo.
pub const RANKED_SOLO_QUEUE: u16 = 420;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchDto {
    pub metadata: MetadataDto,
    pub info: InfoDto,
}

impl MatchDto {
    pub fn participant_info_of(&self, puuid: &str) -> Option<&ParticipantDto> {
        self.info.participants.iter().find(|p| p.puuid == puuid)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDto {
    pub match_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDto {
    /// Epoch milliseconds.
    pub game_creation: i64,
    /// Seconds.
    pub game_duration: i64,
    pub game_mode: String,
    pub queue_id: u16,
    pub participants: Vec<ParticipantDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub puuid: String,
    pub win: bool,
    pub kills: i32,
    pub deaths: i32,
    pub assists: i32,
    pub total_minions_killed: i32,
    pub gold_earned: i64,
    pub item0: i32,
    pub item1: i32,
    pub item2: i32,
    pub item3: i32,
    pub item4: i32,
    pub item5: i32,
}

impl ParticipantDto {
    /// The six equipped item slots (0 = empty slot), trinket excluded.
    pub fn items(&self) -> [i32; 6] {
        [
            self.item0, self.item1, self.item2, self.item3, self.item4, self.item5,
        ]
    }
}
