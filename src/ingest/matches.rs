use chrono::DateTime;
use tracing::debug;

use crate::error::AppError;
use crate::models::MatchRecord;
use crate::riot::types::RANKED_SOLO_QUEUE;
use crate::riot::{MatchDto, Region, RiotClient};
use crate::shutdown::Shutdown;

pub struct MatchIngestor<'a> {
    client: &'a RiotClient,
}

impl<'a> MatchIngestor<'a> {
    pub fn new(client: &'a RiotClient) -> Self {
        Self { client }
    }

    /// Up to `limit` ranked solo match ids, in the order Riot returns them
    /// (most recent first). No matches is an empty list, not an error.
    pub async fn enumerate_ranked(
        &self,
        puuid: &str,
        region: Region,
        limit: u32,
        shutdown: &Shutdown,
    ) -> Result<Vec<String>, AppError> {
        let ids = self
            .client
            .get_match_ids(region, puuid, RANKED_SOLO_QUEUE, 0, limit, shutdown)
            .await
            .map_err(|e| AppError::match_list(puuid, e))?;

        debug!(count = ids.len(), "📥 Ranked match ids fetched");
        Ok(ids)
    }

    pub async fn fetch_match(
        &self,
        match_id: &str,
        region: Region,
        shutdown: &Shutdown,
    ) -> Result<MatchDto, AppError> {
        self.client
            .get_match(region, match_id, shutdown)
            .await
            .map_err(|e| AppError::match_fetch(match_id, e))
    }
}

/// Flatten the participant entry of `puuid` in `payload` into a record.
/// Only ranked solo games are accepted.
pub fn project(
    payload: &MatchDto,
    puuid: &str,
    player_name: &str,
    region: &str,
) -> Result<MatchRecord, AppError> {
    let match_id = &payload.metadata.match_id;

    if payload.info.queue_id != RANKED_SOLO_QUEUE {
        return Err(AppError::InvalidPayload {
            match_id: match_id.clone(),
            reason: format!("queue {} is not ranked solo", payload.info.queue_id),
        });
    }

    let participant =
        payload
            .participant_info_of(puuid)
            .ok_or_else(|| AppError::ParticipantNotFound {
                puuid: puuid.to_string(),
                match_id: match_id.clone(),
            })?;

    let timestamp = DateTime::from_timestamp_millis(payload.info.game_creation).ok_or_else(|| {
        AppError::InvalidPayload {
            match_id: match_id.clone(),
            reason: format!("gameCreation {} out of range", payload.info.game_creation),
        }
    })?;

    Ok(MatchRecord {
        match_id: match_id.clone(),
        puuid: puuid.to_string(),
        player_name: player_name.to_string(),
        region: region.to_string(),
        timestamp,
        duration: payload.info.game_duration,
        game_mode: payload.info.game_mode.clone(),
        win: participant.win,
        kills: participant.kills,
        deaths: participant.deaths,
        assists: participant.assists,
        cs: participant.total_minions_killed,
        gold: participant.gold_earned,
        items: participant.items(),
    })
}
