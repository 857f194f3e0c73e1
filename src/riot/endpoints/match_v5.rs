use crate::error::AppError;
use crate::riot::client::RiotClient;
use crate::riot::region::Region;
use crate::riot::types::MatchDto;
use crate::shutdown::Shutdown;

impl RiotClient {
    /// Get match IDs of a queue by PUUID, most recent first
    /// Uses regional routing (americas, europe, asia, sea)
    pub async fn get_match_ids(
        &self,
        region: Region,
        puuid: &str,
        queue: u16,
        start: u32,
        count: u32,
        shutdown: &Shutdown,
    ) -> Result<Vec<String>, AppError> {
        let url = self.url(
            region,
            &format!(
                "/lol/match/v5/matches/by-puuid/{}/ids",
                urlencoding::encode(puuid)
            ),
        );
        let query = [
            ("queue", queue.to_string()),
            ("start", start.to_string()),
            ("count", count.to_string()),
        ];

        self.get(&url, &query, shutdown).await
    }

    /// Get match details by match ID
    /// Uses regional routing (americas, europe, asia, sea)
    pub async fn get_match(
        &self,
        region: Region,
        match_id: &str,
        shutdown: &Shutdown,
    ) -> Result<MatchDto, AppError> {
        let url = self.url(
            region,
            &format!("/lol/match/v5/matches/{}", urlencoding::encode(match_id)),
        );

        self.get(&url, &[], shutdown).await
    }
}
