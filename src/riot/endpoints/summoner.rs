use crate::error::AppError;
use crate::riot::client::RiotClient;
use crate::riot::region::Platform;
use crate::riot::types::SummonerDto;
use crate::shutdown::Shutdown;

impl RiotClient {
    /// Get summoner profile by PUUID
    /// Uses platform routing (br1, na1, euw1, ...)
    pub async fn get_summoner_by_puuid(
        &self,
        platform: Platform,
        puuid: &str,
        shutdown: &Shutdown,
    ) -> Result<SummonerDto, AppError> {
        let url = self.url(
            platform,
            &format!(
                "/lol/summoner/v4/summoners/by-puuid/{}",
                urlencoding::encode(puuid)
            ),
        );

        self.get(&url, &[], shutdown).await
    }
}
