use crate::error::AppError;
use crate::riot::client::RiotClient;
use crate::riot::region::Region;
use crate::riot::types::AccountDto;
use crate::shutdown::Shutdown;

impl RiotClient {
    /// Get account by Riot ID (game name + tag line)
    /// Uses regional routing (americas, europe, asia, sea)
    pub async fn get_account_by_riot_id(
        &self,
        region: Region,
        game_name: &str,
        tag_line: &str,
        shutdown: &Shutdown,
    ) -> Result<AccountDto, AppError> {
        let url = self.url(
            region,
            &format!(
                "/riot/account/v1/accounts/by-riot-id/{}/{}",
                urlencoding::encode(game_name),
                urlencoding::encode(tag_line)
            ),
        );

        self.get(&url, &[], shutdown).await
    }
}
