use chrono::Utc;
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::models::{Identity, SummonerProfile};
use crate::riot::{Platform, Region, RiotClient};
use crate::shutdown::Shutdown;

/// Split a `name#tagline` handle. Both parts must be non-empty.
pub fn parse_handle(handle: &str) -> Result<(&str, &str), AppError> {
    match handle.trim().split_once('#') {
        Some((name, tag)) if !name.trim().is_empty() && !tag.trim().is_empty() => {
            Ok((name.trim(), tag.trim()))
        }
        _ => Err(AppError::InvalidHandle(handle.to_string())),
    }
}

/// Resolves a Riot ID handle to the player's stable identity and profile.
pub struct IdentityResolver<'a> {
    client: &'a RiotClient,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(client: &'a RiotClient) -> Self {
        Self { client }
    }

    /// Account-v1 lookup on the routing region.
    pub async fn resolve_identity(
        &self,
        handle: &str,
        region: Region,
        shutdown: &Shutdown,
    ) -> Result<Identity, AppError> {
        let (game_name, tag_line) = parse_handle(handle)?;

        let account = self
            .client
            .get_account_by_riot_id(region, game_name, tag_line, shutdown)
            .await
            .map_err(|e| AppError::identity(handle, e))?;

        Ok(Identity {
            puuid: account.puuid,
            game_name: account.game_name.unwrap_or_else(|| game_name.to_string()),
            tag_line: account.tag_line.unwrap_or_else(|| tag_line.to_string()),
        })
    }

    /// Account lookup followed by the Summoner-v4 lookup on the platform
    /// shard, merged into one profile named after the account's game name.
    #[instrument(skip(self, shutdown))]
    pub async fn resolve(
        &self,
        handle: &str,
        region: Region,
        platform: Platform,
        shutdown: &Shutdown,
    ) -> Result<SummonerProfile, AppError> {
        let identity = self.resolve_identity(handle, region, shutdown).await?;
        debug!(puuid = %identity.puuid, riot_id = %identity.riot_id(), "👤 Account resolved");

        let summoner = self
            .client
            .get_summoner_by_puuid(platform, &identity.puuid, shutdown)
            .await
            .map_err(|e| AppError::identity(handle, e))?;

        Ok(SummonerProfile {
            puuid: identity.puuid,
            summoner_id: summoner.id,
            account_id: summoner.account_id,
            name: identity.game_name,
            profile_icon_id: summoner.profile_icon_id,
            summoner_level: summoner.summoner_level,
            last_updated: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use httpmock::prelude::*;

    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::ingest::fixtures::{self, PUUID};

    fn client_for(server: &MockServer) -> RiotClient {
        RiotClient::builder("RGAPI-test")
            .base_url(server.base_url())
            .clock(Arc::new(ManualClock::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn handles_split_on_the_hash() {
        assert_eq!(parse_handle("Foo#BR1").unwrap(), ("Foo", "BR1"));
        assert_eq!(parse_handle(" Le Foo # BR1 ").unwrap(), ("Le Foo", "BR1"));
    }

    #[test]
    fn handles_without_both_parts_are_rejected() {
        for bad in ["FooBR1", "#BR1", "Foo#", "", "#"] {
            assert!(
                matches!(parse_handle(bad), Err(AppError::InvalidHandle(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn resolve_merges_account_and_summoner() {
        let server = MockServer::start_async().await;
        fixtures::mock_identity(&server).await;
        let client = client_for(&server);

        let profile = IdentityResolver::new(&client)
            .resolve("Foo#BR1", Region::Americas, Platform::BR1, &Shutdown::new())
            .await
            .unwrap();

        assert_eq!(profile.puuid, PUUID);
        assert_eq!(profile.name, "Foo");
        assert_eq!(profile.summoner_id.as_deref(), Some("summoner-id"));
        assert_eq!(profile.account_id.as_deref(), Some("account-id"));
        assert_eq!(profile.profile_icon_id, 4568);
        assert_eq!(profile.summoner_level, 312);
    }

    #[tokio::test]
    async fn account_name_wins_over_typed_handle() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/riot/account/v1/accounts/by-riot-id/foo/br1");
                then.status(200).json_body(fixtures::account_json());
            })
            .await;
        let client = client_for(&server);

        let identity = IdentityResolver::new(&client)
            .resolve_identity("foo#br1", Region::Americas, &Shutdown::new())
            .await
            .unwrap();

        assert_eq!(identity.riot_id(), "Foo#BR1");
    }

    #[tokio::test]
    async fn invalid_handle_fails_before_any_request() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|_when, then| {
                then.status(200);
            })
            .await;
        let client = client_for(&server);

        let res = IdentityResolver::new(&client)
            .resolve("FooBR1", Region::Americas, Platform::BR1, &Shutdown::new())
            .await;

        assert!(matches!(res, Err(AppError::InvalidHandle(_))));
        any.assert_hits_async(0).await;
        assert_eq!(client.metrics().requests(), 0);
    }

    #[tokio::test]
    async fn summoner_failure_is_wrapped() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/riot/account/v1/accounts/by-riot-id/Foo/BR1");
                then.status(200).json_body(fixtures::account_json());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(format!("/lol/summoner/v4/summoners/by-puuid/{PUUID}"));
                then.status(403).body("Forbidden");
            })
            .await;
        let client = client_for(&server);

        let res = IdentityResolver::new(&client)
            .resolve("Foo#BR1", Region::Americas, Platform::BR1, &Shutdown::new())
            .await;

        match res {
            Err(AppError::IdentityResolution { handle, source }) => {
                assert_eq!(handle, "Foo#BR1");
                assert!(matches!(*source, AppError::RiotApi { status: 403, .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
