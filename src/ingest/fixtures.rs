use httpmock::prelude::*;
use serde_json::{Value, json};

pub const PUUID: &str = "puuid-foo";
pub const GAME_CREATION: i64 = 1_700_000_000_000;

pub fn account_json() -> Value {
    json!({ "puuid": PUUID, "gameName": "Foo", "tagLine": "BR1" })
}

pub fn summoner_json() -> Value {
    json!({
        "id": "summoner-id",
        "accountId": "account-id",
        "puuid": PUUID,
        "profileIconId": 4568,
        "revisionDate": 1_700_000_000_000i64,
        "summonerLevel": 312
    })
}

pub fn participant_json(puuid: &str, win: bool, kills: i32) -> Value {
    json!({
        "puuid": puuid,
        "championId": 157,
        "win": win,
        "kills": kills,
        "deaths": 4,
        "assists": 7,
        "totalMinionsKilled": 188,
        "goldEarned": 11_250,
        "item0": 3031,
        "item1": 3006,
        "item2": 3094,
        "item3": 0,
        "item4": 1055,
        "item5": 3072,
        "item6": 3363
    })
}

pub fn match_json(match_id: &str, player: Value) -> Value {
    json!({
        "metadata": { "matchId": match_id },
        "info": {
            "gameCreation": GAME_CREATION,
            "gameDuration": 1_845,
            "gameMode": "CLASSIC",
            "queueId": 420,
            "participants": [participant_json("someone-else", false, 1), player]
        }
    })
}

/// Mount the account and summoner lookups for `Foo#BR1`.
pub async fn mock_identity(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/riot/account/v1/accounts/by-riot-id/Foo/BR1");
            then.status(200).json_body(account_json());
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/lol/summoner/v4/summoners/by-puuid/{PUUID}"));
            then.status(200).json_body(summoner_json());
        })
        .await;
}

pub async fn mock_match_ids(server: &MockServer, ids: &[&str]) {
    let ids: Vec<&str> = ids.to_vec();
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/lol/match/v5/matches/by-puuid/{PUUID}/ids"))
                .query_param("queue", "420")
                .query_param("start", "0");
            then.status(200).json_body(json!(ids));
        })
        .await;
}

pub async fn mock_match(server: &MockServer, match_id: &str, body: Value) {
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path(format!("/lol/match/v5/matches/{match_id}"));
            then.status(200).json_body(body);
        })
        .await;
}
