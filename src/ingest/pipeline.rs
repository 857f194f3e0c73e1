use async_trait::async_trait;
use tracing::{Span, error, info, instrument, warn};

use super::identity::{IdentityResolver, parse_handle};
use super::matches::{MatchIngestor, project};
use crate::error::AppError;
use crate::models::{MatchRecord, SummonerProfile};
use crate::riot::{Platform, RiotClient};
use crate::shutdown::Shutdown;

/// Destination of an ingestion run. Both operations are upserts, so feeding
/// the same data twice leaves the store unchanged.
#[async_trait]
pub trait MatchSink: Send + Sync {
    async fn upsert_summoner(&self, profile: &SummonerProfile) -> Result<(), AppError>;

    async fn upsert_matches(&self, records: &[MatchRecord]) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub handle: String,
    pub platform: Platform,
    pub match_count: u32,
}

impl IngestRequest {
    /// Validate caller input. Fails with `InvalidHandle` or `InvalidRegion`
    /// without touching the network.
    pub fn new(handle: &str, region: &str, match_count: u32) -> Result<Self, AppError> {
        parse_handle(handle)?;
        let platform = region.parse()?;

        Ok(Self {
            handle: handle.trim().to_string(),
            platform,
            match_count,
        })
    }
}

/// A match that was skipped, with the reason.
#[derive(Debug)]
pub struct MatchFailure {
    pub match_id: String,
    pub error: AppError,
}

#[derive(Debug)]
pub struct IngestReport {
    pub profile: SummonerProfile,
    pub match_ids: Vec<String>,
    pub records: Vec<MatchRecord>,
    pub failures: Vec<MatchFailure>,
    /// Set when shutdown stopped the loop before every id was processed.
    pub cancelled: bool,
}

/// Resolve the player, store the profile, then fetch and store their recent
/// ranked matches.
///
/// Identity resolution and enumeration failures abort the run. A match that
/// cannot be fetched or projected is logged and skipped; the rest of the batch
/// is still handed to the sink in a single call.
#[instrument(
    skip_all,
    fields(
        handle = %request.handle,
        platform = %request.platform,
        match_count = request.match_count,
        puuid
    )
)]
pub async fn ingest_player(
    client: &RiotClient,
    sink: &dyn MatchSink,
    request: &IngestRequest,
    shutdown: &Shutdown,
) -> Result<IngestReport, AppError> {
    let region = request.platform.to_region();

    let profile = IdentityResolver::new(client)
        .resolve(&request.handle, region, request.platform, shutdown)
        .await?;
    Span::current().record("puuid", profile.puuid.as_str());
    info!(name = %profile.name, level = profile.summoner_level, "📥 Player resolved");

    sink.upsert_summoner(&profile).await?;

    let ingestor = MatchIngestor::new(client);
    let match_ids = ingestor
        .enumerate_ranked(&profile.puuid, region, request.match_count, shutdown)
        .await?;

    if match_ids.is_empty() {
        info!("📥 No ranked matches found");
        return Ok(IngestReport {
            profile,
            match_ids,
            records: Vec::new(),
            failures: Vec::new(),
            cancelled: false,
        });
    }

    info!(count = match_ids.len(), "📥 Ingesting {} match(es)", match_ids.len());

    let mut records = Vec::with_capacity(match_ids.len());
    let mut failures = Vec::new();
    let mut cancelled = false;

    for match_id in &match_ids {
        if shutdown.is_requested() {
            cancelled = true;
            break;
        }

        let outcome = match ingestor.fetch_match(match_id, region, shutdown).await {
            Ok(payload) => project(
                &payload,
                &profile.puuid,
                &profile.name,
                request.platform.as_str(),
            ),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(record) => records.push(record),
            Err(e) if e.is_cancelled() => {
                cancelled = true;
                break;
            }
            Err(e) => {
                warn!(match_id = %match_id, error = %e, "📥 ⚠️ Skipping match");
                failures.push(MatchFailure {
                    match_id: match_id.clone(),
                    error: e,
                });
            }
        }
    }

    if cancelled {
        warn!(
            processed = records.len() + failures.len(),
            total = match_ids.len(),
            "📥 ⚠️ Ingestion interrupted"
        );
    }

    if records.is_empty() {
        error!("📥 ❌ No match could be ingested");
    } else {
        sink.upsert_matches(&records).await?;
    }

    info!(
        saved = records.len(),
        skipped = failures.len(),
        "📥 ✅ Ingestion finished"
    );

    Ok(IngestReport {
        profile,
        match_ids,
        records,
        failures,
        cancelled,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use httpmock::prelude::*;

    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::ingest::fixtures::{self, PUUID};

    #[derive(Default)]
    struct RecordingSink {
        summoners: Mutex<Vec<SummonerProfile>>,
        batches: Mutex<Vec<Vec<MatchRecord>>>,
    }

    impl RecordingSink {
        fn summoner_calls(&self) -> usize {
            self.summoners.lock().unwrap().len()
        }

        fn batches(&self) -> Vec<Vec<MatchRecord>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MatchSink for RecordingSink {
        async fn upsert_summoner(&self, profile: &SummonerProfile) -> Result<(), AppError> {
            self.summoners.lock().unwrap().push(profile.clone());
            Ok(())
        }

        async fn upsert_matches(&self, records: &[MatchRecord]) -> Result<(), AppError> {
            self.batches.lock().unwrap().push(records.to_vec());
            Ok(())
        }
    }

    fn client_for(server: &MockServer) -> RiotClient {
        RiotClient::builder("RGAPI-test")
            .base_url(server.base_url())
            .clock(Arc::new(ManualClock::new()))
            .build()
            .unwrap()
    }

    fn request() -> IngestRequest {
        IngestRequest {
            handle: "Foo#BR1".to_string(),
            platform: Platform::BR1,
            match_count: 20,
        }
    }

    #[test]
    fn request_validates_handle_and_region() {
        let request = IngestRequest::new(" Foo#BR1 ", "BR", 5).unwrap();
        assert_eq!(request.handle, "Foo#BR1");
        assert_eq!(request.platform, Platform::BR1);
        assert_eq!(request.match_count, 5);

        assert!(matches!(
            IngestRequest::new("Foo#BR1", "xx9", 5),
            Err(AppError::InvalidRegion(ref code)) if code == "xx9"
        ));
        assert!(matches!(
            IngestRequest::new("FooBR1", "br1", 5),
            Err(AppError::InvalidHandle(_))
        ));
    }

    #[tokio::test]
    async fn one_failing_match_does_not_lose_the_others() {
        let server = MockServer::start_async().await;
        fixtures::mock_identity(&server).await;
        let ids = ["BR1_1", "BR1_2", "BR1_3", "BR1_4", "BR1_5"];
        fixtures::mock_match_ids(&server, &ids).await;
        for (i, id) in ids.iter().enumerate() {
            if i == 2 {
                server
                    .mock_async(|when, then| {
                        when.method(GET).path(format!("/lol/match/v5/matches/{id}"));
                        then.status(500).body("internal");
                    })
                    .await;
            } else {
                fixtures::mock_match(
                    &server,
                    id,
                    fixtures::match_json(id, fixtures::participant_json(PUUID, i % 2 == 0, i as i32)),
                )
                .await;
            }
        }
        let client = client_for(&server);
        let sink = RecordingSink::default();

        let report = ingest_player(&client, &sink, &request(), &Shutdown::new())
            .await
            .unwrap();

        assert!(!report.cancelled);
        assert_eq!(report.match_ids.len(), 5);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].match_id, "BR1_3");

        let batches = sink.batches();
        assert_eq!(batches.len(), 1);
        let stored: Vec<_> = batches[0].iter().map(|r| r.match_id.as_str()).collect();
        assert_eq!(stored, ["BR1_1", "BR1_2", "BR1_4", "BR1_5"]);
        assert!(batches[0].iter().all(|r| r.puuid == PUUID && r.region == "br1"));
        assert_eq!(sink.summoner_calls(), 1);
    }

    #[tokio::test]
    async fn match_without_the_player_is_skipped() {
        let server = MockServer::start_async().await;
        fixtures::mock_identity(&server).await;
        fixtures::mock_match_ids(&server, &["BR1_1", "BR1_2"]).await;
        fixtures::mock_match(
            &server,
            "BR1_1",
            fixtures::match_json("BR1_1", fixtures::participant_json("stranger", true, 1)),
        )
        .await;
        fixtures::mock_match(
            &server,
            "BR1_2",
            fixtures::match_json("BR1_2", fixtures::participant_json(PUUID, true, 9)),
        )
        .await;
        let client = client_for(&server);
        let sink = RecordingSink::default();

        let report = ingest_player(&client, &sink, &request(), &Shutdown::new())
            .await
            .unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].kills, 9);
        assert!(matches!(
            report.failures[0].error,
            AppError::ParticipantNotFound { .. }
        ));
        assert_eq!(sink.batches().len(), 1);
    }

    #[tokio::test]
    async fn no_ranked_matches_skips_the_match_upsert() {
        let server = MockServer::start_async().await;
        fixtures::mock_identity(&server).await;
        fixtures::mock_match_ids(&server, &[]).await;
        let client = client_for(&server);
        let sink = RecordingSink::default();

        let report = ingest_player(&client, &sink, &request(), &Shutdown::new())
            .await
            .unwrap();

        assert!(report.records.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(sink.summoner_calls(), 1);
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn every_match_failing_skips_the_match_upsert() {
        let server = MockServer::start_async().await;
        fixtures::mock_identity(&server).await;
        fixtures::mock_match_ids(&server, &["BR1_1", "BR1_2"]).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/lol/match/v5/matches/BR1_");
                then.status(503).body("unavailable");
            })
            .await;
        let client = client_for(&server);
        let sink = RecordingSink::default();

        let report = ingest_player(&client, &sink, &request(), &Shutdown::new())
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 2);
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn identity_failure_aborts_before_the_sink() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/riot/account/v1/");
                then.status(404).body("Data not found");
            })
            .await;
        let client = client_for(&server);
        let sink = RecordingSink::default();

        let res = ingest_player(&client, &sink, &request(), &Shutdown::new()).await;

        assert!(matches!(res, Err(AppError::IdentityResolution { .. })));
        assert_eq!(sink.summoner_calls(), 0);
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn enumeration_failure_is_fatal() {
        let server = MockServer::start_async().await;
        fixtures::mock_identity(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/ids");
                then.status(500).body("internal");
            })
            .await;
        let client = client_for(&server);
        let sink = RecordingSink::default();

        let res = ingest_player(&client, &sink, &request(), &Shutdown::new()).await;

        match res {
            Err(AppError::MatchList { puuid, source }) => {
                assert_eq!(puuid, PUUID);
                assert!(matches!(*source, AppError::RiotApi { status: 500, .. }));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(sink.batches().is_empty());
    }

    #[tokio::test]
    async fn shutdown_keeps_what_was_collected() {
        let server = MockServer::start_async().await;
        fixtures::mock_identity(&server).await;
        fixtures::mock_match_ids(&server, &["BR1_1", "BR1_2", "BR1_3"]).await;
        fixtures::mock_match(
            &server,
            "BR1_1",
            fixtures::match_json("BR1_1", fixtures::participant_json(PUUID, true, 5)),
        )
        .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/lol/match/v5/matches/BR1_2");
                then.status(200)
                    .delay(Duration::from_secs(10))
                    .json_body(fixtures::match_json(
                        "BR1_2",
                        fixtures::participant_json(PUUID, true, 6),
                    ));
            })
            .await;
        let third = server
            .mock_async(|when, then| {
                when.method(GET).path("/lol/match/v5/matches/BR1_3");
                then.status(200);
            })
            .await;
        let client = client_for(&server);
        let sink = RecordingSink::default();
        let shutdown = Shutdown::shared();

        let trigger = Arc::clone(&shutdown);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.request();
        });

        let report = ingest_player(&client, &sink, &request(), &shutdown)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert_eq!(report.records.len(), 1);
        assert!(report.failures.is_empty());
        assert_eq!(sink.batches(), vec![report.records.clone()]);
        third.assert_hits_async(0).await;
    }
}
