use std::io::BufReader;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use riot_etl::db::Repository;
use riot_etl::ingest::{IngestReport, IngestRequest, ingest_player};
use riot_etl::riot::{Platform, RiotClient};
use riot_etl::scraper::{LEADERBOARD_URLS, LeaderboardScraper};
use riot_etl::shutdown::Shutdown;
use riot_etl::{AppError, Config, logging, menu};

#[derive(Parser, Debug)]
#[command(
    name = "riot-etl",
    version,
    about = "Ingest a player's ranked match history from the Riot API into SQLite"
)]
struct Cli {
    /// Riot ID of the player, e.g. "Player#BR1"
    handle: String,

    /// Platform code (br1, na1, euw1, kr, ...)
    #[arg(default_value = "br1")]
    region: String,

    /// Number of recent ranked matches to ingest [default: MATCH_COUNT or 20]
    #[arg(long)]
    count: Option<u32>,

    /// List the players of the public leaderboard before ingesting
    #[arg(long)]
    leaderboard: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    info!("🐙 Starting riot-etl v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ AppError::InvalidRegion(_)) => {
            error!(error = %e, "❌ Run aborted");
            eprintln!("Valid regions: {}", Platform::valid_codes());
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = %e, "❌ Run aborted");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = Config::from_env()?;
    let request = IngestRequest::new(
        &cli.handle,
        &cli.region,
        cli.count.unwrap_or(config.match_count),
    )?;

    if cli.leaderboard {
        let handles = LeaderboardScraper::new()?
            .load_handles(&LEADERBOARD_URLS)
            .await;
        println!("Found {} players on the leaderboard:", handles.len());
        for handle in &handles {
            println!("  {handle}");
        }
    }

    let client = RiotClient::from_config(&config)?;
    let repo = Repository::connect(&config.database_url)
        .await?
        .with_export_dir(&config.export_dir);

    let shutdown = Shutdown::shared();
    shutdown.watch_ctrl_c();

    let result = session(&client, &repo, &request, &shutdown).await;

    repo.close().await;
    client.metrics().log_summary();

    result
}

async fn session(
    client: &RiotClient,
    repo: &Repository,
    request: &IngestRequest,
    shutdown: &Arc<Shutdown>,
) -> Result<(), AppError> {
    println!("Fetching data for {} on {}...", request.handle, request.platform);

    let report = ingest_player(client, repo, request, shutdown).await?;
    print_report(&report);

    if report.cancelled {
        return Ok(());
    }

    let mut lines = menu::spawn_line_reader(BufReader::new(std::io::stdin()));
    let mut stdout = std::io::stdout();

    // Ctrl+C while waiting at the prompt ends the session.
    match shutdown
        .guard(menu::run(repo, &report.profile.puuid, &mut lines, &mut stdout))
        .await
    {
        Ok(result) => result,
        Err(_) => {
            warn!("🛑 Leaving menu");
            Ok(())
        }
    }
}

fn print_report(report: &IngestReport) {
    println!(
        "Found summoner: {} (Level {})",
        report.profile.name, report.profile.summoner_level
    );

    if report.match_ids.is_empty() {
        println!("No ranked matches found.");
        return;
    }

    println!(
        "Saved {} of {} matches to database",
        report.records.len(),
        report.match_ids.len()
    );
    for failure in &report.failures {
        println!("  skipped {}: {}", failure.match_id, failure.error);
    }
    if report.cancelled {
        println!("Interrupted before every match was processed.");
    }
}
