use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS summoners (
    puuid TEXT PRIMARY KEY,
    summoner_id TEXT,
    account_id TEXT,
    name TEXT NOT NULL,
    profile_icon_id INTEGER NOT NULL,
    summoner_level INTEGER NOT NULL,
    last_updated TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS matches (
    match_id TEXT NOT NULL,
    puuid TEXT NOT NULL,
    player_name TEXT NOT NULL,
    region TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    duration INTEGER NOT NULL,
    game_mode TEXT NOT NULL,
    win BOOLEAN NOT NULL,
    kills INTEGER NOT NULL,
    deaths INTEGER NOT NULL,
    assists INTEGER NOT NULL,
    cs INTEGER NOT NULL,
    gold INTEGER NOT NULL,
    items TEXT NOT NULL,
    PRIMARY KEY (match_id, puuid)
);

CREATE INDEX IF NOT EXISTS idx_matches_puuid ON matches(puuid);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("🗄️ Database migrations completed");
    Ok(())
}
