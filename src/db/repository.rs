use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Local;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info};

use super::migrations::run_migrations;
use super::models::{MatchRow, SummonerRow};
use crate::error::AppError;
use crate::ingest::MatchSink;
use crate::models::{MatchRecord, SummonerProfile};

const MATCH_COLUMNS: &str = "match_id, puuid, player_name, region, timestamp, duration, \
     game_mode, win, kills, deaths, assists, cs, gold, items";

#[derive(Clone, Debug)]
pub struct Repository {
    pool: SqlitePool,
    export_dir: PathBuf,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            export_dir: PathBuf::from("."),
        }
    }

    /// Open (creating if needed) the database at `database_url` and apply the
    /// schema.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // One writer; also keeps `sqlite::memory:` databases alive for the
        // lifetime of the pool.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        run_migrations(&pool).await?;
        debug!(database_url, "🗄️ Database connection opened");

        Ok(Self::new(pool))
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }

    // === Summoner operations ===

    pub async fn upsert_summoner(&self, profile: &SummonerProfile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO summoners
                (puuid, summoner_id, account_id, name, profile_icon_id, summoner_level, last_updated)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(puuid) DO UPDATE SET
                summoner_id = excluded.summoner_id,
                account_id = excluded.account_id,
                name = excluded.name,
                profile_icon_id = excluded.profile_icon_id,
                summoner_level = excluded.summoner_level,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(&profile.puuid)
        .bind(&profile.summoner_id)
        .bind(&profile.account_id)
        .bind(&profile.name)
        .bind(profile.profile_icon_id)
        .bind(profile.summoner_level)
        .bind(profile.last_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_summoner(&self, puuid: &str) -> Result<Option<SummonerProfile>, AppError> {
        let row = sqlx::query_as::<_, SummonerRow>(
            "SELECT puuid, summoner_id, account_id, name, profile_icon_id, summoner_level, last_updated \
             FROM summoners WHERE puuid = ?",
        )
        .bind(puuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SummonerProfile::from))
    }

    // === Match operations ===

    /// Insert or replace every record in one transaction.
    pub async fn upsert_matches(&self, records: &[MatchRecord]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        for record in records {
            let items = serde_json::to_string(&record.items)?;

            sqlx::query(&format!(
                r#"
                INSERT INTO matches ({MATCH_COLUMNS})
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(match_id, puuid) DO UPDATE SET
                    player_name = excluded.player_name,
                    region = excluded.region,
                    timestamp = excluded.timestamp,
                    duration = excluded.duration,
                    game_mode = excluded.game_mode,
                    win = excluded.win,
                    kills = excluded.kills,
                    deaths = excluded.deaths,
                    assists = excluded.assists,
                    cs = excluded.cs,
                    gold = excluded.gold,
                    items = excluded.items
                "#
            ))
            .bind(&record.match_id)
            .bind(&record.puuid)
            .bind(&record.player_name)
            .bind(&record.region)
            .bind(record.timestamp)
            .bind(record.duration)
            .bind(&record.game_mode)
            .bind(record.win)
            .bind(record.kills)
            .bind(record.deaths)
            .bind(record.assists)
            .bind(record.cs)
            .bind(record.gold)
            .bind(items)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!(count = records.len(), "🗄️ Saved {} match(es)", records.len());
        Ok(())
    }

    pub async fn matches_for_player(&self, puuid: &str) -> Result<Vec<MatchRow>, AppError> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE puuid = ? ORDER BY timestamp DESC"
        ))
        .bind(puuid)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn all_matches(&self) -> Result<Vec<MatchRow>, AppError> {
        let rows = sqlx::query_as::<_, MatchRow>(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches ORDER BY timestamp DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // === Export ===

    /// Write the matches of `puuid` (or every match) to a CSV file and return
    /// its path. Without an explicit `path` a timestamped file is created in
    /// the export directory.
    pub async fn export_csv(
        &self,
        puuid: Option<&str>,
        path: Option<&Path>,
    ) -> Result<PathBuf, AppError> {
        let rows = match puuid {
            Some(puuid) => self.matches_for_player(puuid).await?,
            None => self.all_matches().await?,
        };

        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.export_dir.join(format!(
                "matches_export_{}.csv",
                Local::now().format("%Y%m%d_%H%M%S")
            )),
        };

        let mut writer = csv::Writer::from_path(&path)?;
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        info!(rows = rows.len(), path = %path.display(), "🗄️ Exported matches to CSV");
        Ok(path)
    }

    pub async fn close(&self) {
        self.pool.close().await;
        debug!("🗄️ Database connection closed");
    }
}

#[async_trait]
impl MatchSink for Repository {
    async fn upsert_summoner(&self, profile: &SummonerProfile) -> Result<(), AppError> {
        Repository::upsert_summoner(self, profile).await
    }

    async fn upsert_matches(&self, records: &[MatchRecord]) -> Result<(), AppError> {
        Repository::upsert_matches(self, records).await
    }
}
