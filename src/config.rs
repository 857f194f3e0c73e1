use std::env;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub riot_api_key: String,
    pub database_url: String,
    /// Replaces every Riot host when set (local mocks, proxies).
    pub riot_api_base_url: Option<String>,
    pub http_timeout: Duration,
    pub rate_limit_per_second: NonZeroU32,
    pub rate_limit_per_two_minutes: NonZeroU32,
    /// `None` retries throttled calls forever.
    pub max_throttle_retries: Option<u32>,
    pub match_count: u32,
    pub export_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        const DEFAULT_DATABASE_URL: &str = "sqlite:riot_data.db";
        const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
        const DEFAULT_RATE_LIMIT_PER_SECOND: u32 = 20;
        const DEFAULT_RATE_LIMIT_PER_TWO_MINUTES: u32 = 100;
        const DEFAULT_MAX_THROTTLE_RETRIES: u32 = 10;
        const DEFAULT_MATCH_COUNT: u32 = 20;

        let riot_api_key = lookup("RIOT_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::Config("RIOT_API_KEY must be set".into()))?;

        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());

        let riot_api_base_url = lookup("RIOT_API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let http_timeout = Duration::from_secs(
            parse(&lookup, "HTTP_TIMEOUT_SECS").unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        );

        let rate_limit_per_second =
            non_zero(&lookup, "RIOT_RATE_LIMIT_PER_SECOND", DEFAULT_RATE_LIMIT_PER_SECOND);
        let rate_limit_per_two_minutes = non_zero(
            &lookup,
            "RIOT_RATE_LIMIT_PER_TWO_MINUTES",
            DEFAULT_RATE_LIMIT_PER_TWO_MINUTES,
        );

        let max_throttle_retries = match parse(&lookup, "RIOT_MAX_THROTTLE_RETRIES") {
            Some(0) => None,
            Some(n) => Some(n),
            None => Some(DEFAULT_MAX_THROTTLE_RETRIES),
        };

        let match_count = parse(&lookup, "MATCH_COUNT")
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MATCH_COUNT);

        let export_dir = lookup("EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            riot_api_key,
            database_url,
            riot_api_base_url,
            http_timeout,
            rate_limit_per_second,
            rate_limit_per_two_minutes,
            max_throttle_retries,
            match_count,
            export_dir,
        })
    }
}

fn parse<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

fn non_zero(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u32) -> NonZeroU32 {
    parse(lookup, key)
        .and_then(NonZeroU32::new)
        .unwrap_or_else(|| NonZeroU32::new(default).unwrap_or(NonZeroU32::MIN))
}
