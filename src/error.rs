use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid player handle '{0}', expected 'name#tagline'")]
    InvalidHandle(String),

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Riot API error: {status} - {message}")]
    RiotApi { status: u16, message: String },

    #[error("Decoding response body failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Still throttled after {attempts} retries")]
    ThrottleRetriesExhausted { attempts: u32 },

    #[error("Could not resolve player {handle}: {source}")]
    IdentityResolution {
        handle: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Could not list matches of {puuid}: {source}")]
    MatchList {
        puuid: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Could not fetch match {match_id}: {source}")]
    MatchFetch {
        match_id: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Player {puuid} not found in match {match_id}")]
    ParticipantNotFound { puuid: String, match_id: String },

    #[error("Invalid payload for match {match_id}: {reason}")]
    InvalidPayload { match_id: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

impl AppError {
    pub fn identity(handle: &str, source: AppError) -> Self {
        Self::IdentityResolution {
            handle: handle.to_string(),
            source: Box::new(source),
        }
    }

    pub fn match_list(puuid: &str, source: AppError) -> Self {
        Self::MatchList {
            puuid: puuid.to_string(),
            source: Box::new(source),
        }
    }

    pub fn match_fetch(match_id: &str, source: AppError) -> Self {
        Self::MatchFetch {
            match_id: match_id.to_string(),
            source: Box::new(source),
        }
    }

    /// True when the error, or the error it wraps, is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::IdentityResolution { source, .. }
            | Self::MatchList { source, .. }
            | Self::MatchFetch { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}
