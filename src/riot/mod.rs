pub mod client;
mod endpoints;
pub mod metrics;
pub mod rate_limiter;
pub mod region;
pub mod types;

pub use client::{RiotClient, RiotClientBuilder};
pub use metrics::RequestMetrics;
pub use rate_limiter::RateLimiter;
pub use region::{Platform, Region, Route};
pub use types::{AccountDto, MatchDto, ParticipantDto, SummonerDto};
