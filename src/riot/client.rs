use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{trace, warn};

use super::metrics::RequestMetrics;
use super::rate_limiter::RateLimiter;
use super::region::Route;
use crate::clock::{Clock, TokioClock};
use crate::config::Config;
use crate::error::AppError;
use crate::shutdown::Shutdown;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// Rate limited Riot API client. Every attempt, retries included, goes
/// through the [`RateLimiter`] first.
pub struct RiotClient {
    http: reqwest::Client,
    limiter: RateLimiter,
    clock: Arc<dyn Clock>,
    metrics: Arc<RequestMetrics>,
    base_url: Option<String>,
    max_throttle_retries: Option<u32>,
}

pub struct RiotClientBuilder {
    api_key: String,
    timeout: Duration,
    base_url: Option<String>,
    per_second: NonZeroU32,
    per_two_minutes: NonZeroU32,
    max_throttle_retries: Option<u32>,
    clock: Arc<dyn Clock>,
}

impl RiotClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send every request to `base_url` instead of the regional Riot hosts.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn rate_limits(mut self, per_second: NonZeroU32, per_two_minutes: NonZeroU32) -> Self {
        self.per_second = per_second;
        self.per_two_minutes = per_two_minutes;
        self
    }

    /// `None` keeps retrying throttled calls for as long as Riot asks.
    pub fn max_throttle_retries(mut self, max: Option<u32>) -> Self {
        self.max_throttle_retries = max;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Result<RiotClient, AppError> {
        let mut token = HeaderValue::from_str(&self.api_key)
            .map_err(|_| AppError::Config("RIOT_API_KEY contains invalid characters".into()))?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static("x-riot-token"), token);
        headers.insert(
            header::ACCEPT_CHARSET,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
        );
        headers.insert(
            header::ORIGIN,
            HeaderValue::from_static("https://developer.riotgames.com"),
        );

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?;

        Ok(RiotClient {
            http,
            limiter: RateLimiter::with_capacities(
                self.per_second,
                self.per_two_minutes,
                self.clock.clone(),
            ),
            clock: self.clock,
            metrics: RequestMetrics::new(),
            base_url: self.base_url,
            max_throttle_retries: self.max_throttle_retries,
        })
    }
}

impl RiotClient {
    pub fn builder(api_key: impl Into<String>) -> RiotClientBuilder {
        RiotClientBuilder {
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            base_url: None,
            per_second: NonZeroU32::new(20).unwrap_or(NonZeroU32::MIN),
            per_two_minutes: NonZeroU32::new(100).unwrap_or(NonZeroU32::MIN),
            max_throttle_retries: Some(10),
            clock: Arc::new(TokioClock),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let mut builder = Self::builder(config.riot_api_key.clone())
            .timeout(config.http_timeout)
            .rate_limits(config.rate_limit_per_second, config.rate_limit_per_two_minutes)
            .max_throttle_retries(config.max_throttle_retries);

        if let Some(base_url) = &config.riot_api_base_url {
            builder = builder.base_url(base_url.clone());
        }

        builder.build()
    }

    pub fn metrics(&self) -> &Arc<RequestMetrics> {
        &self.metrics
    }

    /// Absolute URL of `path` on the host serving `route`.
    pub(crate) fn url(&self, route: impl Route, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{base}{path}"),
            None => format!("{}{}", route.base_url(), path),
        }
    }

    /// GET `url` and decode the JSON body.
    ///
    /// Throttled (429) responses are absorbed: the call sleeps for the
    /// `Retry-After` delay and tries again. Any other non-2xx status and any
    /// transport failure is returned immediately.
    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        shutdown: &Shutdown,
    ) -> Result<T, AppError> {
        let mut throttled: u32 = 0;

        loop {
            self.limiter.admit(shutdown).await?;
            self.metrics.inc();
            trace!(url, ?query, "🛰️ GET");

            let res = shutdown
                .guard(self.http.get(url).query(query).send())
                .await??;

            let status = res.status();
            if status.is_success() {
                let body = res.bytes().await?;
                return Ok(serde_json::from_slice(&body)?);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                self.metrics.inc_throttled();

                if let Some(max) = self.max_throttle_retries {
                    if throttled >= max {
                        return Err(AppError::ThrottleRetriesExhausted { attempts: throttled });
                    }
                }
                throttled += 1;

                let delay = retry_after(res.headers());
                warn!(
                    url,
                    retry_after_secs = delay.as_secs(),
                    attempt = throttled,
                    "🛰️ ⏳ Rate limit exceeded, backing off"
                );
                shutdown.guard(self.clock.sleep(delay)).await?;
                continue;
            }

            let message = res.text().await.unwrap_or_default();
            return Err(AppError::RiotApi {
                status: status.as_u16(),
                message,
            });
        }
    }
}

fn retry_after(headers: &HeaderMap) -> Duration {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}
