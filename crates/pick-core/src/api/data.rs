//! Market data feed client: leaderboards, wallet positions, and market
//! resolution state.

use crate::rate_limit::RateLimiter;
use crate::types::{MarketResolution, TraderPosition};
use crate::{Error, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tracing::warn;

/// Leaderboard aggregation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderboardPeriod {
    All,
    Month,
    Week,
}

impl LeaderboardPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Month => "MONTH",
            Self::Week => "WEEK",
        }
    }
}

/// One leaderboard entry as reported by the data feed.
#[derive(Debug, Clone, Deserialize)]
pub struct LeaderboardRow {
    /// Proxy wallet address; some feed versions report `user` instead.
    #[serde(default, rename = "proxyWallet")]
    pub proxy_wallet: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, rename = "userName")]
    pub user_name: Option<String>,
    #[serde(default)]
    pub pnl: Decimal,
    #[serde(default)]
    pub vol: Decimal,
    #[serde(default)]
    pub rank: Option<u32>,
}

impl LeaderboardRow {
    /// Wallet address resolution order: proxy wallet, then raw user field.
    pub fn wallet_address(&self) -> Option<&str> {
        self.proxy_wallet
            .as_deref()
            .or(self.user.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Read-only market data feed consumed by the ranker, detector, and
/// resolver.
#[async_trait]
pub trait MarketFeed: Send + Sync {
    /// Top traders for the given period, ordered by PnL.
    async fn leaderboard(&self, period: LeaderboardPeriod, limit: u32)
        -> Result<Vec<LeaderboardRow>>;

    /// Current positions held by a wallet.
    async fn positions(&self, wallet: &str) -> Result<Vec<TraderPosition>>;

    /// Resolution state of a market.
    async fn resolution(&self, market_id: &str) -> Result<MarketResolution>;
}

/// HTTP client for the market data API.
pub struct DataApiClient {
    base_url: String,
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
}

/// Rate-limiter key for the market data service.
pub const DATA_API_SERVICE: &str = "data_api";

impl DataApiClient {
    /// Default data API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://data-api.polymarket.com";

    /// Maximum retry attempts for feed calls.
    const MAX_RETRIES: u32 = 3;

    pub fn new(base_url: Option<String>, rate_limiter: Arc<RateLimiter>) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(15))
            .connect_timeout(StdDuration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            base_url: base_url.unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            http_client,
            rate_limiter,
        }
    }

    /// Execute a GET with retry and exponential backoff on 5xx and 429.
    /// Other 4xx responses fail immediately.
    async fn get_with_retry(&self, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let mut last_error = None;

        for attempt in 0..Self::MAX_RETRIES {
            self.rate_limiter.wait(DATA_API_SERVICE).await;

            match self.http_client.get(url).query(query).send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response)
                    if response.status().as_u16() == 429 || response.status().is_server_error() =>
                {
                    let status = response.status();
                    warn!(
                        attempt = attempt + 1,
                        status = %status,
                        url = url,
                        "Retryable feed error, backing off"
                    );
                    last_error = Some(Error::Api {
                        message: format!("Feed error: {}", status),
                        status: Some(status.as_u16()),
                    });
                }
                Ok(response) => {
                    return Err(Error::Api {
                        message: format!("Feed error: {}", response.status()),
                        status: Some(response.status().as_u16()),
                    });
                }
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, url = url, "Feed request failed");
                    last_error = Some(Error::Http(e));
                }
            }

            if attempt + 1 < Self::MAX_RETRIES {
                tokio::time::sleep(StdDuration::from_millis(500 * 2u64.pow(attempt))).await;
            }
        }

        Err(last_error.unwrap_or(Error::Api {
            message: "Feed request failed".to_string(),
            status: None,
        }))
    }
}

/// Some feed endpoints return a bare array, others wrap it in a field.
#[derive(Deserialize)]
#[serde(untagged)]
enum MaybeWrapped<T> {
    Bare(Vec<T>),
    Data { data: Vec<T> },
    Positions { positions: Vec<T> },
}

impl<T> MaybeWrapped<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(v) | Self::Data { data: v } | Self::Positions { positions: v } => v,
        }
    }
}

#[async_trait]
impl MarketFeed for DataApiClient {
    async fn leaderboard(
        &self,
        period: LeaderboardPeriod,
        limit: u32,
    ) -> Result<Vec<LeaderboardRow>> {
        let url = format!("{}/v1/leaderboard", self.base_url);
        let query = [
            ("timePeriod", period.as_str().to_string()),
            ("category", "OVERALL".to_string()),
            ("orderBy", "PNL".to_string()),
            ("limit", limit.to_string()),
            ("offset", "0".to_string()),
        ];
        let response = self.get_with_retry(&url, &query).await?;
        let rows: MaybeWrapped<LeaderboardRow> = response.json().await?;
        Ok(rows.into_vec())
    }

    async fn positions(&self, wallet: &str) -> Result<Vec<TraderPosition>> {
        let url = format!("{}/positions", self.base_url);
        let query = [
            ("user", wallet.to_string()),
            ("sizeThreshold", "100".to_string()),
            ("limit", "50".to_string()),
        ];
        let response = self.get_with_retry(&url, &query).await?;
        let positions: MaybeWrapped<TraderPosition> = response.json().await?;
        Ok(positions.into_vec())
    }

    async fn resolution(&self, market_id: &str) -> Result<MarketResolution> {
        #[derive(Deserialize)]
        struct ResolutionBody {
            #[serde(default)]
            resolved: bool,
            #[serde(default)]
            outcome: Option<String>,
            #[serde(default)]
            resolution: Option<String>,
        }

        let url = format!("{}/markets/{}", self.base_url, market_id);
        let response = self.get_with_retry(&url, &[]).await?;
        let body: ResolutionBody = response.json().await?;

        if body.resolved {
            // Older feed versions report the outcome under `resolution`.
            match body.outcome.or(body.resolution) {
                Some(outcome) => Ok(MarketResolution::resolved_as(&outcome)),
                None => Ok(MarketResolution::unresolved()),
            }
        } else {
            Ok(MarketResolution::unresolved())
        }
    }
}
