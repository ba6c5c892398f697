//! Configuration management for the polypick engine.

use crate::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub data_api: DataApiConfig,
    pub reasoning: ReasoningConfig,
    pub news: NewsConfig,
    pub broadcast: BroadcastConfig,
    pub conviction: ConvictionConfig,
    pub shadow: ShadowConfig,
    /// Seconds between pipeline ticks in loop mode.
    pub scan_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct DataApiConfig {
    pub base_url: Option<String>,
    /// Minimum spacing between calls to the market data service, in milliseconds.
    pub min_interval_ms: u64,
}

/// Settings for the external reasoning judgment service.
#[derive(Debug, Clone)]
pub struct ReasoningConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub min_interval_ms: u64,
}

impl ReasoningConfig {
    /// Write-mode operations require a key; read-only paths do not.
    pub fn require_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| Error::Config {
            message: "REASONING_API_KEY environment variable not set".to_string(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewsConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Default)]
pub struct BroadcastConfig {
    pub endpoint: Option<String>,
    pub auth_token: Option<String>,
}

/// Thresholds for the conviction scorer.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvictionConfig {
    /// Minimum conviction score (0-100) to accept a pick.
    pub min_score: f64,
    /// Minimum risk/reward ratio to accept a pick.
    pub min_risk_reward: f64,
    /// Maximum opportunities pulled per scoring cycle.
    pub batch_size: u32,
}

impl Default for ConvictionConfig {
    fn default() -> Self {
        Self {
            min_score: 60.0,
            min_risk_reward: 1.5,
            batch_size: 20,
        }
    }
}

impl ConvictionConfig {
    pub fn from_env() -> Self {
        Self {
            min_score: env::var("CONVICTION_MIN_SCORE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60.0),
            min_risk_reward: env::var("CONVICTION_MIN_RISK_REWARD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.5),
            batch_size: env::var("CONVICTION_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
        }
    }
}

/// Settings for trader ranking and copy-signal detection.
#[derive(Debug, Clone)]
pub struct ShadowConfig {
    /// Number of top-ranked traders to monitor for new positions.
    pub max_traders: usize,
    /// Minimum effective position value to emit a copy signal.
    pub min_copy_value: Decimal,
    /// Rows requested from each leaderboard period.
    pub leaderboard_limit: u32,
    /// Known high-value wallets seeded when not already discovered.
    pub seed_whales: Vec<SeedWhale>,
}

/// A seed entry for a known whale wallet.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedWhale {
    pub alias: String,
    pub address: String,
    #[serde(default)]
    pub profit: Decimal,
    #[serde(default)]
    pub specialty: Option<String>,
    #[serde(default)]
    pub min_position_usd: Decimal,
}

impl ShadowConfig {
    pub fn from_env() -> Self {
        let seed_whales = env::var("SEED_WHALES")
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        Self {
            max_traders: env::var("SHADOW_MAX_TRADERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_copy_value: env::var("SHADOW_MIN_COPY_VALUE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Decimal::new(100, 0)), // $100 floor
            leaderboard_limit: env::var("SHADOW_LEADERBOARD_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50),
            seed_whales,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| Error::Config {
                    message: "DATABASE_URL environment variable not set".to_string(),
                })?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            },
            data_api: DataApiConfig {
                base_url: env::var("DATA_API_URL").ok(),
                min_interval_ms: env::var("DATA_API_MIN_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(500),
            },
            reasoning: ReasoningConfig {
                api_key: env::var("REASONING_API_KEY").ok(),
                base_url: env::var("REASONING_API_URL").ok(),
                model: env::var("REASONING_MODEL")
                    .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string()),
                max_tokens: env::var("REASONING_MAX_TOKENS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1024),
                min_interval_ms: env::var("REASONING_MIN_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            },
            news: NewsConfig {
                api_key: env::var("NEWS_API_KEY").ok(),
                base_url: env::var("NEWS_API_URL").ok(),
                model: env::var("NEWS_MODEL").unwrap_or_else(|_| "sonar".to_string()),
                max_tokens: env::var("NEWS_MAX_TOKENS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(400),
            },
            broadcast: BroadcastConfig {
                endpoint: env::var("BROADCAST_ENDPOINT").ok(),
                auth_token: env::var("BROADCAST_AUTH_TOKEN").ok(),
            },
            conviction: ConvictionConfig::from_env(),
            shadow: ShadowConfig::from_env(),
            scan_interval_secs: env::var("SCAN_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        })
    }

    /// Load configuration for testing (with defaults).
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgres://localhost/polypick_test".to_string(),
                max_connections: 2,
            },
            data_api: DataApiConfig {
                base_url: None,
                min_interval_ms: 0,
            },
            reasoning: ReasoningConfig {
                api_key: None,
                base_url: None,
                model: "test-model".to_string(),
                max_tokens: 256,
                min_interval_ms: 0,
            },
            news: NewsConfig::default(),
            broadcast: BroadcastConfig::default(),
            conviction: ConvictionConfig::default(),
            shadow: ShadowConfig {
                max_traders: 10,
                min_copy_value: Decimal::new(100, 0),
                leaderboard_limit: 50,
                seed_whales: Vec::new(),
            },
            scan_interval_secs: 300,
        }
    }
}
