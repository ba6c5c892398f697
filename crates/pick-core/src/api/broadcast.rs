//! Outbound broadcast channel for picks and copy signals.
//!
//! Write-only from the engine's perspective: delivery failures are logged
//! and never retried inline.

use crate::config::BroadcastConfig;
use crate::types::{CopySignal, Pick};
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};

#[async_trait]
pub trait Broadcast: Send + Sync {
    /// Send a rendered pick. Returns whether delivery succeeded.
    async fn send_pick(&self, pick: &Pick, question: &str) -> Result<bool>;

    /// Send a rendered copy signal. Returns whether delivery succeeded.
    async fn send_signal(&self, signal: &CopySignal) -> Result<bool>;
}

/// Rendered broadcast payload shared by picks and copy signals.
#[derive(Debug, Serialize)]
pub struct BroadcastPayload {
    pub question: String,
    pub side: String,
    pub price: String,
    pub confidence: String,
    pub reasoning: String,
    pub created_at: String,
}

impl BroadcastPayload {
    pub fn from_pick(pick: &Pick, question: &str) -> Self {
        let confidence = if pick.conviction_score >= 80.0 {
            "High"
        } else if pick.conviction_score >= 65.0 {
            "Medium"
        } else {
            "Low"
        };

        Self {
            question: question.to_string(),
            side: pick.direction.as_str().to_string(),
            price: pick.entry_price.to_string(),
            confidence: confidence.to_string(),
            reasoning: if pick.summary.is_empty() {
                pick.edge_explanation.clone()
            } else {
                pick.summary.clone()
            },
            created_at: pick.created_at.to_rfc3339(),
        }
    }

    pub fn from_signal(signal: &CopySignal) -> Self {
        Self {
            question: format!("{} copied: {}", signal.trader_alias, signal.question),
            side: signal.direction.as_str().to_string(),
            price: signal.price.to_string(),
            confidence: "Medium".to_string(),
            reasoning: format!(
                "Top trader {} (PnL: ${}) entered {} position worth ${}. Trader rank: {:.2}/1.0.",
                signal.trader_alias,
                signal.trader_pnl.round(),
                signal.direction.as_str(),
                signal.value.round(),
                signal.trader_rank,
            ),
            created_at: signal.detected_at.to_rfc3339(),
        }
    }
}

/// HTTP broadcaster posting rendered payloads to a configured endpoint.
/// Without an endpoint it logs and drops payloads (dry-run mode).
pub struct ApiBroadcaster {
    endpoint: Option<String>,
    auth_token: Option<String>,
    http_client: reqwest::Client,
}

impl ApiBroadcaster {
    pub fn from_config(config: &BroadcastConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            endpoint: config.endpoint.clone(),
            auth_token: config.auth_token.clone(),
            http_client,
        }
    }

    async fn post(&self, payload: &BroadcastPayload) -> bool {
        let Some(endpoint) = &self.endpoint else {
            debug!(question = %payload.question, "No broadcast endpoint configured, dropping payload");
            return false;
        };

        let mut request = self.http_client.post(endpoint).json(payload);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                info!(question = %payload.question, "Broadcast delivered");
                true
            }
            Ok(response) => {
                warn!(status = %response.status(), "Broadcast rejected");
                false
            }
            Err(e) => {
                warn!(error = %e, "Broadcast delivery failed");
                false
            }
        }
    }
}

#[async_trait]
impl Broadcast for ApiBroadcaster {
    async fn send_pick(&self, pick: &Pick, question: &str) -> Result<bool> {
        Ok(self.post(&BroadcastPayload::from_pick(pick, question)).await)
    }

    async fn send_signal(&self, signal: &CopySignal) -> Result<bool> {
        Ok(self.post(&BroadcastPayload::from_signal(signal)).await)
    }
}
