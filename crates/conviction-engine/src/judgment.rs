//! Parsing and validation of reasoning-service judgments.

use chrono::Utc;
use pick_core::types::{Direction, Pick, PickStatus, PositionSize, TimeHorizon};
use pick_core::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Structured verdict returned by the reasoning service for one
/// opportunity. Field names match the JSON schema demanded by the prompt.
#[derive(Debug, Clone, Deserialize)]
pub struct Judgment {
    pub direction: Direction,
    pub conviction_score: f64,
    pub entry_price: Decimal,
    pub target_price: Decimal,
    #[serde(default)]
    pub stop_loss: Decimal,
    pub risk_reward: f64,
    #[serde(default = "default_horizon")]
    pub time_horizon: TimeHorizon,
    pub edge_explanation: String,
    pub summary: String,
    #[serde(default)]
    pub confidence_factors: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub position_size_suggestion: PositionSize,
}

fn default_horizon() -> TimeHorizon {
    TimeHorizon::Days
}

impl Judgment {
    /// Parse raw judgment text. The service frequently wraps its JSON in
    /// markdown code fences despite instructions not to; strip them first.
    pub fn parse(raw: &str) -> Result<Self> {
        let body = strip_fences(raw);
        let judgment: Judgment = serde_json::from_str(body)
            .map_err(|e| Error::Judgment(format!("Malformed judgment: {e}")))?;
        judgment.validate()?;
        Ok(judgment)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.conviction_score) {
            return Err(Error::Judgment(format!(
                "Conviction score out of range: {}",
                self.conviction_score
            )));
        }
        if self.entry_price <= Decimal::ZERO || self.entry_price >= Decimal::ONE {
            return Err(Error::Judgment(format!(
                "Entry price out of range: {}",
                self.entry_price
            )));
        }
        if self.target_price <= Decimal::ZERO || self.target_price >= Decimal::ONE {
            return Err(Error::Judgment(format!(
                "Target price out of range: {}",
                self.target_price
            )));
        }
        if self.risk_reward < 0.0 {
            return Err(Error::Judgment(format!(
                "Negative risk/reward: {}",
                self.risk_reward
            )));
        }
        Ok(())
    }

    /// Materialize an accepted judgment as an active pick.
    pub fn into_pick(self, market_id: &str) -> Pick {
        Pick {
            id: Uuid::new_v4(),
            market_id: market_id.to_string(),
            direction: self.direction,
            conviction_score: self.conviction_score,
            entry_price: self.entry_price,
            target_price: self.target_price,
            stop_loss: self.stop_loss,
            risk_reward: self.risk_reward,
            time_horizon: self.time_horizon,
            status: PickStatus::Active,
            exit_price: None,
            edge_explanation: self.edge_explanation,
            summary: self.summary,
            confidence_factors: self.confidence_factors,
            risk_factors: self.risk_factors,
            position_size: self.position_size_suggestion,
            created_at: Utc::now(),
            closed_at: None,
        }
    }
}

fn strip_fences(raw: &str) -> &str {
    let body = raw.trim();
    let body = body
        .strip_prefix("```json")
        .or_else(|| body.strip_prefix("```"))
        .unwrap_or(body);
    let body = body.strip_suffix("```").unwrap_or(body);
    body.trim()
}
