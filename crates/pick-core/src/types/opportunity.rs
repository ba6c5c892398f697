//! Opportunity types: raw detected candidate signals awaiting scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of signal that produced an opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Momentum,
    WhaleEntry,
    Mispricing,
    News,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Momentum => "momentum",
            Self::WhaleEntry => "whale_entry",
            Self::Mispricing => "mispricing",
            Self::News => "news",
        }
    }
}

/// A detected candidate trade, produced by the external opportunity
/// detector and consumed exactly once by the conviction scorer.
///
/// The scorer marks an opportunity processed regardless of outcome
/// (accepted, rejected, or errored); it is never retried automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: Uuid,
    pub market_id: String,
    pub signal_type: SignalType,
    /// Signal strength in [0, 1].
    pub strength: f64,
    /// Detector-specific payload; shape varies by signal type.
    pub signal_data: serde_json::Value,
    pub processed: bool,
    pub detected_at: DateTime<Utc>,
}

impl Opportunity {
    pub fn new(market_id: impl Into<String>, signal_type: SignalType, strength: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            market_id: market_id.into(),
            signal_type,
            strength,
            signal_data: serde_json::Value::Object(Default::default()),
            processed: false,
            detected_at: Utc::now(),
        }
    }

    pub fn with_signal_data(mut self, data: serde_json::Value) -> Self {
        self.signal_data = data;
        self
    }
}
