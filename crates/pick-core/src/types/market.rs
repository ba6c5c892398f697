//! Market types. Markets are read-only to this engine: they are ingested
//! and kept current by an external scanner.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A prediction market snapshot as stored by the external scanner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Stable market identifier (slug or condition id).
    pub id: String,
    pub question: String,
    pub category: Option<String>,
    /// Current YES price in (0, 1).
    pub yes_price: Decimal,
    /// Current NO price in (0, 1).
    pub no_price: Decimal,
    pub volume: Decimal,
    pub liquidity: Decimal,
    pub end_date: Option<DateTime<Utc>>,
}

impl Market {
    /// Price on the given side of the book.
    pub fn price_for(&self, direction: crate::types::Direction) -> Decimal {
        match direction {
            crate::types::Direction::Yes => self.yes_price,
            crate::types::Direction::No => self.no_price,
        }
    }
}

/// Resolution state reported by the market data feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketResolution {
    pub resolved: bool,
    /// Winning outcome ("YES" or "NO") when resolved.
    pub outcome: Option<String>,
}

impl MarketResolution {
    pub fn unresolved() -> Self {
        Self {
            resolved: false,
            outcome: None,
        }
    }

    pub fn resolved_as(outcome: &str) -> Self {
        Self {
            resolved: true,
            outcome: Some(outcome.to_string()),
        }
    }
}
