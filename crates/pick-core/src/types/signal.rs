//! Copy-signal types and the loosely-shaped position payloads reported by
//! upstream position feeds.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Direction;

/// A position as reported by the market data feed for one wallet.
///
/// Upstream feeds are inconsistent about which fields are populated, so
/// the identifying and value fields are all optional and resolved through
/// `market_key()` / `effective_value()` in a fixed fallback order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TraderPosition {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default, rename = "eventSlug")]
    pub event_slug: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    /// Outcome label, e.g. "Yes" / "No".
    #[serde(default)]
    pub outcome: String,
    #[serde(default, rename = "currentValue")]
    pub current_value: Decimal,
    #[serde(default)]
    pub size: Decimal,
    #[serde(default, rename = "avgPrice")]
    pub avg_price: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
}

impl TraderPosition {
    /// Market identifier resolution order: slug, then event slug, then
    /// raw market field. `None` if the feed provided no identifier.
    pub fn market_key(&self) -> Option<&str> {
        self.slug
            .as_deref()
            .or(self.event_slug.as_deref())
            .or(self.market.as_deref())
            .filter(|s| !s.is_empty())
    }

    /// Direction implied by the outcome label. Anything other than "Yes"
    /// is treated as NO, matching the upstream feed's binary labels.
    pub fn direction(&self) -> Direction {
        if self.outcome.eq_ignore_ascii_case("yes") {
            Direction::Yes
        } else {
            Direction::No
        }
    }

    /// Entry price resolution order: avgPrice, then price, then zero.
    pub fn entry_price(&self) -> Decimal {
        self.avg_price.or(self.price).unwrap_or(Decimal::ZERO)
    }

    /// Effective position value. Fallback order is fixed and must be
    /// preserved: currentValue if positive, else size * price if the
    /// price is positive, else raw size.
    pub fn effective_value(&self) -> Decimal {
        if self.current_value > Decimal::ZERO {
            return self.current_value;
        }
        let price = self.entry_price();
        if price > Decimal::ZERO {
            self.size * price
        } else {
            self.size
        }
    }
}

/// A notification that a tracked trader entered a new qualifying position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopySignal {
    pub trader_alias: String,
    pub trader_address: String,
    pub trader_pnl: Decimal,
    /// The trader's composite rank at detection time.
    pub trader_rank: f64,
    pub market_id: String,
    pub question: String,
    pub direction: Direction,
    /// Effective value of the detected position.
    pub value: Decimal,
    pub price: Decimal,
    pub detected_at: DateTime<Utc>,
}
