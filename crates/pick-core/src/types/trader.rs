//! Tracked trader types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked market participant, upserted by the trader ranker and keyed
/// on its lowercased wallet address. Traders are never deleted; falling
/// out of the leaderboard only flips `active`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trader {
    pub id: Uuid,
    /// Unique key, always lowercased.
    pub wallet_address: String,
    pub alias: String,
    pub total_pnl: Decimal,
    pub pnl_30d: Decimal,
    pub pnl_7d: Decimal,
    /// Win rate in [0, 1].
    pub win_rate: f64,
    pub trade_count: u64,
    pub avg_position_size: Decimal,
    /// Weighted composite rank in [0, 1].
    pub composite_rank: f64,
    pub active: bool,
    pub market_categories: Vec<String>,
    pub profile_summary: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Trader {
    /// Construct a trader record with a normalized address and no rank yet.
    pub fn new(wallet_address: &str, alias: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            wallet_address: wallet_address.to_lowercase(),
            alias: alias.into(),
            total_pnl: Decimal::ZERO,
            pnl_30d: Decimal::ZERO,
            pnl_7d: Decimal::ZERO,
            win_rate: 0.0,
            trade_count: 0,
            avg_position_size: Decimal::ZERO,
            composite_rank: 0.0,
            active: true,
            market_categories: Vec::new(),
            profile_summary: None,
            updated_at: Utc::now(),
        }
    }

    /// Short display alias for addresses without a username: `0x1234...abcd`.
    pub fn short_alias(address: &str) -> String {
        if address.len() > 10 {
            format!("{}...{}", &address[..6], &address[address.len() - 4..])
        } else {
            address.to_string()
        }
    }
}

/// A recorded observation of a trader's position entry. Append-only: a
/// (market, direction) pair for a given trader is written at most once,
/// making the table a dedup ledger for copy-signal detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraderTrade {
    pub id: Uuid,
    pub trader_id: Uuid,
    pub market_id: String,
    pub direction: super::Direction,
    pub amount: Decimal,
    pub price: Decimal,
    pub trade_type: String,
    pub recorded_at: DateTime<Utc>,
}

impl TraderTrade {
    pub fn entry(
        trader_id: Uuid,
        market_id: impl Into<String>,
        direction: super::Direction,
        amount: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trader_id,
            market_id: market_id.into(),
            direction,
            amount,
            price,
            trade_type: "entry".to_string(),
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_normalized() {
        let trader = Trader::new("0xABCDEF1234", "whale");
        assert_eq!(trader.wallet_address, "0xabcdef1234");
    }

    #[test]
    fn test_short_alias() {
        assert_eq!(
            Trader::short_alias("0x1234567890abcdef"),
            "0x1234...cdef"
        );
        assert_eq!(Trader::short_alias("0xabc"), "0xabc");
    }
}
