//! Storage traits consumed by the pipeline components.
//!
//! All writes are keyed by a stable identifier (wallet address for
//! traders, market id for markets, uuid for picks/opportunities), so
//! re-running any step is safe. Postgres implementations live in
//! [`crate::db`]; [`memory::MemoryStore`] backs tests and dry-run mode.

pub mod memory;

use crate::types::{Market, Opportunity, Pick, PickStatus, Trader, TraderTrade};
use crate::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

/// Queue of unscored opportunities.
#[async_trait]
pub trait OpportunityStore: Send + Sync {
    async fn insert(&self, opportunity: &Opportunity) -> Result<()>;

    /// Fetch up to `limit` unprocessed opportunities, oldest first.
    async fn get_unprocessed(&self, limit: u32) -> Result<Vec<Opportunity>>;

    /// Mark an opportunity consumed. Idempotent.
    async fn mark_processed(&self, id: Uuid) -> Result<()>;
}

/// Pick persistence. Status may only move from `Active` to a terminal
/// state; implementations must not revert a terminal pick.
#[async_trait]
pub trait PickStore: Send + Sync {
    async fn insert(&self, pick: &Pick) -> Result<()>;

    async fn get_active(&self) -> Result<Vec<Pick>>;

    /// Close an active pick with a terminal status and exit price.
    /// A no-op when the pick is already terminal.
    async fn close(&self, id: Uuid, status: PickStatus, exit_price: Decimal) -> Result<()>;
}

/// Tracked trader persistence plus the append-only trade ledger.
#[async_trait]
pub trait TraderStore: Send + Sync {
    /// Insert or update a trader keyed on its lowercased wallet address.
    async fn upsert(&self, trader: &Trader) -> Result<()>;

    /// Top traders by composite rank, descending.
    async fn get_top(&self, limit: usize) -> Result<Vec<Trader>>;

    /// The recorded trade ledger for one trader.
    async fn get_trades(&self, trader_id: Uuid) -> Result<Vec<TraderTrade>>;

    /// Append a trade observation to the ledger.
    async fn insert_trade(&self, trade: &TraderTrade) -> Result<()>;
}

/// Read access to market snapshots maintained by the external scanner.
#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn get_by_id(&self, market_id: &str) -> Result<Option<Market>>;
}

/// Append-only audit trail of pipeline runs.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn append(&self, event: &str, data: serde_json::Value, source: &str) -> Result<()>;
}
