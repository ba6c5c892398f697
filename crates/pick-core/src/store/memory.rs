//! In-memory store backing tests and credential-free dry runs.

use super::{AuditStore, MarketStore, OpportunityStore, PickStore, TraderStore};
use crate::types::{Market, Opportunity, Pick, PickStatus, Trader, TraderTrade};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::Mutex;
use uuid::Uuid;

/// A single in-memory store implementing every storage trait.
#[derive(Default)]
pub struct MemoryStore {
    opportunities: DashMap<Uuid, Opportunity>,
    picks: DashMap<Uuid, Pick>,
    /// Traders keyed by lowercased wallet address.
    traders: DashMap<String, Trader>,
    trades: Mutex<Vec<TraderTrade>>,
    markets: DashMap<String, Market>,
    audit: Mutex<Vec<(String, serde_json::Value, String)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a market snapshot.
    pub fn put_market(&self, market: Market) {
        self.markets.insert(market.id.clone(), market);
    }

    /// All picks regardless of status, for assertions.
    pub fn all_picks(&self) -> Vec<Pick> {
        self.picks.iter().map(|e| e.value().clone()).collect()
    }

    /// All opportunities regardless of processed flag, for assertions.
    pub fn all_opportunities(&self) -> Vec<Opportunity> {
        self.opportunities
            .iter()
            .map(|e| e.value().clone())
            .collect()
    }

    /// All traders, for assertions.
    pub fn all_traders(&self) -> Vec<Trader> {
        self.traders.iter().map(|e| e.value().clone()).collect()
    }

    /// Recorded audit events, for assertions.
    pub fn audit_events(&self) -> Vec<(String, serde_json::Value, String)> {
        self.audit.lock().unwrap().clone()
    }
}

#[async_trait]
impl OpportunityStore for MemoryStore {
    async fn insert(&self, opportunity: &Opportunity) -> Result<()> {
        self.opportunities
            .insert(opportunity.id, opportunity.clone());
        Ok(())
    }

    async fn get_unprocessed(&self, limit: u32) -> Result<Vec<Opportunity>> {
        let mut unprocessed: Vec<Opportunity> = self
            .opportunities
            .iter()
            .filter(|e| !e.value().processed)
            .map(|e| e.value().clone())
            .collect();
        unprocessed.sort_by_key(|o| o.detected_at);
        unprocessed.truncate(limit as usize);
        Ok(unprocessed)
    }

    async fn mark_processed(&self, id: Uuid) -> Result<()> {
        if let Some(mut entry) = self.opportunities.get_mut(&id) {
            entry.processed = true;
        }
        Ok(())
    }
}

#[async_trait]
impl PickStore for MemoryStore {
    async fn insert(&self, pick: &Pick) -> Result<()> {
        self.picks.insert(pick.id, pick.clone());
        Ok(())
    }

    async fn get_active(&self) -> Result<Vec<Pick>> {
        let mut active: Vec<Pick> = self
            .picks
            .iter()
            .filter(|e| e.value().status == PickStatus::Active)
            .map(|e| e.value().clone())
            .collect();
        active.sort_by_key(|p| p.created_at);
        Ok(active)
    }

    async fn close(&self, id: Uuid, status: PickStatus, exit_price: Decimal) -> Result<()> {
        if let Some(mut entry) = self.picks.get_mut(&id) {
            // Terminal states never revert.
            if entry.status == PickStatus::Active && status.is_terminal() {
                entry.status = status;
                entry.exit_price = Some(exit_price);
                entry.closed_at = Some(Utc::now());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TraderStore for MemoryStore {
    async fn upsert(&self, trader: &Trader) -> Result<()> {
        let key = trader.wallet_address.to_lowercase();
        match self.traders.get(&key).map(|e| e.id) {
            Some(existing_id) => {
                let mut updated = trader.clone();
                updated.id = existing_id;
                updated.wallet_address = key.clone();
                self.traders.insert(key, updated);
            }
            None => {
                let mut inserted = trader.clone();
                inserted.wallet_address = key.clone();
                self.traders.insert(key, inserted);
            }
        }
        Ok(())
    }

    async fn get_top(&self, limit: usize) -> Result<Vec<Trader>> {
        let mut traders: Vec<Trader> = self
            .traders
            .iter()
            .filter(|e| e.value().active)
            .map(|e| e.value().clone())
            .collect();
        traders.sort_by(|a, b| {
            b.composite_rank
                .partial_cmp(&a.composite_rank)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        traders.truncate(limit);
        Ok(traders)
    }

    async fn get_trades(&self, trader_id: Uuid) -> Result<Vec<TraderTrade>> {
        Ok(self
            .trades
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.trader_id == trader_id)
            .cloned()
            .collect())
    }

    async fn insert_trade(&self, trade: &TraderTrade) -> Result<()> {
        self.trades.lock().unwrap().push(trade.clone());
        Ok(())
    }
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn get_by_id(&self, market_id: &str) -> Result<Option<Market>> {
        Ok(self.markets.get(market_id).map(|e| e.value().clone()))
    }
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn append(&self, event: &str, data: serde_json::Value, source: &str) -> Result<()> {
        self.audit
            .lock()
            .unwrap()
            .push((event.to_string(), data, source.to_string()));
        Ok(())
    }
}
