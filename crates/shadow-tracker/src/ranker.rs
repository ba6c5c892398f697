//! Trader ranking: merges leaderboard sources into a deduplicated set and
//! computes a weighted composite rank.

use pick_core::api::{LeaderboardPeriod, LeaderboardRow, MarketFeed};
use pick_core::config::{SeedWhale, ShadowConfig};
use pick_core::store::{AuditStore, TraderStore};
use pick_core::types::Trader;
use pick_core::Result;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Composite rank weights. Must sum to 1.0.
const W_PNL: f64 = 0.40;
const W_WIN_RATE: f64 = 0.25;
const W_TRADES: f64 = 0.20;
const W_RECENCY: f64 = 0.15;

/// Recency score: rewards traders with recent realized profit.
pub fn recency_score(trader: &Trader) -> f64 {
    if trader.pnl_7d > Decimal::ZERO {
        1.0
    } else if trader.pnl_30d > Decimal::ZERO {
        0.7
    } else {
        0.5
    }
}

/// Compute composite ranks in place and sort descending. The sort is
/// stable, so ties keep their encounter order from the merge.
pub fn compute_ranks(traders: &mut Vec<Trader>) {
    if traders.is_empty() {
        return;
    }

    // Denominators floor at 1 so an all-zero set normalizes safely.
    let max_pnl = traders
        .iter()
        .map(|t| t.total_pnl.abs().to_f64().unwrap_or(0.0))
        .fold(0.0, f64::max)
        .max(1.0);
    let max_trades = traders.iter().map(|t| t.trade_count).max().unwrap_or(0).max(1) as f64;

    for trader in traders.iter_mut() {
        let pnl_score = trader.total_pnl.to_f64().unwrap_or(0.0).max(0.0) / max_pnl;
        let win_rate_score = if trader.win_rate > 1.0 {
            trader.win_rate / 100.0
        } else {
            trader.win_rate
        };
        let trade_score = trader.trade_count as f64 / max_trades;
        let recency = recency_score(trader);

        let rank = W_PNL * pnl_score
            + W_WIN_RATE * win_rate_score
            + W_TRADES * trade_score
            + W_RECENCY * recency;
        trader.composite_rank = (rank * 10_000.0).round() / 10_000.0;
    }

    traders.sort_by(|a, b| {
        b.composite_rank
            .partial_cmp(&a.composite_rank)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Merge accumulator keyed by lowercased wallet address, preserving
/// encounter order.
#[derive(Default)]
struct MergeSet {
    traders: Vec<Trader>,
    index: HashMap<String, usize>,
}

impl MergeSet {
    fn contains(&self, address: &str) -> bool {
        self.index.contains_key(&address.to_lowercase())
    }

    fn insert(&mut self, trader: Trader) {
        let key = trader.wallet_address.clone();
        if let Some(&i) = self.index.get(&key) {
            self.traders[i] = trader;
        } else {
            self.index.insert(key, self.traders.len());
            self.traders.push(trader);
        }
    }

    /// Set `pnl_7d` on an already-merged trader. Returns whether the
    /// address was present.
    fn overlay_pnl_7d(&mut self, address: &str, pnl: Decimal) -> bool {
        let key = address.to_lowercase();
        if let Some(&i) = self.index.get(&key) {
            self.traders[i].pnl_7d = pnl;
            true
        } else {
            false
        }
    }

    fn into_traders(self) -> Vec<Trader> {
        self.traders
    }
}

/// Discovers top traders from the leaderboard feed and a static seed list,
/// ranks them, and upserts every trader keyed on wallet address.
pub struct TraderRanker {
    feed: Arc<dyn MarketFeed>,
    traders: Arc<dyn TraderStore>,
    audit: Arc<dyn AuditStore>,
    config: ShadowConfig,
}

impl TraderRanker {
    pub fn new(
        feed: Arc<dyn MarketFeed>,
        traders: Arc<dyn TraderStore>,
        audit: Arc<dyn AuditStore>,
        config: ShadowConfig,
    ) -> Self {
        Self {
            feed,
            traders,
            audit,
            config,
        }
    }

    /// Merge, rank, and upsert. Returns the ranked set in descending
    /// composite-rank order. One trader's failed upsert never aborts the
    /// batch.
    pub async fn rank(&self) -> Result<Vec<Trader>> {
        let mut merged = MergeSet::default();

        // Source 1: all-time leaderboard by PnL.
        let all_time = self.fetch_leaderboard(LeaderboardPeriod::All).await;
        for row in &all_time {
            if let Some(trader) = Self::trader_from_row(row, LeaderboardPeriod::All) {
                merged.insert(trader);
            }
        }

        // Source 2: weekly leaderboard. Overlays pnl_7d onto known
        // traders and inserts newcomers.
        let weekly = self.fetch_leaderboard(LeaderboardPeriod::Week).await;
        for row in &weekly {
            let Some(trader) = Self::trader_from_row(row, LeaderboardPeriod::Week) else {
                continue;
            };
            if !merged.overlay_pnl_7d(&trader.wallet_address, row.pnl) {
                merged.insert(trader);
            }
        }

        // Source 3: seed whales. Seed data never overwrites discovered data.
        let mut seeded = 0;
        for whale in &self.config.seed_whales {
            if !merged.contains(&whale.address) {
                merged.insert(Self::trader_from_seed(whale));
                seeded += 1;
            }
        }

        let mut ranked = merged.into_traders();
        compute_ranks(&mut ranked);

        let mut saved = 0;
        for trader in &ranked {
            match self.traders.upsert(trader).await {
                Ok(()) => saved += 1,
                Err(e) => {
                    warn!(alias = %trader.alias, error = %e, "Failed to upsert trader");
                }
            }
        }

        info!(total = ranked.len(), saved = saved, "Ranked traders");
        if let Err(e) = self
            .audit
            .append(
                "trader_scan",
                serde_json::json!({
                    "total": ranked.len(),
                    "saved": saved,
                    "from_leaderboard": all_time.len(),
                    "from_weekly": weekly.len(),
                    "from_seed": seeded,
                }),
                "trader_ranker",
            )
            .await
        {
            warn!(error = %e, "Failed to append trader_scan audit record");
        }

        Ok(ranked)
    }

    /// A feed failure for one period yields an empty source, not an abort.
    async fn fetch_leaderboard(&self, period: LeaderboardPeriod) -> Vec<LeaderboardRow> {
        match self
            .feed
            .leaderboard(period, self.config.leaderboard_limit)
            .await
        {
            Ok(rows) => {
                info!(period = period.as_str(), count = rows.len(), "Fetched leaderboard");
                rows
            }
            Err(e) => {
                warn!(period = period.as_str(), error = %e, "Leaderboard fetch failed");
                Vec::new()
            }
        }
    }

    fn trader_from_row(row: &LeaderboardRow, period: LeaderboardPeriod) -> Option<Trader> {
        let address = row.wallet_address()?;
        let alias = row
            .user_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| Trader::short_alias(address));

        let mut trader = Trader::new(address, alias);
        trader.total_pnl = row.pnl;
        match period {
            LeaderboardPeriod::Week => trader.pnl_7d = row.pnl,
            LeaderboardPeriod::Month => trader.pnl_30d = row.pnl,
            LeaderboardPeriod::All => {}
        }
        if row.vol > Decimal::ZERO {
            let rank = row.rank.unwrap_or(1).max(1);
            trader.avg_position_size = row.vol / Decimal::from(rank);
        }
        Some(trader)
    }

    fn trader_from_seed(whale: &SeedWhale) -> Trader {
        let mut trader = Trader::new(&whale.address, whale.alias.clone());
        trader.total_pnl = whale.profit;
        trader.avg_position_size = whale.min_position_usd;
        if let Some(specialty) = &whale.specialty {
            trader.market_categories = vec![specialty.clone()];
            trader.profile_summary = Some(format!("Known whale, specialty: {}", specialty));
        }
        trader
    }
}
