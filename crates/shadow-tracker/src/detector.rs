//! Copy-signal detection: watches the positions of top-ranked traders and
//! emits a signal the first time a qualifying (market, direction) entry is
//! seen for a trader.

use chrono::Utc;
use pick_core::api::MarketFeed;
use pick_core::config::ShadowConfig;
use pick_core::store::{MarketStore, TraderStore};
use pick_core::types::{CopySignal, Direction, Trader, TraderTrade};
use pick_core::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Scans tracked traders' current positions for new qualifying entries.
///
/// The trade ledger is the dedup source: a (market, direction) pair for a
/// trader signals at most once, so repeated scans of an unchanged wallet
/// are quiet.
pub struct CopySignalDetector {
    feed: Arc<dyn MarketFeed>,
    traders: Arc<dyn TraderStore>,
    markets: Arc<dyn MarketStore>,
    config: ShadowConfig,
}

impl CopySignalDetector {
    pub fn new(
        feed: Arc<dyn MarketFeed>,
        traders: Arc<dyn TraderStore>,
        markets: Arc<dyn MarketStore>,
        config: ShadowConfig,
    ) -> Self {
        Self {
            feed,
            traders,
            markets,
            config,
        }
    }

    /// Scan the top traders sequentially. A failure scanning one trader
    /// is logged and the scan moves on to the next.
    pub async fn detect_signals(&self) -> Result<Vec<CopySignal>> {
        let top = self.traders.get_top(self.config.max_traders).await?;
        let mut signals = Vec::new();

        for trader in &top {
            match self.scan_trader(trader).await {
                Ok(mut found) => signals.append(&mut found),
                Err(e) => {
                    warn!(alias = %trader.alias, error = %e, "Trader scan failed");
                }
            }
        }

        if !signals.is_empty() {
            info!(count = signals.len(), "Detected copy signals");
        }
        Ok(signals)
    }

    async fn scan_trader(&self, trader: &Trader) -> Result<Vec<CopySignal>> {
        let positions = self.feed.positions(&trader.wallet_address).await?;

        let mut seen: HashSet<(String, Direction)> = self
            .traders
            .get_trades(trader.id)
            .await?
            .into_iter()
            .map(|t| (t.market_id, t.direction))
            .collect();

        let mut signals = Vec::new();
        for position in &positions {
            let Some(market_id) = position.market_key() else {
                debug!(alias = %trader.alias, "Position without market identifier, skipping");
                continue;
            };

            let value = position.effective_value();
            if value < self.config.min_copy_value {
                continue;
            }

            let direction = position.direction();
            let key = (market_id.to_string(), direction);
            if seen.contains(&key) {
                continue;
            }

            let trade = TraderTrade::entry(
                trader.id,
                market_id,
                direction,
                value,
                position.entry_price(),
            );
            // A ledger write failure must not swallow the signal; worst
            // case the same entry signals again next scan.
            if let Err(e) = self.traders.insert_trade(&trade).await {
                warn!(alias = %trader.alias, market = market_id, error = %e, "Failed to record trade");
            }

            let question = match self.markets.get_by_id(market_id).await {
                Ok(Some(market)) => market.question,
                _ => market_id.to_string(),
            };

            info!(
                alias = %trader.alias,
                market = market_id,
                direction = direction.as_str(),
                value = %value,
                "New position from tracked trader"
            );
            signals.push(CopySignal {
                trader_alias: trader.alias.clone(),
                trader_address: trader.wallet_address.clone(),
                trader_pnl: trader.total_pnl,
                trader_rank: trader.composite_rank,
                market_id: market_id.to_string(),
                question,
                direction,
                value,
                price: position.entry_price(),
                detected_at: Utc::now(),
            });
            seen.insert(key);
        }

        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pick_core::api::{LeaderboardPeriod, LeaderboardRow};
    use pick_core::store::memory::MemoryStore;
    use pick_core::types::{Market, MarketResolution, TraderPosition};
    use pick_core::Error;
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    /// Feed serving scripted positions per wallet; unknown wallets error.
    struct PositionsFeed {
        by_wallet: HashMap<String, Vec<TraderPosition>>,
    }

    #[async_trait]
    impl MarketFeed for PositionsFeed {
        async fn leaderboard(
            &self,
            _period: LeaderboardPeriod,
            _limit: u32,
        ) -> Result<Vec<LeaderboardRow>> {
            Ok(Vec::new())
        }

        async fn positions(&self, wallet: &str) -> Result<Vec<TraderPosition>> {
            self.by_wallet.get(wallet).cloned().ok_or(Error::Api {
                message: "positions unavailable".to_string(),
                status: Some(503),
            })
        }

        async fn resolution(&self, _market_id: &str) -> Result<MarketResolution> {
            Ok(MarketResolution::unresolved())
        }
    }

    fn config() -> ShadowConfig {
        ShadowConfig {
            max_traders: 10,
            min_copy_value: Decimal::new(100, 0),
            leaderboard_limit: 50,
            seed_whales: vec![],
        }
    }

    fn position(slug: &str, outcome: &str, current_value: i64) -> TraderPosition {
        TraderPosition {
            slug: Some(slug.to_string()),
            outcome: outcome.to_string(),
            current_value: Decimal::new(current_value, 0),
            avg_price: Some(Decimal::new(50, 2)),
            ..TraderPosition::default()
        }
    }

    async fn tracked_trader(store: &MemoryStore, wallet: &str, rank: f64) -> Trader {
        let mut trader = Trader::new(wallet, format!("t-{wallet}"));
        trader.total_pnl = Decimal::new(10_000, 0);
        trader.composite_rank = rank;
        store.upsert(&trader).await.unwrap();
        store
            .all_traders()
            .into_iter()
            .find(|t| t.wallet_address == wallet)
            .unwrap()
    }

    fn detector(
        feed: PositionsFeed,
        store: Arc<MemoryStore>,
        config: ShadowConfig,
    ) -> CopySignalDetector {
        CopySignalDetector::new(Arc::new(feed), store.clone(), store, config)
    }

    #[tokio::test]
    async fn test_signal_emitted_once_across_scans() {
        let store = Arc::new(MemoryStore::new());
        tracked_trader(&store, "0xaaa", 0.9).await;

        let feed = PositionsFeed {
            by_wallet: HashMap::from([(
                "0xaaa".to_string(),
                vec![position("will-it-rain", "Yes", 500)],
            )]),
        };
        let detector = detector(feed, store.clone(), config());

        let first = detector.detect_signals().await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].market_id, "will-it-rain");
        assert_eq!(first[0].direction, Direction::Yes);
        assert_eq!(first[0].value, Decimal::new(500, 0));

        // Same wallet, same position: the ledger suppresses a repeat.
        let second = detector.detect_signals().await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn test_value_threshold_is_inclusive() {
        let store = Arc::new(MemoryStore::new());
        tracked_trader(&store, "0xaaa", 0.9).await;

        let feed = PositionsFeed {
            by_wallet: HashMap::from([(
                "0xaaa".to_string(),
                vec![
                    position("exactly-at-floor", "Yes", 100),
                    position("below-floor", "Yes", 99),
                ],
            )]),
        };
        let detector = detector(feed, store.clone(), config());

        let signals = detector.detect_signals().await.unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].market_id, "exactly-at-floor");
    }

    #[tokio::test]
    async fn test_question_falls_back_to_market_id() {
        let store = Arc::new(MemoryStore::new());
        tracked_trader(&store, "0xaaa", 0.9).await;
        store.put_market(Market {
            id: "known-market".to_string(),
            question: "Will the known market resolve yes?".to_string(),
            category: None,
            yes_price: Decimal::new(50, 2),
            no_price: Decimal::new(50, 2),
            volume: Decimal::ZERO,
            liquidity: Decimal::ZERO,
            end_date: None,
        });

        let feed = PositionsFeed {
            by_wallet: HashMap::from([(
                "0xaaa".to_string(),
                vec![
                    position("known-market", "Yes", 200),
                    position("unknown-market", "No", 200),
                ],
            )]),
        };
        let detector = detector(feed, store.clone(), config());

        let signals = detector.detect_signals().await.unwrap();
        assert_eq!(signals.len(), 2);
        let known = signals.iter().find(|s| s.market_id == "known-market").unwrap();
        assert_eq!(known.question, "Will the known market resolve yes?");
        let unknown = signals
            .iter()
            .find(|s| s.market_id == "unknown-market")
            .unwrap();
        assert_eq!(unknown.question, "unknown-market");
    }

    #[tokio::test]
    async fn test_positions_without_identifier_skipped() {
        let store = Arc::new(MemoryStore::new());
        tracked_trader(&store, "0xaaa", 0.9).await;

        let nameless = TraderPosition {
            outcome: "Yes".to_string(),
            current_value: Decimal::new(400, 0),
            ..TraderPosition::default()
        };
        let feed = PositionsFeed {
            by_wallet: HashMap::from([("0xaaa".to_string(), vec![nameless])]),
        };
        let detector = detector(feed, store.clone(), config());

        assert!(detector.detect_signals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_trader_does_not_block_others() {
        let store = Arc::new(MemoryStore::new());
        tracked_trader(&store, "0xdead", 0.95).await; // no feed entry: errors
        tracked_trader(&store, "0xaaa", 0.9).await;

        let feed = PositionsFeed {
            by_wallet: HashMap::from([(
                "0xaaa".to_string(),
                vec![position("still-scanned", "No", 300)],
            )]),
        };
        let detector = detector(feed, store.clone(), config());

        let signals = detector.detect_signals().await.unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].market_id, "still-scanned");
        assert_eq!(signals[0].direction, Direction::No);
    }

    #[tokio::test]
    async fn test_opposite_direction_is_a_new_signal() {
        let store = Arc::new(MemoryStore::new());
        let trader = tracked_trader(&store, "0xaaa", 0.9).await;
        // Prior YES entry already in the ledger.
        let prior = TraderTrade::entry(
            trader.id,
            "flip-market",
            Direction::Yes,
            Decimal::new(200, 0),
            Decimal::new(50, 2),
        );
        store.insert_trade(&prior).await.unwrap();

        let feed = PositionsFeed {
            by_wallet: HashMap::from([(
                "0xaaa".to_string(),
                vec![
                    position("flip-market", "Yes", 200),
                    position("flip-market", "No", 250),
                ],
            )]),
        };
        let detector = detector(feed, store.clone(), config());

        let signals = detector.detect_signals().await.unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::No);
    }
}
