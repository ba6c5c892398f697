//! Active-pick resolution pass.

use chrono::{DateTime, Utc};
use pick_core::api::MarketFeed;
use pick_core::store::{MarketStore, PickStore};
use pick_core::types::{Direction, MarketResolution, Pick, PickStatus};
use pick_core::Result;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome counters for one resolution pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionStats {
    /// Active picks examined.
    pub checked: u32,
    /// Closed because the market resolved.
    pub resolved: u32,
    /// Closed by stop-loss.
    pub stopped: u32,
    /// Closed as won with the target reached before resolution.
    pub target_hit: u32,
    /// Closed because the time horizon elapsed.
    pub expired: u32,
}

impl ResolutionStats {
    pub fn total_closed(&self) -> u32 {
        self.resolved + self.stopped + self.target_hit + self.expired
    }
}

/// Checks every active pick against market resolution, stop, target, and
/// expiry, in that order, and closes it on the first rule that fires.
///
/// Each pass is idempotent: closes are guarded on the pick still being
/// active, and a pick that closes in one pass is not active in the next.
pub struct PickResolver {
    picks: Arc<dyn PickStore>,
    markets: Arc<dyn MarketStore>,
    feed: Arc<dyn MarketFeed>,
}

impl PickResolver {
    pub fn new(
        picks: Arc<dyn PickStore>,
        markets: Arc<dyn MarketStore>,
        feed: Arc<dyn MarketFeed>,
    ) -> Self {
        Self {
            picks,
            markets,
            feed,
        }
    }

    /// Run one pass over the active picks. One pick's failure never stops
    /// the pass.
    pub async fn resolve_all(&self) -> Result<ResolutionStats> {
        let active = self.picks.get_active().await?;
        let now = Utc::now();
        let mut stats = ResolutionStats::default();

        for pick in &active {
            stats.checked += 1;
            if let Err(e) = self.resolve_one(pick, now, &mut stats).await {
                warn!(market = %pick.market_id, error = %e, "Pick resolution failed");
            }
        }

        if stats.total_closed() > 0 {
            info!(
                checked = stats.checked,
                resolved = stats.resolved,
                stopped = stats.stopped,
                target_hit = stats.target_hit,
                expired = stats.expired,
                "Resolution pass complete"
            );
        }
        Ok(stats)
    }

    async fn resolve_one(
        &self,
        pick: &Pick,
        now: DateTime<Utc>,
        stats: &mut ResolutionStats,
    ) -> Result<()> {
        // A missing snapshot defers every decision, resolution included.
        let Some(market) = self.markets.get_by_id(&pick.market_id).await? else {
            debug!(market = %pick.market_id, "No market snapshot, deferring");
            return Ok(());
        };
        let current = market.price_for(pick.direction);

        // Market resolution beats every price-based rule.
        match self.feed.resolution(&pick.market_id).await {
            Ok(MarketResolution {
                resolved: true,
                outcome: Some(outcome),
            }) => {
                let won = pick.direction.matches_outcome(&outcome);
                let (status, exit_price) = if won {
                    (PickStatus::Won, Decimal::ONE)
                } else {
                    (PickStatus::Lost, Decimal::ZERO)
                };
                self.picks.close(pick.id, status, exit_price).await?;
                stats.resolved += 1;
                info!(
                    market = %pick.market_id,
                    direction = pick.direction.as_str(),
                    outcome = %outcome,
                    status = status.as_str(),
                    "Pick resolved"
                );
                return Ok(());
            }
            Ok(_) => {}
            Err(e) => {
                // Price rules still apply when the resolution feed is down.
                warn!(market = %pick.market_id, error = %e, "Resolution check failed");
            }
        }

        // Stop and target are quoted against the YES side of the book: a
        // YES pick gauges its own price, a NO pick the complement of its
        // side price.
        let gauge = match pick.direction {
            Direction::Yes => current,
            Direction::No => Decimal::ONE - current,
        };

        if pick.stop_loss > Decimal::ZERO && gauge <= pick.stop_loss {
            self.picks
                .close(pick.id, PickStatus::Stopped, current)
                .await?;
            stats.stopped += 1;
            info!(market = %pick.market_id, price = %current, stop = %pick.stop_loss, "Stop-loss hit");
            return Ok(());
        }

        if gauge >= pick.target_price {
            // Target reached counts as a win even before resolution.
            self.picks.close(pick.id, PickStatus::Won, current).await?;
            stats.target_hit += 1;
            info!(market = %pick.market_id, price = %current, target = %pick.target_price, "Target hit");
            return Ok(());
        }

        if pick.is_expired(now) {
            self.picks
                .close(pick.id, PickStatus::Expired, current)
                .await?;
            stats.expired += 1;
            info!(
                market = %pick.market_id,
                age_hours = pick.age_hours(now),
                horizon = pick.time_horizon.as_str(),
                "Pick expired"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use pick_core::api::{LeaderboardPeriod, LeaderboardRow};
    use pick_core::store::memory::MemoryStore;
    use pick_core::types::{Direction, Market, PositionSize, TimeHorizon, TraderPosition};
    use std::collections::HashMap;
    use uuid::Uuid;

    /// Feed whose resolution answers are scripted per market.
    struct ResolutionFeed {
        resolutions: HashMap<String, MarketResolution>,
    }

    impl ResolutionFeed {
        fn unresolved() -> Self {
            Self {
                resolutions: HashMap::new(),
            }
        }

        fn with(market_id: &str, outcome: &str) -> Self {
            Self {
                resolutions: HashMap::from([(
                    market_id.to_string(),
                    MarketResolution::resolved_as(outcome),
                )]),
            }
        }
    }

    #[async_trait]
    impl MarketFeed for ResolutionFeed {
        async fn leaderboard(
            &self,
            _period: LeaderboardPeriod,
            _limit: u32,
        ) -> Result<Vec<LeaderboardRow>> {
            Ok(Vec::new())
        }

        async fn positions(&self, _wallet: &str) -> Result<Vec<TraderPosition>> {
            Ok(Vec::new())
        }

        async fn resolution(&self, market_id: &str) -> Result<MarketResolution> {
            Ok(self
                .resolutions
                .get(market_id)
                .cloned()
                .unwrap_or_else(MarketResolution::unresolved))
        }
    }

    fn market(id: &str, yes_price: Decimal) -> Market {
        Market {
            id: id.to_string(),
            question: format!("{id}?"),
            category: None,
            yes_price,
            no_price: Decimal::ONE - yes_price,
            volume: Decimal::ZERO,
            liquidity: Decimal::ZERO,
            end_date: None,
        }
    }

    fn pick(market_id: &str, direction: Direction) -> Pick {
        Pick {
            id: Uuid::new_v4(),
            market_id: market_id.to_string(),
            direction,
            conviction_score: 70.0,
            entry_price: Decimal::new(55, 2),
            target_price: Decimal::new(75, 2),
            stop_loss: Decimal::new(30, 2),
            risk_reward: 2.0,
            time_horizon: TimeHorizon::Days,
            status: PickStatus::Active,
            exit_price: None,
            edge_explanation: String::new(),
            summary: String::new(),
            confidence_factors: vec![],
            risk_factors: vec![],
            position_size: PositionSize::Small,
            created_at: Utc::now(),
            closed_at: None,
        }
    }

    fn resolver(store: Arc<MemoryStore>, feed: ResolutionFeed) -> PickResolver {
        PickResolver::new(store.clone(), store, Arc::new(feed))
    }

    async fn insert(store: &MemoryStore, pick: &Pick) {
        PickStore::insert(store, pick).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolution_matching_direction_wins_at_one() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("m1", Decimal::new(60, 2)));
        insert(&store, &pick("m1", Direction::Yes)).await;

        let stats = resolver(store.clone(), ResolutionFeed::with("m1", "YES"))
            .resolve_all()
            .await
            .unwrap();

        assert_eq!(stats.resolved, 1);
        let closed = &store.all_picks()[0];
        assert_eq!(closed.status, PickStatus::Won);
        assert_eq!(closed.exit_price, Some(Decimal::ONE));
        assert!(closed.closed_at.is_some());
    }

    #[tokio::test]
    async fn test_resolution_against_direction_loses_at_zero() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("m1", Decimal::new(60, 2)));
        insert(&store, &pick("m1", Direction::No)).await;

        let stats = resolver(store.clone(), ResolutionFeed::with("m1", "yes"))
            .resolve_all()
            .await
            .unwrap();

        assert_eq!(stats.resolved, 1);
        let closed = &store.all_picks()[0];
        assert_eq!(closed.status, PickStatus::Lost);
        assert_eq!(closed.exit_price, Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn test_stop_loss_boundary_is_inclusive() {
        let store = Arc::new(MemoryStore::new());
        // Price exactly at the 0.30 stop.
        store.put_market(market("at-stop", Decimal::new(30, 2)));
        store.put_market(market("above-stop", Decimal::new(31, 2)));
        insert(&store, &pick("at-stop", Direction::Yes)).await;
        insert(&store, &pick("above-stop", Direction::Yes)).await;

        let stats = resolver(store.clone(), ResolutionFeed::unresolved())
            .resolve_all()
            .await
            .unwrap();

        assert_eq!(stats.stopped, 1);
        let at_stop = store
            .all_picks()
            .into_iter()
            .find(|p| p.market_id == "at-stop")
            .unwrap();
        assert_eq!(at_stop.status, PickStatus::Stopped);
        assert_eq!(at_stop.exit_price, Some(Decimal::new(30, 2)));
        let above = store
            .all_picks()
            .into_iter()
            .find(|p| p.market_id == "above-stop")
            .unwrap();
        assert_eq!(above.status, PickStatus::Active);
    }

    #[tokio::test]
    async fn test_zero_stop_disables_stop_check() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("m1", Decimal::new(5, 2)));
        let mut p = pick("m1", Direction::Yes);
        p.stop_loss = Decimal::ZERO;
        insert(&store, &p).await;

        let stats = resolver(store.clone(), ResolutionFeed::unresolved())
            .resolve_all()
            .await
            .unwrap();

        assert_eq!(stats.stopped, 0);
        assert_eq!(store.all_picks()[0].status, PickStatus::Active);
    }

    #[tokio::test]
    async fn test_target_hit_closes_won_at_market_price() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("m1", Decimal::new(80, 2)));
        insert(&store, &pick("m1", Direction::Yes)).await;

        let stats = resolver(store.clone(), ResolutionFeed::unresolved())
            .resolve_all()
            .await
            .unwrap();

        // Counted as a target hit, not a resolution.
        assert_eq!(stats.target_hit, 1);
        assert_eq!(stats.resolved, 0);
        let closed = &store.all_picks()[0];
        assert_eq!(closed.status, PickStatus::Won);
        assert_eq!(closed.exit_price, Some(Decimal::new(80, 2)));
    }

    #[tokio::test]
    async fn test_no_direction_stop_gauges_yes_side() {
        let store = Arc::new(MemoryStore::new());
        // YES at 0.25: the NO pick's gauge is 1 - 0.75 = 0.25, at or
        // below the 0.30 stop, even though its side price sits at 0.75.
        store.put_market(market("m1", Decimal::new(25, 2)));
        insert(&store, &pick("m1", Direction::No)).await;

        let stats = resolver(store.clone(), ResolutionFeed::unresolved())
            .resolve_all()
            .await
            .unwrap();

        assert_eq!(stats.stopped, 1);
        assert_eq!(stats.target_hit, 0);
        let closed = &store.all_picks()[0];
        assert_eq!(closed.status, PickStatus::Stopped);
        // Exit is the pick's side price, not the gauge.
        assert_eq!(closed.exit_price, Some(Decimal::new(75, 2)));
    }

    #[tokio::test]
    async fn test_no_direction_target_gauges_yes_side() {
        let store = Arc::new(MemoryStore::new());
        // YES at 0.80: gauge 0.80 reaches the 0.75 target.
        store.put_market(market("m1", Decimal::new(80, 2)));
        insert(&store, &pick("m1", Direction::No)).await;

        let stats = resolver(store.clone(), ResolutionFeed::unresolved())
            .resolve_all()
            .await
            .unwrap();

        assert_eq!(stats.target_hit, 1);
        let closed = &store.all_picks()[0];
        assert_eq!(closed.status, PickStatus::Won);
        assert_eq!(closed.exit_price, Some(Decimal::new(20, 2)));
    }

    #[tokio::test]
    async fn test_hours_horizon_expires_after_twelve() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("m1", Decimal::new(50, 2)));
        let mut p = pick("m1", Direction::Yes);
        p.time_horizon = TimeHorizon::Hours;
        p.created_at = Utc::now() - Duration::hours(13);
        insert(&store, &p).await;

        let stats = resolver(store.clone(), ResolutionFeed::unresolved())
            .resolve_all()
            .await
            .unwrap();

        assert_eq!(stats.expired, 1);
        let closed = &store.all_picks()[0];
        assert_eq!(closed.status, PickStatus::Expired);
        assert_eq!(closed.exit_price, Some(Decimal::new(50, 2)));
    }

    #[tokio::test]
    async fn test_missing_snapshot_defers_pick() {
        let store = Arc::new(MemoryStore::new());
        insert(&store, &pick("no-snapshot", Direction::Yes)).await;

        let stats = resolver(store.clone(), ResolutionFeed::unresolved())
            .resolve_all()
            .await
            .unwrap();

        assert_eq!(stats.checked, 1);
        assert_eq!(stats.total_closed(), 0);
        assert_eq!(store.all_picks()[0].status, PickStatus::Active);
    }

    #[tokio::test]
    async fn test_missing_snapshot_defers_even_when_resolved() {
        let store = Arc::new(MemoryStore::new());
        insert(&store, &pick("no-snapshot", Direction::Yes)).await;

        // The feed reports the market resolved, but without a snapshot
        // the pick is left for a later pass.
        let stats = resolver(store.clone(), ResolutionFeed::with("no-snapshot", "YES"))
            .resolve_all()
            .await
            .unwrap();

        assert_eq!(stats.resolved, 0);
        assert_eq!(store.all_picks()[0].status, PickStatus::Active);
    }

    #[tokio::test]
    async fn test_second_pass_is_a_no_op() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("m1", Decimal::new(80, 2)));
        insert(&store, &pick("m1", Direction::Yes)).await;

        let resolver = resolver(store.clone(), ResolutionFeed::unresolved());
        let first = resolver.resolve_all().await.unwrap();
        assert_eq!(first.total_closed(), 1);

        let second = resolver.resolve_all().await.unwrap();
        assert_eq!(second.checked, 0);
        assert_eq!(second.total_closed(), 0);
    }
}
