//! Pipeline driver: runs the enabled phases in a fixed order each tick.
//!
//! Order matters: resolution first so a market never carries both a
//! just-closed and a freshly-scored pick in the same tick, then conviction
//! scoring, then the shadow phase (ranking and copy-signal detection).
//! A phase failure is logged and the tick moves on; a tick never aborts
//! the loop.

use conviction_engine::ConvictionScorer;
use pick_core::api::Broadcast;
use pick_core::store::MarketStore;
use pick_resolver::PickResolver;
use shadow_tracker::{CopySignalDetector, TraderRanker};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

pub struct Driver {
    resolver: Option<PickResolver>,
    scorer: Option<ConvictionScorer>,
    ranker: Option<TraderRanker>,
    detector: Option<CopySignalDetector>,
    broadcast: Arc<dyn Broadcast>,
    markets: Arc<dyn MarketStore>,
}

impl Driver {
    pub fn new(
        resolver: Option<PickResolver>,
        scorer: Option<ConvictionScorer>,
        ranker: Option<TraderRanker>,
        detector: Option<CopySignalDetector>,
        broadcast: Arc<dyn Broadcast>,
        markets: Arc<dyn MarketStore>,
    ) -> Self {
        Self {
            resolver,
            scorer,
            ranker,
            detector,
            broadcast,
            markets,
        }
    }

    /// Run one full tick of the enabled phases.
    pub async fn tick(&self) {
        if let Some(resolver) = &self.resolver {
            match resolver.resolve_all().await {
                Ok(stats) if stats.total_closed() > 0 => {
                    info!(closed = stats.total_closed(), "Resolution phase closed picks");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Resolution phase failed"),
            }
        }

        if let Some(scorer) = &self.scorer {
            match scorer.score_batch().await {
                Ok(picks) => {
                    for pick in &picks {
                        let question = match self.markets.get_by_id(&pick.market_id).await {
                            Ok(Some(market)) => market.question,
                            _ => pick.market_id.clone(),
                        };
                        if let Err(e) = self.broadcast.send_pick(pick, &question).await {
                            warn!(market = %pick.market_id, error = %e, "Pick broadcast failed");
                        }
                    }
                }
                Err(e) => error!(error = %e, "Scoring phase failed"),
            }
        }

        if let Some(ranker) = &self.ranker {
            if let Err(e) = ranker.rank().await {
                error!(error = %e, "Trader ranking failed");
            }
        }

        if let Some(detector) = &self.detector {
            match detector.detect_signals().await {
                Ok(signals) => {
                    for signal in &signals {
                        if let Err(e) = self.broadcast.send_signal(signal).await {
                            warn!(market = %signal.market_id, error = %e, "Signal broadcast failed");
                        }
                    }
                }
                Err(e) => error!(error = %e, "Copy-signal detection failed"),
            }
        }
    }

    /// Tick forever with a fixed sleep between ticks.
    pub async fn run(&self, interval: Duration) {
        info!(interval_secs = interval.as_secs(), "Engine loop started");
        loop {
            self.tick().await;
            tokio::time::sleep(interval).await;
        }
    }
}
