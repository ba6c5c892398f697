//! Conviction scoring of queued opportunities.

use crate::judgment::Judgment;
use crate::prompt::build_prompt;
use pick_core::api::{Judge, NewsContext};
use pick_core::config::ConvictionConfig;
use pick_core::store::{AuditStore, MarketStore, OpportunityStore, PickStore};
use pick_core::types::{Opportunity, Pick};
use pick_core::Result;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Scores a batch of unprocessed opportunities through the reasoning
/// service and inserts the survivors as active picks.
///
/// Every pulled opportunity is marked processed exactly once, whether it
/// was accepted, rejected, or failed to score; nothing is retried.
pub struct ConvictionScorer {
    opportunities: Arc<dyn OpportunityStore>,
    picks: Arc<dyn PickStore>,
    markets: Arc<dyn MarketStore>,
    audit: Arc<dyn AuditStore>,
    judge: Arc<dyn Judge>,
    news: Arc<dyn NewsContext>,
    config: ConvictionConfig,
}

impl ConvictionScorer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        opportunities: Arc<dyn OpportunityStore>,
        picks: Arc<dyn PickStore>,
        markets: Arc<dyn MarketStore>,
        audit: Arc<dyn AuditStore>,
        judge: Arc<dyn Judge>,
        news: Arc<dyn NewsContext>,
        config: ConvictionConfig,
    ) -> Self {
        Self {
            opportunities,
            picks,
            markets,
            audit,
            judge,
            news,
            config,
        }
    }

    /// Pull one batch, oldest first, and score it sequentially. Returns
    /// the accepted picks.
    pub async fn score_batch(&self) -> Result<Vec<Pick>> {
        let batch = self
            .opportunities
            .get_unprocessed(self.config.batch_size)
            .await?;
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        // Markets that already carry an active pick are skipped outright.
        let mut active_markets: HashSet<String> = self
            .picks
            .get_active()
            .await?
            .into_iter()
            .map(|p| p.market_id)
            .collect();

        let total = batch.len();
        let mut accepted = Vec::new();
        for opportunity in batch {
            let outcome = self.score_one(&opportunity, &mut active_markets).await;

            if let Err(e) = self.opportunities.mark_processed(opportunity.id).await {
                warn!(id = %opportunity.id, error = %e, "Failed to mark opportunity processed");
            }

            match outcome {
                Ok(Some(pick)) => accepted.push(pick),
                Ok(None) => {}
                Err(e) => {
                    warn!(market = %opportunity.market_id, error = %e, "Scoring failed");
                }
            }
        }

        if let Err(e) = self
            .audit
            .append(
                "conviction",
                serde_json::json!({
                    "input": total,
                    "accepted": accepted.len(),
                }),
                "conviction_scorer",
            )
            .await
        {
            warn!(error = %e, "Failed to append conviction audit record");
        }

        info!(scored = total, accepted = accepted.len(), "Conviction batch complete");
        Ok(accepted)
    }

    async fn score_one(
        &self,
        opportunity: &Opportunity,
        active_markets: &mut HashSet<String>,
    ) -> Result<Option<Pick>> {
        if active_markets.contains(&opportunity.market_id) {
            debug!(market = %opportunity.market_id, "Market already has an active pick");
            return Ok(None);
        }

        let Some(market) = self.markets.get_by_id(&opportunity.market_id).await? else {
            warn!(market = %opportunity.market_id, "No snapshot for opportunity market");
            return Ok(None);
        };

        let news_digest = self.news.context(&market.question).await;
        let prompt = build_prompt(&market, opportunity, &news_digest);
        let raw = self.judge.judge(&prompt).await?;
        let judgment = Judgment::parse(&raw)?;

        let accepted = judgment.conviction_score >= self.config.min_score
            && judgment.risk_reward >= self.config.min_risk_reward;

        if !accepted {
            info!(
                market = %opportunity.market_id,
                score = judgment.conviction_score,
                risk_reward = judgment.risk_reward,
                "Opportunity rejected"
            );
            return Ok(None);
        }

        let pick = judgment.into_pick(&opportunity.market_id);
        self.picks.insert(&pick).await?;
        active_markets.insert(opportunity.market_id.clone());
        info!(
            market = %opportunity.market_id,
            direction = pick.direction.as_str(),
            score = pick.conviction_score,
            "Pick accepted"
        );
        Ok(Some(pick))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pick_core::store::memory::MemoryStore;
    use pick_core::types::{Direction, Market, PickStatus, SignalType, TimeHorizon};
    use pick_core::Error;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    struct ScriptedJudge {
        response: String,
        calls: AtomicU32,
        fail: bool,
    }

    impl ScriptedJudge {
        fn returning(response: &str) -> Self {
            Self {
                response: response.to_string(),
                calls: AtomicU32::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                response: String::new(),
                calls: AtomicU32::new(0),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl Judge for ScriptedJudge {
        async fn judge(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::Api {
                    message: "reasoning service unavailable".to_string(),
                    status: Some(503),
                });
            }
            Ok(self.response.clone())
        }
    }

    struct NoNews;

    #[async_trait]
    impl NewsContext for NoNews {
        async fn context(&self, _question: &str) -> String {
            String::new()
        }
    }

    fn judgment_json(score: f64, risk_reward: f64) -> String {
        format!(
            r#"```json
            {{
                "direction": "YES",
                "conviction_score": {score},
                "entry_price": 0.55,
                "target_price": 0.75,
                "stop_loss": 0.40,
                "risk_reward": {risk_reward},
                "time_horizon": "days",
                "edge_explanation": "underpriced",
                "summary": "YES at 0.55",
                "confidence_factors": ["trend"],
                "risk_factors": ["headline"],
                "position_size_suggestion": "medium"
            }}
            ```"#
        )
    }

    fn market(id: &str) -> Market {
        Market {
            id: id.to_string(),
            question: format!("Will {id} resolve yes?"),
            category: Some("politics".to_string()),
            yes_price: Decimal::new(55, 2),
            no_price: Decimal::new(45, 2),
            volume: Decimal::new(50_000, 0),
            liquidity: Decimal::new(10_000, 0),
            end_date: None,
        }
    }

    fn scorer(store: Arc<MemoryStore>, judge: Arc<ScriptedJudge>) -> ConvictionScorer {
        ConvictionScorer::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            judge,
            Arc::new(NoNews),
            ConvictionConfig::default(),
        )
    }

    async fn queue_opportunity(store: &MemoryStore, market_id: &str, strength: f64) -> Uuid {
        let opp = Opportunity::new(market_id, SignalType::Momentum, strength);
        let id = opp.id;
        OpportunityStore::insert(store, &opp).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_qualifying_opportunity_becomes_active_pick() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("will-x-happen"));
        queue_opportunity(&store, "will-x-happen", 0.8).await;

        let judge = Arc::new(ScriptedJudge::returning(&judgment_json(72.0, 2.1)));
        let picks = scorer(store.clone(), judge).score_batch().await.unwrap();

        assert_eq!(picks.len(), 1);
        let pick = &picks[0];
        assert_eq!(pick.status, PickStatus::Active);
        assert_eq!(pick.direction, Direction::Yes);
        assert_eq!(pick.conviction_score, 72.0);
        assert_eq!(pick.time_horizon, TimeHorizon::Days);

        // The queue drained and the audit trail recorded the batch counts.
        assert!(store.get_unprocessed(10).await.unwrap().is_empty());
        let events = store.audit_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "conviction");
        assert_eq!(events[0].1["input"], serde_json::json!(1));
        assert_eq!(events[0].1["accepted"], serde_json::json!(1));
    }

    #[tokio::test]
    async fn test_low_score_rejected_but_consumed() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("weak-edge"));
        queue_opportunity(&store, "weak-edge", 0.5).await;

        let judge = Arc::new(ScriptedJudge::returning(&judgment_json(55.0, 2.0)));
        let picks = scorer(store.clone(), judge).score_batch().await.unwrap();

        assert!(picks.is_empty());
        assert!(store.all_picks().is_empty());
        assert!(store.get_unprocessed(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_poor_risk_reward_rejected() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("thin-edge"));
        queue_opportunity(&store, "thin-edge", 0.7).await;

        // Score clears the bar but risk/reward does not.
        let judge = Arc::new(ScriptedJudge::returning(&judgment_json(80.0, 1.2)));
        let picks = scorer(store.clone(), judge).score_batch().await.unwrap();

        assert!(picks.is_empty());
        assert!(store.get_unprocessed(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_active_market_skipped_without_judging() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("already-picked"));
        queue_opportunity(&store, "already-picked", 0.9).await;

        // Pre-existing active pick on the same market.
        let judge = Arc::new(ScriptedJudge::returning(&judgment_json(90.0, 3.0)));
        let existing = Judgment::parse(&judgment_json(70.0, 2.0))
            .unwrap()
            .into_pick("already-picked");
        PickStore::insert(store.as_ref(), &existing).await.unwrap();

        let picks = scorer(store.clone(), judge.clone()).score_batch().await.unwrap();

        assert!(picks.is_empty());
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
        assert!(store.get_unprocessed(10).await.unwrap().is_empty());
        assert_eq!(store.all_picks().len(), 1);
    }

    #[tokio::test]
    async fn test_judge_failure_consumes_and_continues() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("flaky"));
        queue_opportunity(&store, "flaky", 0.8).await;

        let judge = Arc::new(ScriptedJudge::failing());
        let picks = scorer(store.clone(), judge).score_batch().await.unwrap();

        assert!(picks.is_empty());
        // Not retried on the next batch.
        assert!(store.get_unprocessed(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_market_snapshot_skipped() {
        let store = Arc::new(MemoryStore::new());
        queue_opportunity(&store, "vanished-market", 0.8).await;

        let judge = Arc::new(ScriptedJudge::returning(&judgment_json(90.0, 3.0)));
        let picks = scorer(store.clone(), judge.clone()).score_batch().await.unwrap();

        assert!(picks.is_empty());
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
        assert!(store.get_unprocessed(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_one_pick_per_market_within_batch() {
        let store = Arc::new(MemoryStore::new());
        store.put_market(market("hot-market"));
        queue_opportunity(&store, "hot-market", 0.8).await;
        queue_opportunity(&store, "hot-market", 0.9).await;

        let judge = Arc::new(ScriptedJudge::returning(&judgment_json(75.0, 2.0)));
        let picks = scorer(store.clone(), judge.clone()).score_batch().await.unwrap();

        // The second opportunity for the same market is skipped in-batch.
        assert_eq!(picks.len(), 1);
        assert_eq!(judge.calls.load(Ordering::SeqCst), 1);
        assert!(store.get_unprocessed(10).await.unwrap().is_empty());
    }
}
