//! Pick Engine
//!
//! Prediction market decision pipeline: resolves active picks, scores
//! queued opportunities into new picks, and shadows top traders for copy
//! signals.

mod driver;

use anyhow::Result;
use clap::Parser;
use conviction_engine::ConvictionScorer;
use driver::Driver;
use pick_core::api::{
    data, news, reasoning, ApiBroadcaster, DataApiClient, NewsClient, ReasoningClient,
};
use pick_core::config::Config;
use pick_core::db::{
    self, AuditRepository, MarketRepository, OpportunityRepository, PickRepository,
    TraderRepository,
};
use pick_core::rate_limit::RateLimiter;
use pick_resolver::PickResolver;
use shadow_tracker::{CopySignalDetector, TraderRanker};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pick-engine", version, about = "Prediction market pick engine")]
struct Args {
    /// Run only the pick-resolution phase
    #[arg(long)]
    resolve_only: bool,

    /// Run only conviction scoring
    #[arg(long)]
    score_only: bool,

    /// Run only trader ranking and copy-signal detection
    #[arg(long)]
    shadow_only: bool,

    /// Run a single tick and exit instead of looping. Implied by the
    /// phase-restricting flags above.
    #[arg(long)]
    once: bool,

    /// Seconds between ticks, overriding SCAN_INTERVAL_SECS
    #[arg(long)]
    interval: Option<u64>,
}

impl Args {
    fn any_only(&self) -> bool {
        self.resolve_only || self.score_only || self.shadow_only
    }

    fn phase_enabled(&self, phase_flag: bool) -> bool {
        !self.any_only() || phase_flag
    }

    fn single_shot(&self) -> bool {
        self.once || self.any_only()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pick_engine=info,pick_core=info,shadow_tracker=info,conviction_engine=info,pick_resolver=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Pick Engine");

    let args = Args::parse();
    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let opportunities = Arc::new(OpportunityRepository::new(pool.clone()));
    let picks = Arc::new(PickRepository::new(pool.clone()));
    let traders = Arc::new(TraderRepository::new(pool.clone()));
    let markets = Arc::new(MarketRepository::new(pool.clone()));
    let audit = Arc::new(AuditRepository::new(pool));

    let rate_limiter = RateLimiter::new(Duration::from_millis(500))
        .with_interval(
            data::DATA_API_SERVICE,
            Duration::from_millis(config.data_api.min_interval_ms),
        )
        .with_interval(
            reasoning::REASONING_SERVICE,
            Duration::from_millis(config.reasoning.min_interval_ms),
        )
        .with_interval(news::NEWS_SERVICE, Duration::from_millis(500))
        .shared();
    let feed = Arc::new(DataApiClient::new(
        config.data_api.base_url.clone(),
        rate_limiter.clone(),
    ));
    let broadcast = Arc::new(ApiBroadcaster::from_config(&config.broadcast));

    let resolver = args
        .phase_enabled(args.resolve_only)
        .then(|| PickResolver::new(picks.clone(), markets.clone(), feed.clone()));

    // Scoring needs reasoning credentials; the other phases run without.
    let scorer = if args.phase_enabled(args.score_only) {
        let judge = Arc::new(ReasoningClient::from_config(
            &config.reasoning,
            rate_limiter.clone(),
        )?);
        let news_client = Arc::new(NewsClient::from_config(&config.news, rate_limiter.clone()));
        Some(ConvictionScorer::new(
            opportunities,
            picks,
            markets.clone(),
            audit.clone(),
            judge,
            news_client,
            config.conviction.clone(),
        ))
    } else {
        None
    };

    let (ranker, detector) = if args.phase_enabled(args.shadow_only) {
        (
            Some(TraderRanker::new(
                feed.clone(),
                traders.clone(),
                audit,
                config.shadow.clone(),
            )),
            Some(CopySignalDetector::new(
                feed,
                traders,
                markets.clone(),
                config.shadow.clone(),
            )),
        )
    } else {
        (None, None)
    };

    let driver = Driver::new(resolver, scorer, ranker, detector, broadcast, markets);

    if args.single_shot() {
        driver.tick().await;
        info!("Single tick complete");
        return Ok(());
    }

    let interval = Duration::from_secs(args.interval.unwrap_or(config.scan_interval_secs));
    driver.run(interval).await;
    Ok(())
}
