//! Database operations for tracked traders and their trade ledger.

use crate::store::TraderStore;
use crate::types::{Direction, Trader, TraderTrade};
use crate::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Repository for tracked trader data.
pub struct TraderRepository {
    pool: PgPool,
}

impl TraderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_trader(r: &sqlx::postgres::PgRow) -> Trader {
        let market_categories = r
            .get::<Option<String>, _>("market_categories")
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        Trader {
            id: r.get("id"),
            wallet_address: r.get("wallet_address"),
            alias: r.get("alias"),
            total_pnl: r.get("total_pnl"),
            pnl_30d: r.get("pnl_30d"),
            pnl_7d: r.get("pnl_7d"),
            win_rate: r.get("win_rate"),
            trade_count: r.get::<i64, _>("trade_count") as u64,
            avg_position_size: r.get("avg_position_size"),
            composite_rank: r.get("composite_rank"),
            active: r.get("active"),
            market_categories,
            profile_summary: r.get("profile_summary"),
            updated_at: r.get("updated_at"),
        }
    }

    fn row_to_trade(r: &sqlx::postgres::PgRow) -> TraderTrade {
        let direction = if r.get::<&str, _>("direction") == "YES" {
            Direction::Yes
        } else {
            Direction::No
        };

        TraderTrade {
            id: r.get("id"),
            trader_id: r.get("trader_id"),
            market_id: r.get("market_id"),
            direction,
            amount: r.get("amount"),
            price: r.get("price"),
            trade_type: r.get("trade_type"),
            recorded_at: r.get("recorded_at"),
        }
    }
}

#[async_trait]
impl TraderStore for TraderRepository {
    async fn upsert(&self, trader: &Trader) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO traders (
                id, wallet_address, alias, total_pnl, pnl_30d, pnl_7d,
                win_rate, trade_count, avg_position_size, composite_rank,
                active, market_categories, profile_summary, updated_at
            )
            VALUES ($1, LOWER($2), $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (wallet_address) DO UPDATE SET
                alias = EXCLUDED.alias,
                total_pnl = EXCLUDED.total_pnl,
                pnl_30d = EXCLUDED.pnl_30d,
                pnl_7d = EXCLUDED.pnl_7d,
                win_rate = EXCLUDED.win_rate,
                trade_count = EXCLUDED.trade_count,
                avg_position_size = EXCLUDED.avg_position_size,
                composite_rank = EXCLUDED.composite_rank,
                active = EXCLUDED.active,
                market_categories = EXCLUDED.market_categories,
                profile_summary = EXCLUDED.profile_summary,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(trader.id)
        .bind(&trader.wallet_address)
        .bind(&trader.alias)
        .bind(trader.total_pnl)
        .bind(trader.pnl_30d)
        .bind(trader.pnl_7d)
        .bind(trader.win_rate)
        .bind(trader.trade_count as i64)
        .bind(trader.avg_position_size)
        .bind(trader.composite_rank)
        .bind(trader.active)
        .bind(serde_json::to_string(&trader.market_categories)?)
        .bind(&trader.profile_summary)
        .bind(trader.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_top(&self, limit: usize) -> Result<Vec<Trader>> {
        let rows = sqlx::query(
            r#"
            SELECT
                id, wallet_address, alias, total_pnl, pnl_30d, pnl_7d,
                win_rate, trade_count, avg_position_size, composite_rank,
                active, market_categories, profile_summary, updated_at
            FROM traders
            WHERE active = TRUE
            ORDER BY composite_rank DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_trader).collect())
    }

    async fn get_trades(&self, trader_id: Uuid) -> Result<Vec<TraderTrade>> {
        let rows = sqlx::query(
            r#"
            SELECT id, trader_id, market_id, direction, amount, price, trade_type, recorded_at
            FROM trader_trades
            WHERE trader_id = $1
            "#,
        )
        .bind(trader_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_trade).collect())
    }

    async fn insert_trade(&self, trade: &TraderTrade) -> Result<()> {
        // The ledger is append-once per (trader, market, direction); a
        // re-observation of the same pair is a no-op.
        sqlx::query(
            r#"
            INSERT INTO trader_trades (id, trader_id, market_id, direction, amount, price, trade_type, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (trader_id, market_id, direction) DO NOTHING
            "#,
        )
        .bind(trade.id)
        .bind(trade.trader_id)
        .bind(&trade.market_id)
        .bind(trade.direction.as_str())
        .bind(trade.amount)
        .bind(trade.price)
        .bind(&trade.trade_type)
        .bind(trade.recorded_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
