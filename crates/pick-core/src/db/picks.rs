//! Database operations for picks.

use crate::store::PickStore;
use crate::types::{Direction, Pick, PickStatus, PositionSize, TimeHorizon};
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Repository for pick data.
pub struct PickRepository {
    pool: PgPool,
}

impl PickRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_pick(r: &sqlx::postgres::PgRow) -> Pick {
        let direction = if r.get::<&str, _>("direction") == "YES" {
            Direction::Yes
        } else {
            Direction::No
        };
        let position_size = match r.get::<&str, _>("position_size") {
            "large" => PositionSize::Large,
            "medium" => PositionSize::Medium,
            _ => PositionSize::Small,
        };
        let factors = |col: &str| -> Vec<String> {
            r.get::<Option<String>, _>(col)
                .and_then(|s| serde_json::from_str(&s).ok())
                .unwrap_or_default()
        };

        Pick {
            id: r.get("id"),
            market_id: r.get("market_id"),
            direction,
            conviction_score: r.get("conviction_score"),
            entry_price: r.get("entry_price"),
            target_price: r.get("target_price"),
            stop_loss: r.get("stop_loss"),
            risk_reward: r.get("risk_reward"),
            time_horizon: TimeHorizon::parse_lenient(r.get("time_horizon")),
            status: PickStatus::from_str_or_active(r.get("status")),
            exit_price: r.get("exit_price"),
            edge_explanation: r.get::<Option<String>, _>("edge_explanation").unwrap_or_default(),
            summary: r.get::<Option<String>, _>("summary").unwrap_or_default(),
            confidence_factors: factors("confidence_factors"),
            risk_factors: factors("risk_factors"),
            position_size,
            created_at: r.get("created_at"),
            closed_at: r.get("closed_at"),
        }
    }
}

#[async_trait]
impl PickStore for PickRepository {
    async fn insert(&self, pick: &Pick) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO picks (
                id, market_id, direction, conviction_score, entry_price,
                target_price, stop_loss, risk_reward, time_horizon, status,
                exit_price, edge_explanation, summary, confidence_factors,
                risk_factors, position_size, created_at, closed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(pick.id)
        .bind(&pick.market_id)
        .bind(pick.direction.as_str())
        .bind(pick.conviction_score)
        .bind(pick.entry_price)
        .bind(pick.target_price)
        .bind(pick.stop_loss)
        .bind(pick.risk_reward)
        .bind(pick.time_horizon.as_str())
        .bind(pick.status.as_str())
        .bind(pick.exit_price)
        .bind(&pick.edge_explanation)
        .bind(&pick.summary)
        .bind(serde_json::to_string(&pick.confidence_factors)?)
        .bind(serde_json::to_string(&pick.risk_factors)?)
        .bind(pick.position_size.as_str())
        .bind(pick.created_at)
        .bind(pick.closed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_active(&self) -> Result<Vec<Pick>> {
        let rows = sqlx::query(
            r#"
            SELECT
                id, market_id, direction, conviction_score, entry_price,
                target_price, stop_loss, risk_reward, time_horizon, status,
                exit_price, edge_explanation, summary, confidence_factors,
                risk_factors, position_size, created_at, closed_at
            FROM picks
            WHERE status = 'active'
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_pick).collect())
    }

    async fn close(&self, id: Uuid, status: PickStatus, exit_price: Decimal) -> Result<()> {
        // The status guard keeps terminal transitions monotonic even if
        // two resolver runs race.
        sqlx::query(
            r#"
            UPDATE picks
            SET status = $2, exit_price = $3, closed_at = $4
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(exit_price)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
