//! Database operations for the opportunity queue.

use crate::store::OpportunityStore;
use crate::types::{Opportunity, SignalType};
use crate::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Repository for detected opportunities.
pub struct OpportunityRepository {
    pool: PgPool,
}

impl OpportunityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_opportunity(r: &sqlx::postgres::PgRow) -> Opportunity {
        let signal_type = match r.get::<&str, _>("signal_type") {
            "momentum" => SignalType::Momentum,
            "whale_entry" => SignalType::WhaleEntry,
            "news" => SignalType::News,
            _ => SignalType::Mispricing,
        };
        let signal_data = r
            .get::<Option<String>, _>("signal_data")
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or(serde_json::Value::Object(Default::default()));

        Opportunity {
            id: r.get("id"),
            market_id: r.get("market_id"),
            signal_type,
            strength: r.get("strength"),
            signal_data,
            processed: r.get("processed"),
            detected_at: r.get("detected_at"),
        }
    }
}

#[async_trait]
impl OpportunityStore for OpportunityRepository {
    async fn insert(&self, opportunity: &Opportunity) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO opportunities (id, market_id, signal_type, strength, signal_data, processed, detected_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(opportunity.id)
        .bind(&opportunity.market_id)
        .bind(opportunity.signal_type.as_str())
        .bind(opportunity.strength)
        .bind(serde_json::to_string(&opportunity.signal_data)?)
        .bind(opportunity.processed)
        .bind(opportunity.detected_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_unprocessed(&self, limit: u32) -> Result<Vec<Opportunity>> {
        let rows = sqlx::query(
            r#"
            SELECT id, market_id, signal_type, strength, signal_data, processed, detected_at
            FROM opportunities
            WHERE processed = FALSE
            ORDER BY detected_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_opportunity).collect())
    }

    async fn mark_processed(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE opportunities SET processed = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
