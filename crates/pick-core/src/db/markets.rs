//! Read-only access to market snapshots maintained by the external scanner.

use crate::store::MarketStore;
use crate::types::Market;
use crate::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};

/// Repository for market snapshot reads.
pub struct MarketRepository {
    pool: PgPool,
}

impl MarketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MarketStore for MarketRepository {
    async fn get_by_id(&self, market_id: &str) -> Result<Option<Market>> {
        let row = sqlx::query(
            r#"
            SELECT id, question, category, yes_price, no_price, volume, liquidity, end_date
            FROM markets
            WHERE id = $1
            "#,
        )
        .bind(market_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Market {
            id: r.get("id"),
            question: r.get("question"),
            category: r.get("category"),
            yes_price: r.get("yes_price"),
            no_price: r.get("no_price"),
            volume: r.get("volume"),
            liquidity: r.get("liquidity"),
            end_date: r.get("end_date"),
        }))
    }
}
