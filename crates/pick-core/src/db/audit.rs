//! Append-only audit trail of pipeline runs.

use crate::store::AuditStore;
use crate::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// Repository for audit events.
pub struct AuditRepository {
    pool: PgPool,
}

impl AuditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for AuditRepository {
    async fn append(&self, event: &str, data: serde_json::Value, source: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (id, event, data, source, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event)
        .bind(serde_json::to_string(&data)?)
        .bind(source)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
