//! Database access layer for PostgreSQL.

pub mod audit;
pub mod markets;
pub mod opportunities;
pub mod picks;
pub mod traders;

pub use audit::AuditRepository;
pub use markets::MarketRepository;
pub use opportunities::OpportunityRepository;
pub use picks::PickRepository;
pub use traders::TraderRepository;

use crate::config::DatabaseConfig;
use crate::Result;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::path::Path;

/// Create a PostgreSQL connection pool.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    Ok(pool)
}

/// Run database migrations from the migrations directory.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    let migrator = sqlx::migrate::Migrator::new(Path::new("./migrations")).await?;
    migrator.run(pool).await?;
    Ok(())
}
