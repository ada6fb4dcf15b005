//! # Stats Repository
//!
//! Dashboard aggregates computed in SQL.

use sqlx::SqlitePool;

use crate::error::DbResult;
use stockroom_core::StoreStats;

/// Repository for store-wide statistics.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
}

impl StatsRepository {
    /// Creates a new StatsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatsRepository { pool }
    }

    /// Computes product counts, stock totals and earnings.
    pub async fn summary(&self) -> DbResult<StoreStats> {
        let (total_products, total_stock_units, total_stock_value_cents): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COALESCE(SUM(quantity), 0),
                    COALESCE(SUM(quantity * price_cents), 0)
                FROM products
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        let total_earnings_cents: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(total_cents), 0) FROM sales")
                .fetch_one(&self.pool)
                .await?;

        Ok(StoreStats {
            total_products,
            total_stock_units,
            total_stock_value_cents,
            total_earnings_cents,
        })
    }
}
